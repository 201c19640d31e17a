//! Study Planner CLI - drive the dashboard actions against a planner backend
//!
//! Usage:
//!   study-planner <COMMAND> [ARGS] [OPTIONS]
//!
//! Example:
//!   study-planner plan 5f0c...e1
//!   study-planner quiz 5f0c...e1 --difficulty hard --answers B,A,-,D
//!   study-planner upload --url https://example.org/notes --start 2024-03-01 --end 2024-03-20

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use study_planner_client::config::DEFAULT_CONFIG_FILE;
use study_planner_client::forms::FileUpload;
use study_planner_client::model::Material;
use study_planner_client::{Controller, HttpTransport, Outcome, Page, PlannerConfig};

fn print_usage() {
    eprintln!(
        r#"
Study Planner CLI - talk to the study planner backend from the terminal

USAGE:
    study-planner <COMMAND> [ARGS] [OPTIONS]

COMMANDS:
    plan <MATERIAL_ID>                     Load and render the study plan
    ask <MATERIAL_ID> <QUESTION>           Ask a question about a material
    quiz <MATERIAL_ID>                     Generate a quiz
        --difficulty <LEVEL>               easy | medium | hard (default: medium)
        --answers <A,B,-,...>              Click these options, one letter per question
    videos <TOPIC>                         Search videos for a topic
        --language <LANG>                  Video language (default: en)
    feedback <MATERIAL_ID>                 Progress feedback for a material
    upload                                 Upload a document or URL
        --file <PATH> | --url <URL>
        --start <YYYY-MM-DD> --end <YYYY-MM-DD>
        --hours <N>                        Daily study hours (default: 2)

OPTIONS:
    -c, --config <PATH>     Config file (default: planner.toml)
    -u, --base-url <URL>    Backend URL (overrides config and PLANNER_BASE_URL)
    -o, --out <PATH>        Write the rendered fragment to a file
    -h, --help              Print this help message

ENVIRONMENT:
    PLANNER_BASE_URL        Backend URL
    PLANNER_SESSION_COOKIE  Cookie header of a logged-in session
    RUST_LOG                Log filter (e.g. study_planner_client=debug)
"#
    );
}

#[derive(Debug, PartialEq)]
enum Command {
    Plan {
        material: String,
    },
    Ask {
        material: String,
        question: String,
    },
    Quiz {
        material: String,
        difficulty: String,
        answers: Vec<Option<usize>>,
    },
    Videos {
        topic: String,
        language: String,
    },
    Feedback {
        material: String,
    },
    Upload {
        file: Option<PathBuf>,
        url: Option<String>,
        start: String,
        end: String,
        hours: String,
    },
}

#[derive(Debug, PartialEq)]
struct CliArgs {
    command: Command,
    config: PathBuf,
    base_url: Option<String>,
    out: Option<PathBuf>,
}

/// `B,A,-,D` -> option indices per question; `-` leaves a question unanswered.
fn parse_answers(raw: &str) -> Result<Vec<Option<usize>>> {
    raw.split(',')
        .map(str::trim)
        .map(|letter| match letter {
            "" | "-" => Ok(None),
            _ => {
                let mut chars = letter.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => {
                        Ok(Some((c.to_ascii_uppercase() as u8 - b'A') as usize))
                    }
                    _ => Err(anyhow!("Invalid answer letter `{}`", letter)),
                }
            }
        })
        .collect()
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut positional = Vec::new();
    let mut config = PathBuf::from(DEFAULT_CONFIG_FILE);
    let mut base_url = None;
    let mut out = None;
    let mut difficulty = "medium".to_string();
    let mut answers = Vec::new();
    let mut language = "en".to_string();
    let mut file = None;
    let mut url = None;
    let mut start = None;
    let mut end = None;
    let mut hours = "2".to_string();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| anyhow!("Missing value for {}", flag))
        };
        match flag {
            "--config" | "-c" => config = PathBuf::from(value()?),
            "--base-url" | "-u" => base_url = Some(value()?),
            "--out" | "-o" => out = Some(PathBuf::from(value()?)),
            "--difficulty" => difficulty = value()?,
            "--answers" => answers = parse_answers(&value()?)?,
            "--language" => language = value()?,
            "--file" => file = Some(PathBuf::from(value()?)),
            "--url" => url = Some(value()?),
            "--start" => start = Some(value()?),
            "--end" => end = Some(value()?),
            "--hours" => hours = value()?,
            other if other.starts_with('-') && other.len() > 1 => bail!("Unknown option {}", other),
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    let name = positional.next().ok_or_else(|| anyhow!("Missing command"))?;
    let mut arg = |what: &str| {
        positional
            .next()
            .ok_or_else(|| anyhow!("`{}` needs <{}>", name, what))
    };

    let command = match name.as_str() {
        "plan" => Command::Plan { material: arg("MATERIAL_ID")? },
        "ask" => Command::Ask {
            material: arg("MATERIAL_ID")?,
            question: arg("QUESTION")?,
        },
        "quiz" => Command::Quiz {
            material: arg("MATERIAL_ID")?,
            difficulty,
            answers,
        },
        "videos" => Command::Videos {
            topic: arg("TOPIC")?,
            language,
        },
        "feedback" => Command::Feedback { material: arg("MATERIAL_ID")? },
        "upload" => Command::Upload {
            file,
            url,
            start: start.ok_or_else(|| anyhow!("`upload` needs --start"))?,
            end: end.ok_or_else(|| anyhow!("`upload` needs --end"))?,
            hours,
        },
        other => bail!("Unknown command `{}`", other),
    };

    Ok(CliArgs {
        command,
        config,
        base_url,
        out,
    })
}

fn material_id(command: &Command) -> Option<&str> {
    match command {
        Command::Plan { material }
        | Command::Ask { material, .. }
        | Command::Quiz { material, .. }
        | Command::Feedback { material } => Some(material),
        Command::Videos { .. } | Command::Upload { .. } => None,
    }
}

/// The container a command writes into.
fn fragment_of(command: &Command) -> fn(&Page) -> String {
    match command {
        Command::Plan { .. } => Page::study_plan_html,
        Command::Ask { .. } => Page::answer_html,
        Command::Quiz { .. } => Page::quiz_html,
        Command::Videos { .. } => Page::videos_html,
        Command::Feedback { .. } => Page::feedback_html,
        Command::Upload { .. } => Page::materials_html,
    }
}

async fn run(args: CliArgs) -> Result<Option<String>> {
    let mut config = PlannerConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    log::info!("Using planner backend at {}", config.base_url);

    let transport = HttpTransport::new(&config)?;
    let materials = material_id(&args.command)
        .map(|id| vec![Material::new(id, id)])
        .unwrap_or_default();
    let ctl = Controller::new(transport, Page::new(materials));
    let fragment = fragment_of(&args.command);

    if let Some(id) = material_id(&args.command) {
        eprintln!("📚 Selecting material {}...", id);
        ctl.select_material(id).await?;
    }

    let outcome = match args.command {
        Command::Plan { .. } => Outcome::Rendered,
        Command::Ask { question, .. } => {
            ctl.edit(|p| p.ask.question = question).await;
            ctl.submit_ask().await
        }
        Command::Quiz {
            difficulty,
            answers,
            ..
        } => {
            ctl.edit(|p| p.quiz_form.difficulty = difficulty).await;
            let outcome = ctl.submit_quiz().await;
            if outcome == Outcome::Rendered {
                for (question, option) in answers.into_iter().enumerate() {
                    if let Some(option) = option {
                        ctl.answer_quiz(question, option)
                            .await
                            .with_context(|| format!("Cannot answer question {}", question + 1))?;
                    }
                }
            }
            outcome
        }
        Command::Videos { topic, language } => {
            ctl.edit(|p| {
                p.video_form.topic = topic;
                p.video_form.language = language;
            })
            .await;
            ctl.submit_videos().await
        }
        Command::Feedback { .. } => ctl.submit_feedback().await,
        Command::Upload {
            file,
            url,
            start,
            end,
            hours,
        } => {
            if let Some(path) = file {
                let upload = FileUpload::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                ctl.choose_file(Some(upload)).await;
            }
            if let Some(url) = url {
                ctl.focus_url().await;
                ctl.edit(|p| p.upload.set_url(url)).await;
            }
            ctl.edit(|p| {
                p.upload.start_date = start;
                p.upload.end_date = end;
                p.upload.daily_hours = hours;
            })
            .await;
            ctl.submit_upload().await
        }
    };

    match outcome {
        Outcome::Alert(message) => bail!(message),
        Outcome::Reload => {
            eprintln!("✅ Upload accepted - reload the dashboard to see the new material");
            Ok(None)
        }
        Outcome::Rendered => Ok(Some(ctl.view(fragment).await)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("❌ {}", err);
            print_usage();
            std::process::exit(2);
        }
    };
    let out = cli.out.clone();

    match run(cli).await {
        Ok(Some(html)) => match out {
            Some(path) => {
                std::fs::write(&path, html)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("📝 Fragment written to {}", path.display());
            }
            None => println!("{}", html),
        },
        Ok(None) => {}
        Err(err) => {
            eprintln!("❌ {:#}", err);
            std::process::exit(1);
        }
    }

    Ok(())
}
