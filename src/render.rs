//! HTML fragments for each dashboard container.
//!
//! Every function here is pure: same state in, same markup out. Payload-level
//! entry points (`*_payload`) never fail; a malformed payload becomes an
//! inline warning panel.

use maud::{html, Markup};
use serde_json::Value;

use crate::model::{
    display_number, questions_from_payload, videos_from_payload, Feedback, PayloadError,
    Question, StudyPlan, Video,
};
use crate::page::MaterialItem;
use crate::quiz::{Mark, QuizBoard};

pub const PLAN_LOAD_ERROR: &str = "Error Loading Study Plan";
pub const PLAN_LOAD_HINT: &str = "Please try again or upload a different file.";
pub const PLAN_DISPLAY_ERROR: &str = "Study Plan Display Error";
pub const QUIZ_DISPLAY_ERROR: &str = "Quiz Display Error";
pub const VIDEOS_DISPLAY_ERROR: &str = "Video List Display Error";
pub const FEEDBACK_DISPLAY_ERROR: &str = "Feedback Display Error";
pub const DISPLAY_HINT: &str = "The content may be in an unexpected format.";

pub const NO_VIDEOS: &str = "No videos found for this topic.";
pub const ON_TRACK: &str = "You are on track!";
pub const CATCH_UP: &str = "You need to catch up!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request itself failed
    Error,
    /// The reply arrived but could not be displayed
    Warning,
}

impl Severity {
    pub fn color(self) -> &'static str {
        match self {
            Severity::Error => "red",
            Severity::Warning => "yellow",
        }
    }
}

pub fn notice(severity: Severity, title: &str, message: &str, hint: &str) -> Markup {
    let color = severity.color();
    html! {
        div class={ "bg-" (color) "-50 border border-" (color) "-200 p-4 rounded-md" } {
            h3 class={ "font-medium text-" (color) "-800" } { (title) }
            p class={ "text-" (color) "-600" } { (message) }
            p class="text-sm mt-2" { (hint) }
        }
    }
}

/// Renders `view` on success, a warning panel titled `title` otherwise.
pub fn guarded<T, F>(result: &Result<T, PayloadError>, title: &str, view: F) -> Markup
where
    F: Fn(&T) -> Markup,
{
    match result {
        Ok(value) => view(value),
        Err(err) => notice(Severity::Warning, title, &err.to_string(), DISPLAY_HINT),
    }
}

pub fn plan_load_error(message: &str) -> Markup {
    notice(Severity::Error, PLAN_LOAD_ERROR, message, PLAN_LOAD_HINT)
}

pub fn materials(items: &[MaterialItem]) -> Markup {
    html! {
        ul class="space-y-2" {
            @for item in items {
                li class=(if item.active { "material-item active" } else { "material-item" })
                    data-id=(item.material.id) {
                    (item.material.label)
                }
            }
        }
    }
}

pub fn study_plan(plan: &StudyPlan) -> Markup {
    html! {
        div class="mb-4" {
            h3 class="font-semibold text-lg mb-2" { "Your Personalized Study Plan" }
            div class="bg-blue-50 p-4 rounded-md mb-4" {
                p class="text-blue-800" { strong { "Start Date:" } " " (plan.start_date()) }
                p class="text-blue-800" { strong { "End Date:" } " " (plan.end_date()) }
            }
        }
        div class="space-y-4" {
            @for (index, day) in plan.days().iter().enumerate() {
                div class="study-day border border-gray-200 rounded-md p-4" {
                    div class="flex justify-between items-center mb-2" {
                        h4 class="font-medium" { "Day " (index + 1) ": " (day.date) }
                        span class="bg-blue-100 text-blue-800 text-xs font-medium px-2.5 py-0.5 rounded" {
                            (display_number(day.hours())) " hrs"
                        }
                    }
                    p class="text-gray-700" { (day.content) }
                }
            }
        }
    }
}

pub fn study_plan_payload(payload: Option<&Value>) -> Markup {
    guarded(&StudyPlan::from_payload(payload), PLAN_DISPLAY_ERROR, study_plan)
}

pub fn answer(text: &str) -> Markup {
    html! {
        p id="answerText" class="text-gray-700 whitespace-pre-line" { (text) }
    }
}

fn option_class(mark: Option<Mark>) -> &'static str {
    match mark {
        Some(Mark::Correct) => "quiz-option correct",
        Some(Mark::Incorrect) => "quiz-option incorrect",
        None => "quiz-option",
    }
}

pub fn quiz(board: &QuizBoard) -> Markup {
    html! {
        h3 class="font-semibold mb-4" { "Generated Quiz" }
        @for (q_index, card) in board.cards().iter().enumerate() {
            div class="quiz-question" data-question=(q_index) {
                p class="font-medium mb-2" { (q_index + 1) ". " (card.question().question) }
                div class="space-y-2" {
                    @for (o_index, option) in card.question().options.iter().enumerate() {
                        @let letter = Question::letter(o_index).to_string();
                        div class=(option_class(card.mark(o_index)))
                            data-question=(q_index)
                            data-option=(letter)
                            aria-disabled=[card.is_locked().then_some("true")]
                            style=[card.is_locked().then_some("pointer-events: none")] {
                            (letter) ") " (option)
                        }
                    }
                }
                div class=(if card.is_answered() {
                    "correct-answer mt-2 text-sm text-green-600"
                } else {
                    "correct-answer mt-2 text-sm text-green-600 hidden"
                }) {
                    "Correct answer: " (card.question().correct_answer)
                }
            }
        }
    }
}

pub fn quiz_payload(payload: Option<&Value>) -> Markup {
    let board = questions_from_payload(payload).map(QuizBoard::new);
    guarded(&board, QUIZ_DISPLAY_ERROR, quiz)
}

/// Only http(s) links are clickable.
fn safe_href(raw: &str) -> &str {
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => raw,
        _ => "#",
    }
}

pub fn videos(videos: &[Video]) -> Markup {
    html! {
        h3 class="font-semibold mb-4" { "Recommended Videos" }
        @if videos.is_empty() {
            p class="text-gray-500" { (NO_VIDEOS) }
        } @else {
            div class="space-y-4" {
                @for video in videos {
                    div class="video-item border border-gray-200 rounded-md p-3" {
                        h4 class="font-medium" { (video.title) }
                        p class="text-sm text-gray-600 mb-2" { (video.channel) }
                        a href=(safe_href(&video.url)) target="_blank" rel="noopener noreferrer"
                            class="text-blue-600 hover:underline text-sm" { "Watch Video" }
                    }
                }
            }
        }
    }
}

pub fn videos_payload(payload: Option<&Value>) -> Markup {
    guarded(&videos_from_payload(payload), VIDEOS_DISPLAY_ERROR, |v: &Vec<Video>| videos(v))
}

pub fn feedback(feedback: &Feedback) -> Markup {
    let tone = if feedback.on_track { "green" } else { "yellow" };
    html! {
        h3 class="font-semibold mb-4" { "Your Progress Feedback" }
        div class="space-y-4" {
            div {
                div class="flex justify-between mb-1" {
                    span class="font-medium" { "Progress" }
                    span class="font-medium" { (display_number(feedback.progress)) "%" }
                }
                div class="progress-bar" {
                    div class="progress-fill" style={ "width: " (display_number(feedback.fill_percent())) "%" } {}
                }
            }
            div class={ "bg-" (tone) "-50 p-4 rounded-md" } {
                p class={ "font-medium text-" (tone) "-800" } {
                    (if feedback.on_track { ON_TRACK } else { CATCH_UP })
                }
                p class="text-sm mt-1" {
                    (feedback.days_remaining) " days remaining until " (feedback.estimated_completion)
                }
            }
            div {
                h4 class="font-medium mb-2" { "Suggestions:" }
                ul class="list-disc pl-5 space-y-1" {
                    @for suggestion in &feedback.suggestions {
                        li { (suggestion) }
                    }
                }
            }
        }
    }
}

pub fn feedback_payload(payload: Option<&Value>) -> Markup {
    guarded(&Feedback::from_payload(payload), FEEDBACK_DISPLAY_ERROR, feedback)
}
