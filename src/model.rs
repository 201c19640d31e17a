use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Hours shown for a day whose plan entry carries no (or a zero) duration.
pub const DEFAULT_DAY_HOURS: f64 = 0.5;

/// A payload that arrived on the success branch but cannot be displayed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("No valid study plan data received")]
    EmptyPlan,

    #[error("Invalid study plan day format")]
    InvalidDay,

    #[error("No quiz questions received")]
    EmptyQuiz,

    #[error("Invalid quiz question format")]
    InvalidQuestion,

    #[error("Response is missing `{0}`")]
    Missing(&'static str),

    #[error("Unexpected `{field}` format: {message}")]
    Shape { field: &'static str, message: String },
}

impl PayloadError {
    fn shape(field: &'static str, err: serde_json::Error) -> Self {
        PayloadError::Shape {
            field,
            message: err.to_string(),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    field: &'static str,
    payload: Option<&Value>,
) -> Result<T, PayloadError> {
    let value = payload
        .filter(|v| !v.is_null())
        .ok_or(PayloadError::Missing(field))?;
    serde_json::from_value(value.clone()).map_err(|e| PayloadError::shape(field, e))
}

/// Body shared by every backend reply.
///
/// Only an explicit `"success": false` counts as a server-reported failure.
/// A missing flag, or any non-boolean value, takes the success branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub fn is_failure(&self) -> bool {
        matches!(self.success, Some(Value::Bool(false)))
    }

    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None => "Unknown error".to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Text of a string field; absent or null reads as empty.
    pub fn text(&self, name: &str) -> String {
        match self.field(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// A study source listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub label: String,
}

impl Material {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub duration_hours: Option<f64>,
}

impl Day {
    pub fn hours(&self) -> f64 {
        self.duration_hours
            .filter(|h| *h != 0.0 && h.is_finite())
            .unwrap_or(DEFAULT_DAY_HOURS)
    }
}

/// Day-by-day schedule for one material. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyPlan {
    days: Vec<Day>,
}

impl StudyPlan {
    pub fn from_payload(payload: Option<&Value>) -> Result<Self, PayloadError> {
        let days: Vec<Day> = match payload {
            Some(Value::Array(_)) => decode("study_plan", payload)?,
            _ => return Err(PayloadError::EmptyPlan),
        };
        Self::new(days)
    }

    pub fn new(days: Vec<Day>) -> Result<Self, PayloadError> {
        if days.is_empty() {
            return Err(PayloadError::EmptyPlan);
        }
        if days.iter().any(|d| d.date.is_empty() || d.content.is_empty()) {
            return Err(PayloadError::InvalidDay);
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn start_date(&self) -> &str {
        &self.days[0].date
    }

    pub fn end_date(&self) -> &str {
        &self.days[self.days.len() - 1].date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    /// Letter shown in front of the option at `index` (A, B, C, ...).
    pub fn letter(index: usize) -> char {
        u32::try_from(index)
            .ok()
            .and_then(|i| char::from_u32(u32::from(b'A') + i))
            .unwrap_or('?')
    }

    /// Position of the option named by `correct_answer`, if any.
    pub fn correct_index(&self) -> Option<usize> {
        let wanted = self.correct_answer.trim();
        (0..self.options.len()).find(|&i| Self::letter(i).to_string() == wanted)
    }
}

pub fn questions_from_payload(payload: Option<&Value>) -> Result<Vec<Question>, PayloadError> {
    let questions: Vec<Question> = decode("quiz", payload)?;
    if questions.is_empty() {
        return Err(PayloadError::EmptyQuiz);
    }
    if questions
        .iter()
        .any(|q| q.question.trim().is_empty() || q.options.is_empty())
    {
        return Err(PayloadError::InvalidQuestion);
    }
    Ok(questions)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    #[serde(default)]
    pub channel: String,
    pub url: String,
}

pub fn videos_from_payload(payload: Option<&Value>) -> Result<Vec<Video>, PayloadError> {
    decode("videos", payload)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub progress: f64,
    pub on_track: bool,
    pub days_remaining: i64,
    pub estimated_completion: String,
    pub suggestions: Vec<String>,
}

impl Feedback {
    pub fn from_payload(payload: Option<&Value>) -> Result<Self, PayloadError> {
        decode("feedback", payload)
    }

    /// Width of the progress fill, in percent.
    pub fn fill_percent(&self) -> f64 {
        if self.progress.is_finite() {
            self.progress.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Formats a number the way the page shows it: `2.0` as `2`, `0.5` as `0.5`.
pub fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
