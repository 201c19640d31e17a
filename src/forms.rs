use std::path::Path;
use thiserror::Error;

/// Multipart field carrying the uploaded document. A URL source is sent
/// under the same name; the backend tells them apart by content.
pub const SOURCE_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please select a file or enter a URL")]
    MissingSource,

    #[error("Please select a material first")]
    NoMaterial,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, bytes })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File(FileUpload),
}

/// Ordered multipart payload. Repeated names are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.append_text(name, value);
        self
    }

    pub fn append_text(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .push((name.to_string(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, name: &str, file: FileUpload) {
        self.fields.push((name.to_string(), FormValue::File(file)));
    }

    /// First text value stored under `name`.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(n, v)| match v {
            FormValue::Text(t) if n == name => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn get_all(&self, name: &str) -> Vec<&FormValue> {
        self.fields
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for FormData {
    type Item = (String, FormValue);
    type IntoIter = std::vec::IntoIter<(String, FormValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Upload form. Choosing a file hides the URL input; focusing the URL input
/// clears and hides the file input.
#[derive(Debug, Clone)]
pub struct UploadForm {
    file: Option<FileUpload>,
    url: String,
    pub start_date: String,
    pub end_date: String,
    pub daily_hours: String,
    file_hidden: bool,
    url_hidden: bool,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            file: None,
            url: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            daily_hours: "2".to_string(),
            file_hidden: false,
            url_hidden: false,
        }
    }
}

impl UploadForm {
    pub fn choose_file(&mut self, file: Option<FileUpload>) {
        if file.is_some() {
            self.url_hidden = true;
        }
        self.file = file;
    }

    pub fn focus_url(&mut self) {
        self.file = None;
        self.file_hidden = true;
        self.url_hidden = false;
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn file(&self) -> Option<&FileUpload> {
        self.file.as_ref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_file_hidden(&self) -> bool {
        self.file_hidden
    }

    pub fn is_url_hidden(&self) -> bool {
        self.url_hidden
    }

    fn trimmed_url(&self) -> Option<&str> {
        Some(self.url.trim()).filter(|u| !u.is_empty())
    }

    pub fn to_form_data(&self) -> Result<FormData, FormError> {
        if self.file.is_none() && self.trimmed_url().is_none() {
            return Err(FormError::MissingSource);
        }

        let mut form = FormData::new()
            .text("start_date", self.start_date.as_str())
            .text("end_date", self.end_date.as_str())
            .text("daily_hours", self.daily_hours.as_str())
            .text("url", self.url.as_str());
        if let Some(file) = &self.file {
            form.append_file(SOURCE_FIELD, file.clone());
        }
        if let Some(url) = self.trimmed_url() {
            form.append_text(SOURCE_FIELD, url);
        }
        Ok(form)
    }
}

fn require_material(material_id: &str) -> Result<&str, FormError> {
    if material_id.is_empty() {
        Err(FormError::NoMaterial)
    } else {
        Ok(material_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AskForm {
    pub material_id: String,
    pub question: String,
}

impl AskForm {
    pub fn to_form_data(&self) -> Result<FormData, FormError> {
        let material_id = require_material(&self.material_id)?;
        Ok(FormData::new()
            .text("material_id", material_id)
            .text("question", self.question.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct QuizForm {
    pub material_id: String,
    pub difficulty: String,
}

impl Default for QuizForm {
    fn default() -> Self {
        Self {
            material_id: String::new(),
            difficulty: "medium".to_string(),
        }
    }
}

impl QuizForm {
    pub fn to_form_data(&self) -> Result<FormData, FormError> {
        let material_id = require_material(&self.material_id)?;
        Ok(FormData::new()
            .text("material_id", material_id)
            .text("difficulty", self.difficulty.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct VideoForm {
    pub topic: String,
    pub language: String,
}

impl Default for VideoForm {
    fn default() -> Self {
        Self {
            topic: String::new(),
            language: "en".to_string(),
        }
    }
}

impl VideoForm {
    pub fn to_form_data(&self) -> FormData {
        FormData::new()
            .text("topic", self.topic.as_str())
            .text("language", self.language.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackForm {
    pub material_id: String,
}

impl FeedbackForm {
    pub fn to_form_data(&self) -> Result<FormData, FormError> {
        let material_id = require_material(&self.material_id)?;
        Ok(FormData::new().text("material_id", material_id))
    }
}
