//! The dashboard as plain data: material list, forms and result containers.

use thiserror::Error;

use crate::forms::{AskForm, FeedbackForm, QuizForm, UploadForm, VideoForm};
use crate::model::{Feedback, Material, PayloadError, StudyPlan, Video};
use crate::quiz::QuizBoard;
use crate::render;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("No material with id `{0}` is listed")]
    UnknownMaterial(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialItem {
    pub material: Material,
    pub active: bool,
}

/// A result container that starts hidden and is revealed by its first result.
#[derive(Debug, Clone)]
pub struct Section<T> {
    content: Option<T>,
    hidden: bool,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            content: None,
            hidden: true,
        }
    }
}

impl<T> Section<T> {
    pub fn reveal(&mut self, content: T) {
        self.content = Some(content);
        self.hidden = false;
    }

    /// Replaces the content without touching visibility.
    pub fn replace(&mut self, content: T) {
        self.content = Some(content);
    }

    pub fn content(&self) -> Option<&T> {
        self.content.as_ref()
    }

    pub fn content_mut(&mut self) -> Option<&mut T> {
        self.content.as_mut()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlanView {
    #[default]
    Placeholder,
    Loaded(Result<StudyPlan, PayloadError>),
    LoadFailed(String),
}

#[derive(Debug, Default)]
pub struct Page {
    materials: Vec<MaterialItem>,
    pub upload: UploadForm,
    pub ask: AskForm,
    pub quiz_form: QuizForm,
    pub video_form: VideoForm,
    pub feedback_form: FeedbackForm,
    pub study_plan: PlanView,
    pub answer: Section<String>,
    pub quiz: Section<Result<QuizBoard, PayloadError>>,
    pub videos: Section<Result<Vec<Video>, PayloadError>>,
    pub feedback: Section<Result<Feedback, PayloadError>>,
}

impl Page {
    pub fn new(materials: Vec<Material>) -> Self {
        Self {
            materials: materials
                .into_iter()
                .map(|material| MaterialItem {
                    material,
                    active: false,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn materials(&self) -> &[MaterialItem] {
        &self.materials
    }

    pub fn active_material(&self) -> Option<&Material> {
        self.materials
            .iter()
            .find(|item| item.active)
            .map(|item| &item.material)
    }

    /// Marks `id` as the only active material and copies it into the hidden
    /// material fields of the ask, quiz and feedback forms.
    pub fn select_material(&mut self, id: &str) -> Result<(), PageError> {
        if !self.materials.iter().any(|item| item.material.id == id) {
            return Err(PageError::UnknownMaterial(id.to_string()));
        }
        for item in &mut self.materials {
            item.active = item.material.id == id;
        }
        self.ask.material_id = id.to_string();
        self.quiz_form.material_id = id.to_string();
        self.feedback_form.material_id = id.to_string();
        Ok(())
    }

    pub fn materials_html(&self) -> String {
        render::materials(&self.materials).into_string()
    }

    pub fn study_plan_html(&self) -> String {
        match &self.study_plan {
            PlanView::Placeholder => String::new(),
            PlanView::Loaded(plan) => {
                render::guarded(plan, render::PLAN_DISPLAY_ERROR, render::study_plan).into_string()
            }
            PlanView::LoadFailed(message) => render::plan_load_error(message).into_string(),
        }
    }

    pub fn answer_html(&self) -> String {
        self.answer
            .content()
            .map(|text| render::answer(text).into_string())
            .unwrap_or_default()
    }

    pub fn quiz_html(&self) -> String {
        self.quiz
            .content()
            .map(|board| render::guarded(board, render::QUIZ_DISPLAY_ERROR, render::quiz).into_string())
            .unwrap_or_default()
    }

    pub fn videos_html(&self) -> String {
        self.videos
            .content()
            .map(|list| {
                render::guarded(list, render::VIDEOS_DISPLAY_ERROR, |v: &Vec<Video>| render::videos(v))
                    .into_string()
            })
            .unwrap_or_default()
    }

    pub fn feedback_html(&self) -> String {
        self.feedback
            .content()
            .map(|fb| render::guarded(fb, render::FEEDBACK_DISPLAY_ERROR, render::feedback).into_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(vec![
            Material::new("m-1", "biology.pdf"),
            Material::new("m-2", "https://example.org/history"),
        ])
    }

    #[test]
    fn test_selection_fills_all_hidden_fields() {
        let mut page = page();
        page.select_material("m-2").unwrap();

        assert_eq!(page.ask.material_id, "m-2");
        assert_eq!(page.quiz_form.material_id, "m-2");
        assert_eq!(page.feedback_form.material_id, "m-2");
        assert_eq!(page.active_material().map(|m| m.id.as_str()), Some("m-2"));
    }

    #[test]
    fn test_only_one_material_is_active() {
        let mut page = page();
        page.select_material("m-1").unwrap();
        page.select_material("m-2").unwrap();

        let active: Vec<_> = page.materials().iter().filter(|i| i.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].material.id, "m-2");

        let html = page.materials_html();
        assert_eq!(html.matches("material-item active").count(), 1);
    }

    #[test]
    fn test_unknown_material_changes_nothing() {
        let mut page = page();
        page.select_material("m-1").unwrap();
        assert_eq!(
            page.select_material("m-9"),
            Err(PageError::UnknownMaterial("m-9".to_string()))
        );
        assert_eq!(page.ask.material_id, "m-1");
    }

    #[test]
    fn test_sections_start_hidden_and_empty() {
        let page = page();
        assert!(page.answer.is_hidden());
        assert!(page.quiz.is_hidden());
        assert!(page.videos.is_hidden());
        assert!(page.feedback.is_hidden());
        assert_eq!(page.quiz_html(), "");
        assert_eq!(page.study_plan_html(), "");
    }

    #[test]
    fn test_reveal_unhides() {
        let mut section: Section<String> = Section::default();
        section.replace("draft".to_string());
        assert!(section.is_hidden());
        section.reveal("answer".to_string());
        assert!(!section.is_hidden());
        assert_eq!(section.content().map(String::as_str), Some("answer"));
    }
}
