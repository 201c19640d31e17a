//! Event handlers for the dashboard.
//!
//! The page lock is never held across a network await, so overlapping
//! submissions are allowed and the last reply to resolve wins the write.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::api::{ApiError, Endpoint, Transport};
use crate::forms::{FileUpload, FormData, FormError};
use crate::model::{questions_from_payload, videos_from_payload, Envelope, Feedback, StudyPlan};
use crate::page::{Page, PageError, PlanView};
use crate::quiz::{QuizBoard, QuizError, Transition};

/// What the host should do once a handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The page model was updated (or nothing needed to change).
    Rendered,
    /// Show a blocking alert with this text.
    Alert(String),
    /// Reload the whole page.
    Reload,
}

impl From<FormError> for Outcome {
    fn from(err: FormError) -> Self {
        Outcome::Alert(err.to_string())
    }
}

pub struct Controller<T> {
    transport: Arc<T>,
    page: Arc<Mutex<Page>>,
}

impl<T> Clone for Controller<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            page: Arc::clone(&self.page),
        }
    }
}

impl<T: Transport> Controller<T> {
    pub fn new(transport: T, page: Page) -> Self {
        Self {
            transport: Arc::new(transport),
            page: Arc::new(Mutex::new(page)),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs `f` against the current page state.
    pub async fn view<R>(&self, f: impl FnOnce(&Page) -> R) -> R {
        let page = self.page.lock().await;
        f(&page)
    }

    /// Applies user edits (typing into inputs) to the page.
    pub async fn edit<R>(&self, f: impl FnOnce(&mut Page) -> R) -> R {
        let mut page = self.page.lock().await;
        f(&mut page)
    }

    pub async fn choose_file(&self, file: Option<FileUpload>) {
        self.page.lock().await.upload.choose_file(file);
    }

    pub async fn focus_url(&self) {
        self.page.lock().await.upload.focus_url();
    }

    pub async fn select_material(&self, id: &str) -> Result<Outcome, PageError> {
        self.page.lock().await.select_material(id)?;
        debug!("Material {} selected", id);
        self.load_study_plan(id).await;
        Ok(Outcome::Rendered)
    }

    async fn load_study_plan(&self, material_id: &str) {
        let view = match self.fetch_study_plan(material_id).await {
            Ok(envelope) => {
                PlanView::Loaded(StudyPlan::from_payload(envelope.field("study_plan")))
            }
            Err(err) => {
                error!("Error loading study plan for {}: {}", material_id, err);
                PlanView::LoadFailed(err.to_string())
            }
        };
        self.page.lock().await.study_plan = view;
    }

    async fn fetch_study_plan(&self, material_id: &str) -> Result<Envelope, ApiError> {
        let response = self
            .transport
            .get(Endpoint::StudyPlan, &[("material_id", material_id)])
            .await?;
        if !response.is_ok() {
            return Err(ApiError::Status(response.status));
        }
        let envelope = response.envelope()?;
        if envelope.is_failure() {
            let message = match &envelope.error {
                Some(_) => envelope.error_message(),
                None => Endpoint::StudyPlan.failure_notice().to_string(),
            };
            return Err(ApiError::Server(message));
        }
        Ok(envelope)
    }

    async fn post(&self, endpoint: Endpoint, form: FormData) -> Result<Envelope, ApiError> {
        debug!("Submitting {} ({} fields)", endpoint, form.len());
        self.transport.post_form(endpoint, form).await?.envelope()
    }

    /// Shared tail of every form submission: server failures and transport
    /// failures become alerts, anything else is handed to `apply`.
    async fn settle<F>(&self, endpoint: Endpoint, result: Result<Envelope, ApiError>, apply: F) -> Outcome
    where
        F: FnOnce(&mut Page, Envelope),
    {
        match result {
            Ok(envelope) if envelope.is_failure() => {
                let message = envelope.error_message();
                warn!("{} reported failure: {}", endpoint, message);
                Outcome::Alert(format!("Error: {}", message))
            }
            Ok(envelope) => {
                let mut page = self.page.lock().await;
                apply(&mut page, envelope);
                Outcome::Rendered
            }
            Err(err) => {
                error!("{} failed: {}", endpoint, err);
                Outcome::Alert(endpoint.failure_notice().to_string())
            }
        }
    }

    pub async fn submit_upload(&self) -> Outcome {
        let form = match self.page.lock().await.upload.to_form_data() {
            Ok(form) => form,
            Err(err) => return err.into(),
        };
        let result = self.post(Endpoint::Upload, form).await;
        match self.settle(Endpoint::Upload, result, log_upload).await {
            Outcome::Rendered => Outcome::Reload,
            other => other,
        }
    }

    pub async fn submit_ask(&self) -> Outcome {
        let form = match self.page.lock().await.ask.to_form_data() {
            Ok(form) => form,
            Err(err) => return err.into(),
        };
        let result = self.post(Endpoint::Ask, form).await;
        self.settle(Endpoint::Ask, result, |page, envelope| {
            page.answer.reveal(envelope.text("answer"));
        })
        .await
    }

    pub async fn submit_quiz(&self) -> Outcome {
        let form = match self.page.lock().await.quiz_form.to_form_data() {
            Ok(form) => form,
            Err(err) => return err.into(),
        };
        let result = self.post(Endpoint::GenerateQuiz, form).await;
        self.settle(Endpoint::GenerateQuiz, result, |page, envelope| {
            let board = questions_from_payload(envelope.field("quiz")).map(QuizBoard::new);
            page.quiz.reveal(board);
        })
        .await
    }

    pub async fn submit_videos(&self) -> Outcome {
        let form = self.page.lock().await.video_form.to_form_data();
        let result = self.post(Endpoint::GetVideos, form).await;
        self.settle(Endpoint::GetVideos, result, |page, envelope| {
            page.videos.reveal(videos_from_payload(envelope.field("videos")));
        })
        .await
    }

    pub async fn submit_feedback(&self) -> Outcome {
        let form = match self.page.lock().await.feedback_form.to_form_data() {
            Ok(form) => form,
            Err(err) => return err.into(),
        };
        let result = self.post(Endpoint::Feedback, form).await;
        self.settle(Endpoint::Feedback, result, |page, envelope| {
            page.feedback.reveal(Feedback::from_payload(envelope.field("feedback")));
        })
        .await
    }

    /// Option click inside the rendered quiz.
    pub async fn answer_quiz(&self, question: usize, option: usize) -> Result<Transition, QuizError> {
        let mut page = self.page.lock().await;
        match page.quiz.content_mut() {
            Some(Ok(board)) => board.answer(question, option),
            _ => Err(QuizError::NoQuiz),
        }
    }
}

fn log_upload(_page: &mut Page, envelope: Envelope) {
    let days = envelope
        .field("study_plan")
        .and_then(|plan| plan.as_array())
        .map_or(0, Vec::len);
    info!(
        "Upload accepted (material {}, {} plan days)",
        envelope.text("material_id"),
        days
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Response;
    use crate::forms::{FormValue, SOURCE_FIELD};
    use crate::model::Material;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Post(Endpoint, FormData),
        Get(Endpoint, Vec<(String, String)>),
    }

    /// Replies from a canned table and records every request.
    #[derive(Default)]
    struct FakeBackend {
        replies: StdMutex<HashMap<Endpoint, Result<Response, String>>>,
        sent: StdMutex<Vec<Sent>>,
    }

    impl FakeBackend {
        fn reply(self, endpoint: Endpoint, status: u16, body: serde_json::Value) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(endpoint, Ok(Response::new(status, body.to_string())));
            self
        }

        fn raw(self, endpoint: Endpoint, status: u16, body: &str) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(endpoint, Ok(Response::new(status, body)));
            self
        }

        fn unreachable(self, endpoint: Endpoint) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(endpoint, Err("connection refused".to_string()));
            self
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn answer(&self, endpoint: Endpoint) -> Result<Response, ApiError> {
            match self.replies.lock().unwrap().get(&endpoint) {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(message)) => Err(ApiError::Unavailable(message.clone())),
                None => Ok(Response::new(404, "{}")),
            }
        }
    }

    #[async_trait]
    impl Transport for FakeBackend {
        async fn post_form(&self, endpoint: Endpoint, form: FormData) -> Result<Response, ApiError> {
            self.sent.lock().unwrap().push(Sent::Post(endpoint, form));
            self.answer(endpoint)
        }

        async fn get(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<Response, ApiError> {
            let query = query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.sent.lock().unwrap().push(Sent::Get(endpoint, query));
            self.answer(endpoint)
        }
    }

    fn controller(backend: FakeBackend) -> Controller<FakeBackend> {
        Controller::new(
            backend,
            Page::new(vec![
                Material::new("m-1", "biology.pdf"),
                Material::new("m-2", "chemistry.docx"),
            ]),
        )
    }

    fn plan_reply() -> serde_json::Value {
        json!({
            "success": true,
            "study_plan": [
                {"date": "2024-03-01", "content": "Cells", "duration_hours": 2},
                {"date": "2024-03-02", "content": "Tissues", "duration_hours": 2}
            ]
        })
    }

    #[tokio::test]
    async fn test_selection_loads_plan_for_that_material() {
        let ctl = controller(FakeBackend::default().reply(Endpoint::StudyPlan, 200, plan_reply()));
        assert_eq!(ctl.select_material("m-2").await, Ok(Outcome::Rendered));

        assert_eq!(
            ctl.transport().sent(),
            vec![Sent::Get(
                Endpoint::StudyPlan,
                vec![("material_id".to_string(), "m-2".to_string())]
            )]
        );
        let html = ctl.view(|p| p.study_plan_html()).await;
        assert_eq!(html.matches("study-day").count(), 2);
        assert!(html.contains("2024-03-02"));
    }

    #[tokio::test]
    async fn test_plan_http_error_renders_inline() {
        let ctl = controller(FakeBackend::default().reply(
            Endpoint::StudyPlan,
            404,
            json!({"error": "Material not found"}),
        ));
        assert_eq!(ctl.select_material("m-1").await, Ok(Outcome::Rendered));

        let view = ctl.view(|p| p.study_plan.clone()).await;
        assert_eq!(view, PlanView::LoadFailed("Network response was not ok".to_string()));
        let html = ctl.view(|p| p.study_plan_html()).await;
        assert!(html.contains("Error Loading Study Plan"));
        assert!(html.contains("bg-red-50"));
    }

    #[tokio::test]
    async fn test_plan_server_failure_renders_inline() {
        let ctl = controller(FakeBackend::default().reply(
            Endpoint::StudyPlan,
            200,
            json!({"success": false}),
        ));
        ctl.select_material("m-1").await.unwrap();
        let view = ctl.view(|p| p.study_plan.clone()).await;
        assert_eq!(view, PlanView::LoadFailed("Failed to load study plan".to_string()));
    }

    #[tokio::test]
    async fn test_plan_empty_renders_warning() {
        let ctl = controller(FakeBackend::default().reply(
            Endpoint::StudyPlan,
            200,
            json!({"success": true, "study_plan": []}),
        ));
        ctl.select_material("m-1").await.unwrap();
        let html = ctl.view(|p| p.study_plan_html()).await;
        assert!(html.contains("Study Plan Display Error"));
        assert!(html.contains("bg-yellow-50"));
    }

    #[tokio::test]
    async fn test_unknown_material_sends_nothing() {
        let ctl = controller(FakeBackend::default());
        assert!(ctl.select_material("nope").await.is_err());
        assert!(ctl.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_source_never_sends() {
        let ctl = controller(FakeBackend::default());
        ctl.edit(|p| p.upload.set_url("   ")).await;
        assert_eq!(
            ctl.submit_upload().await,
            Outcome::Alert("Please select a file or enter a URL".to_string())
        );
        assert!(ctl.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_url_upload_reloads_on_success() {
        let ctl = controller(FakeBackend::default().reply(
            Endpoint::Upload,
            200,
            json!({"success": true, "material_id": "m-3", "study_plan": []}),
        ));
        ctl.focus_url().await;
        ctl.edit(|p| {
            p.upload.set_url("https://example.org/notes");
            p.upload.start_date = "2024-03-01".to_string();
            p.upload.end_date = "2024-03-20".to_string();
        })
        .await;
        assert_eq!(ctl.submit_upload().await, Outcome::Reload);

        match &ctl.transport().sent()[0] {
            Sent::Post(Endpoint::Upload, form) => {
                assert_eq!(
                    form.get_all(SOURCE_FIELD),
                    vec![&FormValue::Text("https://example.org/notes".to_string())]
                );
                assert_eq!(form.get_text("start_date"), Some("2024-03-01"));
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_server_error_is_shown_verbatim() {
        let ctl = controller(FakeBackend::default().reply(
            Endpoint::Upload,
            500,
            json!({"success": false, "error": "Invalid file type"}),
        ));
        ctl.choose_file(Some(FileUpload::new("notes.exe", vec![0, 1]))).await;
        assert_eq!(
            ctl.submit_upload().await,
            Outcome::Alert("Error: Invalid file type".to_string())
        );
    }

    #[tokio::test]
    async fn test_upload_transport_failure_is_generic() {
        let ctl = controller(FakeBackend::default().unreachable(Endpoint::Upload));
        ctl.choose_file(Some(FileUpload::new("notes.pdf", vec![1]))).await;
        assert_eq!(
            ctl.submit_upload().await,
            Outcome::Alert("An error occurred during upload".to_string())
        );
    }

    #[tokio::test]
    async fn test_ask_requires_selection() {
        let ctl = controller(FakeBackend::default());
        assert_eq!(
            ctl.submit_ask().await,
            Outcome::Alert("Please select a material first".to_string())
        );
        assert_eq!(
            ctl.submit_quiz().await,
            Outcome::Alert("Please select a material first".to_string())
        );
        assert_eq!(
            ctl.submit_feedback().await,
            Outcome::Alert("Please select a material first".to_string())
        );
        assert!(ctl.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_ask_reveals_answer() {
        let ctl = controller(
            FakeBackend::default()
                .reply(Endpoint::StudyPlan, 200, plan_reply())
                .reply(Endpoint::Ask, 200, json!({"success": true, "answer": "Mitochondria"})),
        );
        ctl.select_material("m-1").await.unwrap();
        ctl.edit(|p| p.ask.question = "Powerhouse of the cell?".to_string()).await;
        assert_eq!(ctl.submit_ask().await, Outcome::Rendered);

        let (hidden, text) = ctl
            .view(|p| (p.answer.is_hidden(), p.answer.content().cloned()))
            .await;
        assert!(!hidden);
        assert_eq!(text.as_deref(), Some("Mitochondria"));

        match &ctl.transport().sent()[1] {
            Sent::Post(Endpoint::Ask, form) => {
                assert_eq!(form.get_text("material_id"), Some("m-1"));
                assert_eq!(form.get_text("question"), Some("Powerhouse of the cell?"));
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_success_flag_takes_success_branch() {
        let ctl = controller(
            FakeBackend::default()
                .reply(Endpoint::StudyPlan, 200, plan_reply())
                .reply(Endpoint::Ask, 401, json!({"error": "Unauthorized"})),
        );
        ctl.select_material("m-1").await.unwrap();
        assert_eq!(ctl.submit_ask().await, Outcome::Rendered);
        let text = ctl.view(|p| p.answer.content().cloned()).await;
        assert_eq!(text.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_generic_alert() {
        let ctl = controller(
            FakeBackend::default()
                .reply(Endpoint::StudyPlan, 200, plan_reply())
                .raw(Endpoint::Ask, 502, "<html>Bad Gateway</html>"),
        );
        ctl.select_material("m-1").await.unwrap();
        assert_eq!(
            ctl.submit_ask().await,
            Outcome::Alert("An error occurred while asking the question".to_string())
        );
        assert!(ctl.view(|p| p.answer.is_hidden()).await);
    }

    #[tokio::test]
    async fn test_quiz_flow() {
        let ctl = controller(
            FakeBackend::default()
                .reply(Endpoint::StudyPlan, 200, plan_reply())
                .reply(
                    Endpoint::GenerateQuiz,
                    200,
                    json!({
                        "success": true,
                        "difficulty": "hard",
                        "quiz": [
                            {"question": "Pick", "options": ["x", "y", "z"], "correct_answer": "B"},
                            {"question": "Again", "options": ["p", "q"], "correct_answer": "A"}
                        ]
                    }),
                ),
        );
        assert_eq!(ctl.answer_quiz(0, 0).await, Err(QuizError::NoQuiz));

        ctl.select_material("m-1").await.unwrap();
        ctl.edit(|p| p.quiz_form.difficulty = "hard".to_string()).await;
        assert_eq!(ctl.submit_quiz().await, Outcome::Rendered);
        assert!(!ctl.view(|p| p.quiz.is_hidden()).await);

        assert_eq!(
            ctl.answer_quiz(0, 0).await,
            Ok(Transition::Answered { correct: false })
        );
        assert_eq!(ctl.answer_quiz(0, 1).await, Ok(Transition::Ignored));

        let html = ctl.view(|p| p.quiz_html()).await;
        assert!(html.contains("quiz-option incorrect"));
        assert!(html.contains("quiz-option correct"));
        assert_eq!(html.matches("pointer-events: none").count(), 3);
    }

    #[tokio::test]
    async fn test_regenerating_quiz_discards_answers() {
        let quiz = json!({
            "success": true,
            "quiz": [{"question": "Pick", "options": ["x", "y"], "correct_answer": "A"}]
        });
        let ctl = controller(
            FakeBackend::default()
                .reply(Endpoint::StudyPlan, 200, plan_reply())
                .reply(Endpoint::GenerateQuiz, 200, quiz),
        );
        ctl.select_material("m-1").await.unwrap();
        ctl.submit_quiz().await;
        ctl.answer_quiz(0, 0).await.unwrap();
        ctl.submit_quiz().await;

        let answered = ctl
            .view(|p| match p.quiz.content() {
                Some(Ok(board)) => board.answered(),
                _ => usize::MAX,
            })
            .await;
        assert_eq!(answered, 0);
    }

    #[tokio::test]
    async fn test_videos_need_no_selection() {
        let ctl = controller(FakeBackend::default().reply(
            Endpoint::GetVideos,
            200,
            json!({"success": true, "videos": []}),
        ));
        ctl.edit(|p| p.video_form.topic = "math".to_string()).await;
        assert_eq!(ctl.submit_videos().await, Outcome::Rendered);
        let html = ctl.view(|p| p.videos_html()).await;
        assert!(html.contains("No videos found for this topic."));
    }

    #[tokio::test]
    async fn test_feedback_server_error_alerts() {
        let ctl = controller(
            FakeBackend::default()
                .reply(Endpoint::StudyPlan, 200, plan_reply())
                .reply(Endpoint::Feedback, 404, json!({"success": false, "error": "Material not found"})),
        );
        ctl.select_material("m-1").await.unwrap();
        assert_eq!(
            ctl.submit_feedback().await,
            Outcome::Alert("Error: Material not found".to_string())
        );
        assert!(ctl.view(|p| p.feedback.is_hidden()).await);
    }

    #[tokio::test]
    async fn test_feedback_renders() {
        let ctl = controller(
            FakeBackend::default()
                .reply(Endpoint::StudyPlan, 200, plan_reply())
                .reply(
                    Endpoint::Feedback,
                    200,
                    json!({"success": true, "feedback": {
                        "progress": 73,
                        "on_track": true,
                        "days_remaining": 5,
                        "estimated_completion": "2024-03-20",
                        "suggestions": ["Review your notes regularly"]
                    }}),
                ),
        );
        ctl.select_material("m-1").await.unwrap();
        assert_eq!(ctl.submit_feedback().await, Outcome::Rendered);
        let html = ctl.view(|p| p.feedback_html()).await;
        assert!(html.contains("You are on track!"));
        assert!(html.contains("width: 73%"));
    }

    #[tokio::test]
    async fn test_new_selection_leaves_old_results() {
        let ctl = controller(
            FakeBackend::default()
                .reply(Endpoint::StudyPlan, 200, plan_reply())
                .reply(Endpoint::Ask, 200, json!({"success": true, "answer": "Old"})),
        );
        ctl.select_material("m-1").await.unwrap();
        ctl.submit_ask().await;
        ctl.select_material("m-2").await.unwrap();

        let answer = ctl.view(|p| p.answer.content().cloned()).await;
        assert_eq!(answer.as_deref(), Some("Old"));
        assert_eq!(ctl.view(|p| p.ask.material_id.clone()).await, "m-2");
    }
}
