//! Backend endpoints and the transport that reaches them.

use std::fmt;

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};
use thiserror::Error;
use url::Url;

use crate::config::PlannerConfig;
use crate::forms::{FormData, FormValue};
use crate::model::Envelope;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network response was not ok")]
    Status(u16),

    #[error("{0}")]
    Server(String),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Upload,
    Ask,
    GenerateQuiz,
    GetVideos,
    Feedback,
    StudyPlan,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Upload => "/upload",
            Endpoint::Ask => "/ask",
            Endpoint::GenerateQuiz => "/generate_quiz",
            Endpoint::GetVideos => "/get_videos",
            Endpoint::Feedback => "/feedback",
            Endpoint::StudyPlan => "/get_study_plan",
        }
    }

    /// Alert shown when the request or its JSON decoding fails.
    pub fn failure_notice(self) -> &'static str {
        match self {
            Endpoint::Upload => "An error occurred during upload",
            Endpoint::Ask => "An error occurred while asking the question",
            Endpoint::GenerateQuiz => "An error occurred while generating the quiz",
            Endpoint::GetVideos => "An error occurred while searching for videos",
            Endpoint::Feedback => "An error occurred while getting feedback",
            Endpoint::StudyPlan => "Failed to load study plan",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Raw reply: status plus undecoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn envelope(&self) -> Result<Envelope, ApiError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Seam between the controller and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a multipart form to `endpoint`.
    async fn post_form(&self, endpoint: Endpoint, form: FormData) -> Result<Response, ApiError>;

    /// GET `endpoint` with query parameters.
    async fn get(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<Response, ApiError>;
}

/// reqwest-backed transport. No timeout is configured.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    session_cookie: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &PlannerConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder().user_agent(config.user_agent.as_str()).build()?;

        Ok(Self {
            client,
            base_url,
            session_cookie: config.session_cookie.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, endpoint: Endpoint) -> Result<Url, ApiError> {
        Ok(self.base_url.join(endpoint.path())?)
    }

    fn with_session(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => request.header(header::COOKIE, cookie.as_str()),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ApiError> {
        let response = self.with_session(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("<- {} ({} bytes)", status, body.len());
        Ok(Response { status, body })
    }
}

fn to_multipart(form: FormData) -> Form {
    form.into_iter()
        .fold(Form::new(), |multipart, (name, value)| match value {
            FormValue::Text(text) => multipart.text(name, text),
            FormValue::File(file) => {
                multipart.part(name, Part::bytes(file.bytes).file_name(file.file_name))
            }
        })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, endpoint: Endpoint, form: FormData) -> Result<Response, ApiError> {
        let url = self.url_for(endpoint)?;
        debug!("-> POST {} ({} fields)", url, form.len());
        self.send(self.client.post(url).multipart(to_multipart(form)))
            .await
    }

    async fn get(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<Response, ApiError> {
        let url = self.url_for(endpoint)?;
        debug!("-> GET {}", url);
        self.send(self.client.get(url).query(query)).await
    }
}
