//! Study Planner client
//!
//! Binds dashboard actions (upload, material selection, Q&A, quiz, video
//! search, feedback) to the planner backend and renders its JSON replies
//! into HTML fragments held in a typed page model.

pub mod api;
pub mod config;
pub mod controller;
pub mod forms;
pub mod model;
pub mod page;
pub mod quiz;
pub mod render;

pub use api::{ApiError, Endpoint, HttpTransport, Transport};
pub use config::PlannerConfig;
pub use controller::{Controller, Outcome};
pub use page::Page;
