//! Terminal client for the watershed delineation service.
//!
//! Invariant: only [`runtime::UiRuntime::apply`] mutates the page view. The
//! log channel and submission tasks post [`runtime::UiEvent`]s and never touch
//! it directly.
//!
//! # Overview
//! - [`form`] prefills the job form from a page URL query.
//! - [`runtime`] owns the [`view::PageView`] and runs submissions.
//! - [`render`] turns a job result into download and map links.
//! - [`app::drive`] ties the channel, the runtime and the [`present::Presenter`]
//!   together for the `sheed` binary.
//!
//! Transport lives in the `sheed_api` crate.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod present;
pub mod render;
pub mod runtime;
pub mod view;

pub use crate::app::{drive, DriveMode, SessionOutcome};
pub use crate::config::{AppConfig, RunMode};
pub use crate::error::AppError;
pub use crate::form::{FormState, QueryParams};
pub use crate::render::{render_result, ResultLink, ResultPanel};
pub use crate::runtime::{JobSubmitter, UiEvent, UiRuntime, UiSender, ViewChange};
pub use crate::view::{LogArea, PageView, SubmitControl};
