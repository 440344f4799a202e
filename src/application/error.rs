use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{application::feed::FeedError, config::LoadError, infra::error::InfraError};

/// Diagnostic carried on a failed response for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut cause = error.source();
        while let Some(inner) = cause {
            messages.push(inner.to_string());
            cause = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// A failure a handler can answer with: a status, a message safe to show
/// visitors, and the report that stays server-side.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_report(self) -> ErrorReport {
        self.report
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "application::feed::post_detail";
        match error {
            FeedError::NotFound(slug) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Post not found",
                format!("No published post with slug `{slug}`"),
            ),
            FeedError::Repo(err) => HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load post",
                &err,
            ),
        }
    }
}

/// Failures that keep the server from starting or stop it while running.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}
