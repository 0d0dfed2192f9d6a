use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::rsvps::RsvpError;

/// Failures that end a page request.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("RSVP store error: {0}")]
    Store(#[from] RsvpError),

    #[error(transparent)]
    Template(#[from] minijinja::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("{:#}", self);
        let body = Html(format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Something went wrong</title>
</head>
<body>
    <h1>Something went wrong</h1>
    <p>{}</p>
</body>
</html>"#,
            match self {
                AppError::Store(_) => "We could not reach the RSVP list. Please try again.",
                AppError::Template(_) => "This page could not be rendered.",
            }
        ));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
