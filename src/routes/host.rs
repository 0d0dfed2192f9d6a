use axum::{
    Json, Router,
    extract::{Request, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::SecondsFormat;
use minijinja::context;
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    auth::user::AuthSession,
    error::AppError,
    router::AppState,
    rsvps::{
        Rsvp,
        export::{CSV_CONTENT_TYPE, export_rsvps},
        get_rsvps,
        summary::Summary,
    },
};

/// Pages that send a logged-out host to the login form.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/refresh", post(refresh))
}

/// Called from the dashboard script, so failures are JSON instead of redirects.
pub fn export_routes() -> Router<AppState> {
    Router::new().route("/export", get(export))
}

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// One guest table row, with the timestamp already formatted for display.
#[derive(Debug, Serialize)]
struct GuestRow<'a> {
    id: Uuid,
    guest_name: &'a str,
    mobile_number: &'a str,
    email_id: Option<&'a str>,
    count_adults: u32,
    count_kids: u32,
    total_guests: u64,
    /// RFC 3339 UTC, localised in the browser.
    submitted_at: String,
    submitted_date: String,
    submitted_time: String,
}

impl<'a> From<&'a Rsvp> for GuestRow<'a> {
    fn from(rsvp: &'a Rsvp) -> Self {
        GuestRow {
            id: rsvp.id,
            guest_name: &rsvp.guest_name,
            mobile_number: &rsvp.mobile_number,
            email_id: rsvp.email_id.as_deref().filter(|e| !e.is_empty()),
            count_adults: rsvp.count_adults,
            count_kids: rsvp.count_kids,
            total_guests: rsvp.total_guests(),
            submitted_at: rsvp
                .submitted_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            submitted_date: rsvp.submitted_at.format("%b %-d, %Y").to_string(),
            submitted_time: rsvp.submitted_at.format("%-I:%M:%S %p").to_string(),
        }
    }
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let rsvps = get_rsvps(&state.db).await?;
    render_dashboard(&state, &rsvps)
}

fn render_dashboard(state: &AppState, rsvps: &[Rsvp]) -> Result<Html<String>, AppError> {
    let summary = Summary::from_rsvps(rsvps);
    let rows: Vec<GuestRow> = rsvps.iter().map(GuestRow::from).collect();

    state.render(
        "host/dashboard.html",
        context! {
            summary => summary,
            rsvps => rows,
        },
    )
}

pub async fn refresh() -> Redirect {
    debug!("Dashboard refresh requested");
    Redirect::to("/host")
}

#[derive(Debug, Serialize)]
struct ExportFailure {
    error: String,
}

fn export_failure(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ExportFailure {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Guards the export endpoint. A redirect here would be followed by `fetch`
/// and the login page saved as the CSV.
pub async fn require_host(auth_session: AuthSession, request: Request, next: Next) -> Response {
    if auth_session.user.is_none() {
        debug!("Export requested without a host session");
        return export_failure(StatusCode::UNAUTHORIZED, SESSION_EXPIRED);
    }
    next.run(request).await
}

pub async fn export(State(state): State<AppState>) -> Response {
    match export_rsvps(&state.db).await {
        Ok(export) => {
            let mut response = export.content.into_response();
            let headers = response.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(CSV_CONTENT_TYPE));
            headers.insert(
                CONTENT_DISPOSITION,
                HeaderValue::from_str(&format!("attachment; filename=\"{}\"", export.filename))
                    .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
            );
            response
        }
        Err(e) => {
            error!("RSVP export failed: {:#}", e);
            export_failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
