use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
};
use serde::Deserialize;
use tracing::{error, info};

use super::user::{AuthSession, Credentials};
use crate::{error::AppError, router::AppState};

// This allows us to extract the "next" field from the query string. We use this
// to redirect after log in.
#[derive(Debug, Deserialize)]
pub struct NextUrl {
    next: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(self::get::login).post(self::post::login))
        .route("/logout", get(self::get::logout).post(self::get::logout))
}

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
        _ => "/host",
    }
}

mod post {
    use super::*;

    pub async fn login(
        State(state): State<AppState>,
        mut auth_session: AuthSession,
        Form(creds): Form<Credentials>,
    ) -> Result<impl IntoResponse, AppError> {
        let next = creds.next.clone();

        let host = match auth_session.authenticate(creds).await {
            Ok(Some(host)) => host,
            Ok(None) => {
                let html = state.render(
                    "login.html",
                    minijinja::context! {
                        next => next,
                        error => "That passcode is not right.",
                    },
                )?;
                return Ok((StatusCode::UNAUTHORIZED, html).into_response());
            }
            Err(e) => {
                error!("Host authentication failed: {:?}", e);
                return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        if let Err(e) = auth_session.login(&host).await {
            error!("Failed to start host session: {:?}", e);
            return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
        info!("Host logged in");

        Ok(Redirect::to(safe_next(next.as_deref())).into_response())
    }
}

mod get {
    use super::*;

    pub async fn login(
        State(state): State<AppState>,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> Result<impl IntoResponse, AppError> {
        state.render("login.html", minijinja::context! { next => next })
    }

    pub async fn logout(mut auth_session: AuthSession) -> impl IntoResponse {
        match auth_session.logout().await {
            Ok(_) => {
                info!("Host logged out");
                Redirect::to("/login").into_response()
            }
            Err(e) => {
                error!("Failed to end host session: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
