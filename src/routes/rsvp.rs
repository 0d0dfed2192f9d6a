use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::AppError,
    router::AppState,
    rsvps::{NewRsvp, create_rsvp},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(rsvp_form))
        .route("/rsvp", post(submit_rsvp))
}

/// Raw form fields. Counts stay as text so a bad number re-renders the form
/// instead of failing extraction.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RsvpForm {
    #[serde(default)]
    guest_name: String,
    #[serde(default)]
    mobile_number: String,
    #[serde(default)]
    email_id: String,
    #[serde(default)]
    count_adults: String,
    #[serde(default)]
    count_kids: String,
}

impl RsvpForm {
    pub fn validate(&self) -> Result<NewRsvp, &'static str> {
        let guest_name = self.guest_name.trim();
        if guest_name.is_empty() {
            return Err("Please tell us your name.");
        }
        let mobile_number = self.mobile_number.trim();
        if mobile_number.is_empty() {
            return Err("Please add a mobile number.");
        }
        let email_id = Some(self.email_id.trim())
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        if email_id.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err("That email address does not look right.");
        }

        let count = |raw: &str| -> Result<u32, &'static str> {
            match raw.trim() {
                "" => Ok(0),
                n => n
                    .parse()
                    .map_err(|_| "Guest counts must be whole numbers of zero or more."),
            }
        };
        let count_adults = count(&self.count_adults)?;
        let count_kids = count(&self.count_kids)?;
        if count_adults == 0 && count_kids == 0 {
            return Err("Please count at least one guest.");
        }

        Ok(NewRsvp {
            guest_name: guest_name.to_string(),
            mobile_number: mobile_number.to_string(),
            email_id,
            count_adults,
            count_kids,
        })
    }
}

pub async fn rsvp_form(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.render("index.html", context! { form => RsvpForm::default() })
}

pub async fn submit_rsvp(
    State(state): State<AppState>,
    Form(form): Form<RsvpForm>,
) -> Result<impl IntoResponse, AppError> {
    let new = match form.validate() {
        Ok(new) => new,
        Err(message) => {
            let html = state.render("index.html", context! { form => form, error => message })?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response());
        }
    };

    let rsvp = create_rsvp(&state.db, new).await?;
    info!("Stored rsvp {} for {} guests", rsvp.id, rsvp.total_guests());

    let html = state.render(
        "rsvp_thanks.html",
        context! {
            guest_name => rsvp.guest_name,
            total_guests => rsvp.total_guests(),
        },
    )?;
    Ok(html.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsvps::tests::model;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header::CONTENT_TYPE},
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use tower::ServiceExt;

    fn form(name: &str, mobile: &str, email: &str, adults: &str, kids: &str) -> RsvpForm {
        RsvpForm {
            guest_name: name.into(),
            mobile_number: mobile.into(),
            email_id: email.into(),
            count_adults: adults.into(),
            count_kids: kids.into(),
        }
    }

    fn app(db: DatabaseConnection) -> Router {
        routes().with_state(AppState::new(db, "Test Party"))
    }

    async fn post_form(db: DatabaseConnection, body: &'static str) -> (StatusCode, String) {
        let response = app(db)
            .oneshot(
                Request::post("/rsvp")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn valid_form_is_trimmed() {
        let new = form("  Jo ", " 555 ", "  ", "2", "").validate().unwrap();

        assert_eq!(new.guest_name, "Jo");
        assert_eq!(new.mobile_number, "555");
        assert_eq!(new.email_id, None);
        assert_eq!((new.count_adults, new.count_kids), (2, 0));
    }

    #[test]
    fn invalid_forms_are_rejected() {
        assert!(form("", "555", "", "1", "0").validate().is_err());
        assert!(form("Jo", " ", "", "1", "0").validate().is_err());
        assert!(form("Jo", "555", "nope", "1", "0").validate().is_err());
        assert!(form("Jo", "555", "", "-1", "2").validate().is_err());
        assert!(form("Jo", "555", "", "two", "0").validate().is_err());
        assert!(form("Jo", "555", "", "0", "0").validate().is_err());
    }

    #[tokio::test]
    async fn form_page_renders() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let response = app(db)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"action="/rsvp""#));
        assert!(html.contains("Test Party"));
    }

    #[tokio::test]
    async fn submission_stores_and_thanks_the_guest() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model("Jo", 2, 1, 0)]])
            .into_connection();

        let (status, html) = post_form(
            db,
            "guest_name=Jo&mobile_number=555&email_id=&count_adults=2&count_kids=1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Thank you, Jo"));
    }

    #[tokio::test]
    async fn bad_submission_keeps_the_form_filled_in() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let (status, html) = post_form(
            db,
            "guest_name=Jo&mobile_number=&count_adults=2&count_kids=1",
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(html.contains("Please add a mobile number."));
        assert!(html.contains(r#"value="Jo""#));
    }
}
