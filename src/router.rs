use crate::{
    auth::{router as auth_router, user::Backend},
    config::Config,
    error::AppError,
    routes::{host, rsvp},
    util::asset_loader::AssetLoader,
};
use axum::{
    Router, middleware,
    response::Html,
    routing::get_service,
};
use axum_login::{
    AuthManagerLayerBuilder, login_required,
    tower_sessions::{
        Expiry, SessionManagerLayer, SessionStore,
        cookie::{SameSite, time},
    },
};
use minijinja::Environment;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tokio::{signal, task::AbortHandle};
use tower_http::{services::ServeDir, trace::TraceLayer};

// `DatabaseConnection` is not `Clone` once sea-orm's mock backend is enabled.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, event_name: &str) -> Self {
        Self {
            db: Arc::new(db),
            templates: Arc::new(setup_templates(event_name)),
        }
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, AppError> {
        let tmpl = self.templates.get_template(name)?;
        Ok(Html(tmpl.render(ctx)?))
    }
}

pub fn create_router<S: SessionStore + Clone>(
    db: DatabaseConnection,
    config: &Config,
    session_store: S,
) -> Router {
    let state = AppState::new(db, &config.event_name);

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(1)));

    // Auth service.
    //
    // This combines the session layer with our backend to establish the auth
    // service which will provide the auth session as a request extension.
    let backend = Backend::new(&config.host_passcode);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    Router::new()
        .nest(
            "/host",
            host::routes()
                .route_layer(login_required!(Backend, login_url = "/login"))
                .merge(
                    host::export_routes().route_layer(middleware::from_fn(host::require_host)),
                ),
        )
        .merge(rsvp::routes())
        .merge(auth_router::router())
        .with_state(state)
        .nest_service("/static", get_service(ServeDir::new("static")))
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
}

fn setup_templates(event_name: &str) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader("templates"));
    env.add_global("event_name", event_name.to_string());
    let asset_loader = AssetLoader::new("static");
    asset_loader.register(&mut env);
    env
}

pub async fn shutdown_signal(deletion_task_abort_handle: AbortHandle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { deletion_task_abort_handle.abort() },
        _ = terminate => { deletion_task_abort_handle.abort() },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::routes::host::SESSION_EXPIRED;
    use axum::{
        body::{Body, to_bytes},
        http::{
            Request, StatusCode,
            header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        },
        response::Response,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    pub(crate) const PASSCODE: &str = "open sesame";

    pub(crate) fn test_app(db: DatabaseConnection) -> Router {
        let config = Config {
            database_url: String::new(),
            rust_log: "debug".into(),
            bind_addr: "127.0.0.1:0".into(),
            host_passcode: PASSCODE.into(),
            event_name: "Test Party".into(),
        };
        create_router(db, &config, MemoryStore::default())
    }

    pub(crate) fn empty_db() -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres).into_connection()
    }

    pub(crate) async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    pub(crate) fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub(crate) fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// The `name=value` part of the session cookie set by a response.
    pub(crate) fn session_cookie(response: &Response) -> String {
        let header = response.headers()[SET_COOKIE].to_str().unwrap();
        header.split(';').next().unwrap().to_string()
    }

    pub(crate) fn location(response: &Response) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    pub(crate) async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn dashboard_without_a_session_redirects_to_login() {
        let app = test_app(empty_db());

        let response = send(&app, get("/host", None)).await;

        assert!(response.status().is_redirection());
        assert!(location(&response).starts_with("/login?next="));
    }

    #[tokio::test]
    async fn export_without_a_session_is_a_json_failure_not_a_csv() {
        let app = test_app(empty_db());

        let response = send(&app, get("/host/export", None)).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(LOCATION).is_none());
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], SESSION_EXPIRED);
    }

    #[tokio::test]
    async fn export_with_a_session_is_served_as_csv() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<crate::entities::rsvp::Model>::new()])
            .into_connection();
        let app = test_app(db);

        let login = send(&app, post_form("/login", "passcode=open+sesame", None)).await;
        let cookie = session_cookie(&login);
        let response = send(&app, get("/host/export", Some(&cookie))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/csv; charset=utf-8");
    }

    #[tokio::test]
    async fn dashboard_script_refuses_redirects_and_defers_url_revocation() {
        let app = test_app(empty_db());

        let response = send(&app, get("/static/js/host.js", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let script = body_string(response).await;

        assert!(script.contains("redirect: 'manual'"));
        assert!(script.contains("response.type === 'opaqueredirect' || response.redirected"));
        assert!(script.contains("contentType.startsWith('text/csv')"));
        assert!(script.contains("setTimeout(() => URL.revokeObjectURL(url)"));
        assert!(script.contains(SESSION_EXPIRED));
    }

    #[tokio::test]
    async fn guest_form_is_public() {
        let app = test_app(empty_db());

        let response = send(&app, get("/", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
