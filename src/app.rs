use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::auth;
use crate::config::AppConfig;
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    // Anything that is not an API route is served from the static frontend
    // directory, with the login page as the not-found fallback.
    let static_dir = state.config.static_dir.clone();
    let frontend =
        ServeDir::new(&static_dir).not_found_service(ServeFile::new(static_dir.join("login.html")));

    Router::new()
        .merge(auth::router())
        .with_state(state)
        .fallback_service(frontend)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::AuthService;
    use crate::store::UserStore;

    fn test_app(dir: &tempfile::TempDir) -> Router {
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            users_file: dir.path().join("users.json"),
            static_dir: dir.path().join("public"),
        };
        let store = UserStore::open(config.users_file.clone());
        build_app(AppState::from_parts(AuthService::new(store), config))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(res: axum::http::Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn signup_then_login_happy_path() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let res = app
            .clone()
            .oneshot(post_json(
                "/api/signup",
                json!({"name": "Alice", "email": "a@x.com", "password": "secret1"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["message"], "Signup successful.");

        // Login matches the email case-insensitively and returns the stored
        // name and email, never the hash.
        let res = app
            .oneshot(post_json(
                "/api/login",
                json!({"email": "A@X.com", "password": "secret1"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["message"], "Login successful.");
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["email"], "a@x.com");
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn signup_missing_fields_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let res = app
            .oneshot(post_json("/api/signup", json!({"email": "a@x.com"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["message"], "Name, email and password are required.");
    }

    #[tokio::test]
    async fn duplicate_signup_is_409() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let payload = json!({"name": "Alice", "email": "a@x.com", "password": "secret1"});
        let res = app
            .clone()
            .oneshot(post_json("/api/signup", payload.clone()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = app
            .oneshot(post_json("/api/signup", payload))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body = body_json(res).await;
        assert_eq!(body["message"], "Email already registered.");
    }

    #[tokio::test]
    async fn login_failures_are_401_with_a_uniform_message() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let res = app
            .clone()
            .oneshot(post_json(
                "/api/signup",
                json!({"name": "Alice", "email": "a@x.com", "password": "secret1"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let wrong_password = app
            .clone()
            .oneshot(post_json(
                "/api/login",
                json!({"email": "a@x.com", "password": "wrong"}),
            ))
            .await
            .unwrap();
        let unknown_email = app
            .oneshot(post_json(
                "/api/login",
                json!({"email": "nobody@x.com", "password": "secret1"}),
            ))
            .await
            .unwrap();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
        let a = body_json(wrong_password).await;
        let b = body_json(unknown_email).await;
        assert_eq!(a, b);
        assert_eq!(a["message"], "Invalid email or password.");
    }

    #[tokio::test]
    async fn login_missing_fields_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let res = app
            .oneshot(post_json("/api/login", json!({"email": "a@x.com"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["message"], "Email and password are required.");
    }
}
