use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
        call(
            app,
            Method::POST,
            "/user/register",
            None,
            Some(json!({
                "firstname": "Alice",
                "lastname": "Liddell",
                "username": username,
                "password": password,
            })),
        )
        .await
    }

    async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
        call(
            app,
            Method::POST,
            "/user/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_login_and_use_token() {
        let app = build_app(AppState::fake());

        let (status, user) = register(&app, "alice", "s3cret").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["username"], "alice");
        assert!(user.get("password_hash").is_none());
        let id = user["id"].as_str().unwrap().to_string();

        let (status, body) = login(&app, "alice", "s3cret").await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, fetched) = call(&app, Method::GET, &format!("/user/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["username"], "alice");

        let (status, list) = call(&app, Method::GET, "/users/list", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_is_conflict() {
        let app = build_app(AppState::fake());
        assert_eq!(register(&app, "alice", "s3cret").await.0, StatusCode::CREATED);
        let (status, body) = register(&app, "alice", "other").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn bad_credentials_get_no_token() {
        let app = build_app(AppState::fake());
        register(&app, "alice", "s3cret").await;

        let (status, wrong) = login(&app, "alice", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(wrong.get("token").is_none());

        let (status, unknown) = login(&app, "bob", "anything").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn blank_login_fields_are_bad_request() {
        let app = build_app(AppState::fake());
        assert_eq!(login(&app, "", "x").await.0, StatusCode::BAD_REQUEST);
        assert_eq!(login(&app, "alice", "").await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn protected_routes_need_a_valid_token() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/users/list", None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");

        let (status, _) = call(&app, Method::GET, "/users/list", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn update_then_delete() {
        let app = build_app(AppState::fake());
        let (_, user) = register(&app, "alice", "s3cret").await;
        let id = user["id"].as_str().unwrap().to_string();
        let token = login(&app, "alice", "s3cret").await.1["token"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, _) = call(
            &app,
            Method::PUT,
            "/user",
            Some(&token),
            Some(json!({ "id": id, "lastname": "Hargreaves", "password": "n3w" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login(&app, "alice", "s3cret").await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(login(&app, "alice", "n3w").await.0, StatusCode::OK);

        let (status, _) = call(&app, Method::DELETE, "/user", Some(&token), Some(json!({ "id": id }))).await;
        assert_eq!(status, StatusCode::OK);

        // The token outlives the account; lookups no longer see it.
        let (status, _) = call(&app, Method::GET, &format!("/user/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, "/user", Some(&token), Some(json!({ "id": id }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(login(&app, "alice", "n3w").await.0, StatusCode::UNAUTHORIZED);
    }
}
