use std::net::SocketAddr;
use std::path::Path;

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::state::AppState;
use crate::{auth, collections, profile};

const PAGES: [&str; 4] = ["signin", "signup", "booking", "profile"];

pub fn build_app(state: AppState) -> Router {
    let pages = static_pages(&state.config.static_dir);
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(profile::router())
                .merge(collections::router())
                .route("/health", get(|| async { "ok" })),
        )
        .merge(pages)
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
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

/// `/` and the named pages map to their HTML files; anything else is looked up under `dir`.
fn static_pages(dir: &Path) -> Router<AppState> {
    let mut router = Router::new().route_service("/", ServeFile::new(dir.join("index.html")));
    for page in PAGES {
        router = router.route_service(
            &format!("/{page}"),
            ServeFile::new(dir.join(format!("{page}.html"))),
        );
    }
    router.fallback_service(ServeDir::new(dir))
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::FromRef,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::{claims::TokenKind, jwt::JwtKeys};

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => builder.body(Body::from(b.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn signup(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": email,
                "password": password,
            })),
        )
        .await
    }

    async fn signin(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Registers `email` and returns an access token for it.
    async fn registered(app: &Router, email: &str) -> String {
        let (status, _) = signup(app, email, "Abc12345!").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = signin(app, email, "Abc12345!").await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn count(app: &Router, token: &str, collection: &str) -> usize {
        let (status, body) = send(app, "GET", &format!("/api/user/{collection}"), Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().unwrap().len()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(AppState::fake());
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signup_signin_profile_flow() {
        let app = build_app(AppState::fake());

        let (status, body) = signup(&app, "a@b.com", "Abc12345!").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "a@b.com");

        let (status, body) = signin(&app, "a@b.com", "Abc12345!").await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();
        assert!(body["refreshToken"].is_string());
        assert_eq!(body["user"]["firstName"], "Ada");

        let (status, profile) = send(&app, "GET", "/api/user/profile", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], "a@b.com");
        assert_eq!(profile["firstName"], "Ada");
        assert_eq!(profile["lastName"], "Lovelace");
        assert!(profile.get("password").is_none());
        assert!(profile.get("passwordHash").is_none());
        assert_eq!(profile["wishlist"], json!([]));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_regardless_of_other_fields() {
        let app = build_app(AppState::fake());
        let (status, _) = signup(&app, "a@b.com", "Abc12345!").await;
        assert_eq!(status, StatusCode::CREATED);

        for (email, password) in [("a@b.com", "Other999!"), (" A@B.com ", "short"), ("a@b.com", "x")] {
            let (status, body) = signup(&app, email, password).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code"], "DUPLICATE_EMAIL");
        }
    }

    #[tokio::test]
    async fn signup_requires_all_fields() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "a@b.com", "password": "Abc12345!" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("firstName"));
    }

    async fn send_raw(app: &Router, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("Content-Type", ct);
        }
        let response = app
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).expect("error body is JSON"))
    }

    #[tokio::test]
    async fn unreadable_bodies_are_json_validation_errors() {
        let app = build_app(AppState::fake());
        let wrong_type = r#"{"firstName":1,"lastName":"L","email":"a@b.com","password":"Abc12345!"}"#;
        let cases = [
            ("/api/auth/signup", Some("application/json"), wrong_type),
            ("/api/auth/signup", Some("application/json"), "{not json"),
            ("/api/auth/signin", None, r#"{"email":"a@b.com","password":"Abc12345!"}"#),
        ];
        for (uri, content_type, body) in cases {
            let (status, resp) = send_raw(&app, uri, content_type, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(resp["code"], "VALIDATION_ERROR");
            assert!(resp["message"].is_string());
        }

        let token = registered(&app, "a@b.com").await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/user/wishlist")
                    .header("Authorization", format!("Bearer {token}"))
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"destination":["Lisbon"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(count(&app, &token, "wishlist").await, 0);
    }

    #[tokio::test]
    async fn signin_with_bad_credentials_is_400() {
        let app = build_app(AppState::fake());
        signup(&app, "a@b.com", "Abc12345!").await;

        let (status, body) = signin(&app, "a@b.com", "wrong-pass").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_CREDENTIALS");

        let (status, body) = signin(&app, "nobody@b.com", "Abc12345!").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn missing_token_is_401_and_bad_token_is_403() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, "GET", "/api/user/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authentication token required");

        let (status, body) = send(&app, "GET", "/api/user/profile", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let token = registered(&app, "a@b.com").await;
        let (status, _) = send(&app, "GET", "/api/user/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let keys = JwtKeys::from_ref(&state);
        let user = state.store.find_by_email("a@b.com").await.unwrap().unwrap();
        let expired = keys
            .issue(user.id, &user.email, TokenKind::Access, time::Duration::seconds(-1))
            .unwrap();
        let (status, _) = send(&app, "GET", "/api/user/profile", Some(&expired), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let app = build_app(AppState::fake());
        signup(&app, "a@b.com", "Abc12345!").await;
        let (_, body) = signin(&app, "a@b.com", "Abc12345!").await;
        let refresh = body["refreshToken"].as_str().unwrap();

        let (status, _) = send(&app, "GET", "/api/user/profile", Some(refresh), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refreshToken": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let fresh = body["token"].as_str().unwrap();
        let (status, _) = send(&app, "GET", "/api/user/profile", Some(fresh), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let app = build_app(AppState::fake());
        let token = registered(&app, "a@b.com").await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refreshToken": token })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejected_requests_do_not_mutate_store() {
        let app = build_app(AppState::fake());
        let token = registered(&app, "a@b.com").await;
        let mut tampered = token.clone();
        tampered.replace_range(tampered.len() - 4.., "AAAA");
        assert_ne!(tampered, token);

        for collection in ["wishlist", "history", "addresses"] {
            let body = json!({
                "destination": "Lisbon",
                "street": "1 Rua",
                "city": "Lisbon",
                "country": "Portugal",
            });
            let uri = format!("/api/user/{collection}");
            let (status, _) = send(&app, "POST", &uri, None, Some(body.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            let (status, _) = send(&app, "POST", &uri, Some(&tampered), Some(body)).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(count(&app, &token, collection).await, 0);
        }

        let (status, _) = send(
            &app,
            "PUT",
            "/api/user/profile",
            Some(&tampered),
            Some(json!({ "bio": "hacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (_, profile) = send(&app, "GET", "/api/user/profile", Some(&token), None).await;
        assert!(profile["bio"].is_null());

        let (status, item) = send(
            &app,
            "POST",
            "/api/user/wishlist",
            Some(&token),
            Some(json!({ "destination": "Porto" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/user/wishlist/{}", item["id"].as_str().unwrap());
        let (status, _) = send(&app, "DELETE", &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, "DELETE", &uri, Some(&tampered), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (_, listed) = send(&app, "GET", "/api/user/wishlist", Some(&token), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], item["id"]);
    }

    #[tokio::test]
    async fn create_list_delete_wishlist() {
        let app = build_app(AppState::fake());
        let token = registered(&app, "a@b.com").await;

        let (status, item) = send(
            &app,
            "POST",
            "/api/user/wishlist",
            Some(&token),
            Some(json!({ "destination": "Bali, Indonesia" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["destination"], "Bali, Indonesia");
        assert_eq!(item["notes"], "");
        assert!(item["createdAt"].is_string());
        assert_eq!(count(&app, &token, "wishlist").await, 1);

        let id = item["id"].as_str().unwrap();
        let uri = format!("/api/user/wishlist/{id}");
        let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Wishlist item deleted successfully");
        assert_eq!(count(&app, &token, "wishlist").await, 0);

        let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_unknown_id_is_404_and_keeps_length() {
        let app = build_app(AppState::fake());
        let token = registered(&app, "a@b.com").await;
        send(
            &app,
            "POST",
            "/api/user/history",
            Some(&token),
            Some(json!({ "destination": "Tokyo, Japan", "dates": "May 2023" })),
        )
        .await;

        for id in [Uuid::new_v4().to_string(), "h1".to_string()] {
            let (status, body) =
                send(&app, "DELETE", &format!("/api/user/history/{id}"), Some(&token), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["message"], "Travel history item not found");
            assert_eq!(count(&app, &token, "history").await, 1);
        }
    }

    #[tokio::test]
    async fn items_missing_required_fields_are_rejected() {
        let app = build_app(AppState::fake());
        let token = registered(&app, "a@b.com").await;

        let cases = [
            ("wishlist", json!({ "notes": "no destination" })),
            ("history", json!({ "destination": "   " })),
            ("addresses", json!({ "street": "1 Main", "city": "Paris" })),
        ];
        for (collection, body) in cases {
            let uri = format!("/api/user/{collection}");
            let (status, resp) = send(&app, "POST", &uri, Some(&token), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{collection}");
            assert_eq!(resp["code"], "VALIDATION_ERROR");
            assert_eq!(count(&app, &token, collection).await, 0);
        }
    }

    #[tokio::test]
    async fn items_are_scoped_to_their_owner() {
        let app = build_app(AppState::fake());
        let alice = registered(&app, "alice@b.com").await;
        let bob = registered(&app, "bob@b.com").await;

        let (_, addr) = send(
            &app,
            "POST",
            "/api/user/addresses",
            Some(&alice),
            Some(json!({ "street": "123 Main St", "city": "San Francisco", "country": "United States" })),
        )
        .await;
        assert_eq!(addr["label"], "Address");
        assert_eq!(count(&app, &bob, "addresses").await, 0);

        let uri = format!("/api/user/addresses/{}", addr["id"].as_str().unwrap());
        let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(count(&app, &alice, "addresses").await, 1);
    }

    #[tokio::test]
    async fn profile_update_is_partial() {
        let app = build_app(AppState::fake());
        let token = registered(&app, "a@b.com").await;

        let (status, updated) = send(
            &app,
            "PUT",
            "/api/user/profile",
            Some(&token),
            Some(json!({ "phone": "+1 (555) 000-0000", "firstName": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["phone"], "+1 (555) 000-0000");
        assert_eq!(updated["firstName"], "Ada");
        assert_eq!(updated["lastName"], "Lovelace");
        assert_eq!(updated["email"], "a@b.com");
        assert!(updated["updatedAt"].is_string());
        assert!(updated.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn profile_update_validates_email() {
        let app = build_app(AppState::fake());
        let (_, first) = signup(&app, "taken@b.com", "Abc12345!").await;
        let first_id = first["user"]["id"].as_str().unwrap().to_string();
        let token = registered(&app, "a@b.com").await;

        let (status, _) = send(
            &app,
            "PUT",
            "/api/user/profile",
            Some(&token),
            Some(json!({ "email": "not-an-email" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/user/profile",
            Some(&token),
            Some(json!({ "email": "Taken@B.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "taken@b.com");

        // Sign-in by that address still reaches the account that registered it first.
        let (status, body) = signin(&app, "taken@b.com", "Abc12345!").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], first_id.as_str());
        let (_, mine) = send(&app, "GET", "/api/user/profile", Some(&token), None).await;
        assert_eq!(mine["email"], "taken@b.com");
        assert_ne!(mine["id"], first_id.as_str());

        let (status, body) = signup(&app, "taken@b.com", "Abc12345!").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "DUPLICATE_EMAIL");
    }

    #[tokio::test]
    async fn token_for_vanished_user_is_404() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let token = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4(), "ghost@b.com")
            .unwrap();

        let (status, _) = send(&app, "GET", "/api/user/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/api/user/wishlist", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &app,
            "POST",
            "/api/user/wishlist",
            Some(&token),
            Some(json!({ "destination": "Nowhere" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
