use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub mod clubs;
pub mod games;
pub mod health;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(games::routes())
        .merge(clubs::routes())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use lambda_http::tower::ServiceExt;
    use serde_json::{json, Value};

    const SECRET: &str = "test-secret-key";

    struct TestApp {
        router: Router,
        state: AppState,
    }

    impl TestApp {
        fn new() -> Self {
            let state = AppState::in_memory(SECRET);
            TestApp {
                router: router(state.clone()),
                state,
            }
        }

        async fn call(
            &self,
            method: &str,
            uri: &str,
            player: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(player) = player {
                let token = self.state.auth_service.generate_token(player).unwrap();
                request = request.header("Authorization", format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => request
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let app = TestApp::new();

        let (status, _) = app.call("GET", "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let app = TestApp::new();

        let (status, body) = app.call("POST", "/games", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errorKind"], "AuthorizationError");
    }

    #[tokio::test]
    async fn test_game_flow_over_http() {
        let app = TestApp::new();

        let (status, hosted) = app.call("POST", "/games", Some("alice"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let session_id = hosted["sessionId"].as_str().unwrap().to_string();

        let (status, joined) = app
            .call(
                "POST",
                "/games/join",
                Some("bob"),
                Some(json!({ "joinCode": hosted["joinCode"] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(joined["isWhite"], false);
        assert_eq!(joined["opponentId"], "alice");

        let moves = format!("/games/{}/moves", session_id);
        let (status, body) = app
            .call(
                "POST",
                &moves,
                Some("bob"),
                Some(json!({ "from": "e7", "to": "e5" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errorKind"], "StateError");

        let (status, _) = app
            .call(
                "POST",
                &moves,
                Some("alice"),
                Some(json!({ "from": "e2", "to": "e4" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, view) = app
            .call("GET", &format!("/games/{}", session_id), Some("bob"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["activeColor"], "black");
        assert_eq!(view["whiteId"], "alice");
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_validation_error() {
        let app = TestApp::new();

        let (status, body) = app
            .call("POST", "/games/join", Some("bob"), Some(json!({ "code": 1 })))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorKind"], "ValidationError");
    }

    #[tokio::test]
    async fn test_club_approval_flow_over_http() {
        let app = TestApp::new();

        let (status, created) = app
            .call(
                "POST",
                "/clubs",
                Some("alice"),
                Some(json!({ "name": "Knights", "country": "IE", "approvalRequired": true })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let club_id = created["clubId"].as_str().unwrap().to_string();

        let (_, joined) = app
            .call("POST", &format!("/clubs/{}/join", club_id), Some("bob"), None)
            .await;
        assert_eq!(joined["status"], "pending");

        let (status, _) = app
            .call(
                "GET",
                &format!("/clubs/{}/requests", club_id),
                Some("bob"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, view) = app
            .call(
                "POST",
                &format!("/clubs/{}/members/bob/admit", club_id),
                Some("alice"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["memberCount"], 2);

        let (_, mine) = app.call("GET", "/clubs/mine", Some("bob"), None).await;
        assert_eq!(mine.as_array().map(Vec::len), Some(1));

        let (_, found) = app
            .call("GET", "/clubs?namePrefix=Kni&sort=descending", Some("carol"), None)
            .await;
        assert_eq!(found[0]["id"], club_id.as_str());

        let (status, _) = app
            .call("DELETE", &format!("/clubs/{}", club_id), Some("alice"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app
            .call("GET", &format!("/clubs/{}", club_id), Some("alice"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Club does not exist");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let app = TestApp::new();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/clubs")
            .header("Origin", "https://game.example.com")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
