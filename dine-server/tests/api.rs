//! HTTP API end to end, driven through `tower::ServiceExt::oneshot`

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use dine_server::core::BackgroundTasks;
use dine_server::{Config, ServerState, api};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    state: ServerState,
    app: Router,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        config.log_dir = None;
        config.tray_settle_delay_ms = 20;
        config.admin_mobile = Some("9000000001".into());
        config.admin_password = Some("s3cret-pass".into());

        let state = ServerState::initialize(&config).unwrap();
        let app = api::build_app(state.clone());
        Self {
            _dir: dir,
            state,
            app,
        }
    }

    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn signup(&self, first: &str, mobile: &str) -> i64 {
        let (status, user) = self
            .call(
                "POST",
                "/api/auth/signup",
                Some(json!({"firstName": first, "lastName": "Guest", "mobile": mobile})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{user}");
        user["id"].as_i64().unwrap()
    }

    async fn product(&self, name: &str, full: f64, half: f64) -> i64 {
        let (status, product) = self
            .call(
                "POST",
                "/api/products",
                Some(json!({
                    "name": name,
                    "category": "Main",
                    "fullPortionPrice": full,
                    "halfPortionPrice": half,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{product}");
        product["id"].as_i64().unwrap()
    }

    async fn order(&self, user_id: i64, product_id: i64, table: &str) -> Value {
        let (status, _) = self
            .call(
                "POST",
                &format!("/api/cart/{user_id}"),
                Some(json!({"productId": product_id, "fullPortionQty": 1})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, order) = self
            .call(
                "POST",
                &format!("/api/cart/{user_id}/checkout"),
                Some(json!({"tableNumber": table})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{order}");
        order
    }

    async fn trays(&self) -> Value {
        self.call("GET", "/api/trays", None).await.1
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_signup_and_login() {
    let app = TestApp::new();
    let id = app.signup("Meera", "9811122233").await;

    let (status, user) = app
        .call("POST", "/api/auth/login", Some(json!({"mobile": "9811122233"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"].as_i64(), Some(id));

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/signup",
            Some(json!({"firstName": "Other", "lastName": "Guest", "mobile": "9811122233"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1008);

    app.call("POST", &format!("/api/users/{id}/toggle"), None).await;
    let (status, body) = app
        .call("POST", "/api/auth/login", Some(json!({"mobile": "9811122233"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1007);
}

#[tokio::test]
async fn test_admin_login() {
    let app = TestApp::new();
    let (status, admin) = app
        .call(
            "POST",
            "/api/auth/admin/login",
            Some(json!({"mobile": "9000000001", "password": "s3cret-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(admin.get("hash_pass").is_none());

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/admin/login",
            Some(json!({"mobile": "9000000001", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_fills_trays_by_table() {
    let app = TestApp::new();
    let user = app.signup("Ravi", "9822233344").await;
    let thali = app.product("Thali", 320.0, 180.0).await;

    app.order(user, thali, "12").await;
    app.order(user, thali, "5").await;
    let order = app.order(user, thali, "30").await;
    assert_eq!(order["status"], "Pending");

    let trays = app.trays().await;
    assert_eq!(trays, json!({"tray1": 5, "tray2": 12, "tray3": 30, "trayCount": 3}));

    let (_, cart) = app.call("GET", &format!("/api/cart/{user}"), None).await;
    assert_eq!(cart, json!([]));
}

#[tokio::test]
async fn test_checkout_validation() {
    let app = TestApp::new();
    let user = app.signup("Nina", "9833344455").await;

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/cart/{user}/checkout"),
            Some(json!({"tableNumber": "4"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4007);

    let dosa = app.product("Dosa", 120.0, 70.0).await;
    app.call(
        "POST",
        &format!("/api/cart/{user}"),
        Some(json!({"productId": dosa, "halfPortionQty": 2})),
    )
    .await;
    let (status, body) = app
        .call(
            "POST",
            &format!("/api/cart/{user}/checkout"),
            Some(json!({"tableNumber": "0"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 7004);
    assert_eq!(app.trays().await["trayCount"], 0);
}

#[tokio::test]
async fn test_manual_tray_edit() {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            "PUT",
            "/api/trays",
            Some(json!({"tray1": "4", "tray2": "x", "tray3": "0"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 7401);
    assert_eq!(app.trays().await["tray1"], 0);

    let (status, body) = app
        .call(
            "PUT",
            "/api/trays",
            Some(json!({"tray1": "4", "tray2": "0", "tray3": "17"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trayCount"], 2);
    assert_eq!(app.trays().await, json!({"tray1": 4, "tray2": 0, "tray3": 17, "trayCount": 2}));
}

#[tokio::test]
async fn test_served_signal_repopulates_through_server_session() {
    let app = TestApp::new();
    let tasks: BackgroundTasks = app.state.start_background_tasks();

    let user = app.signup("Kabir", "9844455566").await;
    let naan = app.product("Naan", 60.0, 35.0).await;
    let first = app.order(user, naan, "8").await;
    app.order(user, naan, "3").await;
    app.order(user, naan, "6").await;
    app.order(user, naan, "1").await;

    // the oldest order is delivered and completed
    let first_id = first["id"].as_i64().unwrap();
    let (status, _) = app
        .call("POST", &format!("/api/orders/{first_id}/complete"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call("POST", "/api/robot/served", Some(json!({"served": true})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut settled = false;
    for _ in 0..200 {
        let (_, robot) = app.call("GET", "/api/robot", None).await;
        if robot["served"] == false && app.trays().await["tray1"] == 1 {
            settled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(settled, "served signal was not handled");
    assert_eq!(app.trays().await, json!({"tray1": 1, "tray2": 3, "tray3": 6, "trayCount": 3}));

    let (_, robot) = app.call("GET", "/api/robot", None).await;
    assert_eq!(robot["hasServed"], true);

    tasks.shutdown(Duration::from_secs(1)).await;
    assert_eq!(app.state.synchronizer.session_count(), 0);
}

#[tokio::test]
async fn test_order_views_and_edits() {
    let app = TestApp::new();
    let user = app.signup("Isha", "9855566677").await;
    let paneer = app.product("Paneer", 300.0, 180.0).await;
    let order = app.order(user, paneer, "9").await;
    let id = order["id"].as_i64().unwrap();

    let (status, views) = app.call("GET", "/api/orders?status=Pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(views[0]["userName"], "Isha Guest");
    assert_eq!(views[0]["items"][0]["productName"], "Paneer");

    let (status, outcome) = app
        .call(
            "PUT",
            &format!("/api/orders/{id}/items"),
            Some(json!({"items": [{"fullPortionQty": 2, "halfPortionQty": 1}]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "updated");

    app.call("POST", &format!("/api/orders/{id}/complete"), None).await;
    let (status, body) = app
        .call("POST", &format!("/api/orders/{id}/complete"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4003);

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/orders/{id}/items"),
            Some(json!({"items": [{"fullPortionQty": 0, "halfPortionQty": 0}]})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, completed) = app.call("GET", "/api/orders?status=Completed", None).await;
    assert_eq!(completed.as_array().unwrap().len(), 1);
    let (_, mine) = app.call("GET", &format!("/api/orders/user/{user}"), None).await;
    assert_eq!(mine[0]["status"], "Completed");
}

#[tokio::test]
async fn test_robot_panel() {
    let app = TestApp::new();

    let (status, robot) = app
        .call("PUT", "/api/robot", Some(json!({"battery": 12, "emergency": true})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(robot["lowBattery"], true);
    assert_eq!(robot["emergency"], true);

    let (status, _) = app
        .call("PUT", "/api/robot", Some(json!({"battery": 140})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "PUT",
            "/api/robot/ultrasonic",
            Some(json!({"left": "30", "center": "-1", "right": "40"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 7402);

    let (status, robot) = app
        .call(
            "PUT",
            "/api/robot/ultrasonic",
            Some(json!({"left": "30", "center": "12", "right": "40"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(robot["ultrasonic"]["center"], 12);
}

/// Next `trays` event payload on an SSE body, skipping keep-alive comments
async fn next_tray_event(body: &mut Body) -> Value {
    loop {
        let frame = body
            .frame()
            .await
            .expect("stream ended")
            .expect("stream error");
        let Ok(data) = frame.into_data() else {
            continue;
        };
        let text = String::from_utf8(data.to_vec()).unwrap();
        if let Some(json) = text.lines().find_map(|line| line.strip_prefix("data:")) {
            return serde_json::from_str(json.trim()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_tray_stream_holds_one_session_per_connection() {
    let app = TestApp::new();
    let (status, _) = app
        .call(
            "PUT",
            "/api/trays",
            Some(json!({"tray1": "4", "tray2": "0", "tray3": "9"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state.synchronizer.session_count(), 0);

    let request = Request::builder()
        .uri("/api/trays/stream")
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    assert_eq!(app.state.synchronizer.session_count(), 1);

    let mut body = response.into_body();
    let first = tokio::time::timeout(Duration::from_secs(5), next_tray_event(&mut body))
        .await
        .expect("no initial event");
    assert_eq!(
        first,
        json!({"tray1": 4, "tray2": 0, "tray3": 9, "trayCount": 2, "loading": false})
    );

    // later writes reach the open connection
    app.call(
        "PUT",
        "/api/trays",
        Some(json!({"tray1": "0", "tray2": "0", "tray3": "0"})),
    )
    .await;
    let emptied = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let view = next_tray_event(&mut body).await;
            if view["tray1"] == 0 && view["tray3"] == 0 && view["trayCount"] == 0 {
                return view;
            }
        }
    })
    .await
    .expect("tray change not streamed");
    assert_eq!(emptied["loading"], false);

    // disconnect closes the session
    drop(body);
    assert_eq!(app.state.synchronizer.session_count(), 0);
}

#[tokio::test]
async fn test_delete_product_keeps_cart_line_as_placeholder() {
    let app = TestApp::new();
    let user = app.signup("Asha", "9811111111").await;
    let dal = app.product("Dal Makhani", 220.0, 130.0).await;
    let (status, _) = app
        .call(
            "POST",
            &format!("/api/cart/{user}"),
            Some(json!({"productId": dal, "halfPortionQty": 2})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, deleted) = app.call("DELETE", &format!("/api/products/{dal}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!(true));

    let (status, _) = app.call("GET", &format!("/api/products/{dal}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.call("DELETE", &format!("/api/products/{dal}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);

    let (_, cart) = app.call("GET", &format!("/api/cart/{user}"), None).await;
    assert_eq!(cart[0]["productName"], "Unknown Product");
    assert_eq!(cart[0]["halfPortionQty"], 2);
}
