use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use interface::ClientError;
use mirror::client::{Command, CommandGateway, DashboardApi, HttpDashboardClient};

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn trading_log(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    // 캐시 회피 파라미터가 빠지면 이상한 응답을 준다
    if !query.contains_key("t") {
        return Json(json!({ "error": "missing cache buster" }));
    }
    match query.get("since_id").map(String::as_str) {
        Some("0") => Json(json!({
            "buys": [
                {"id": 2, "time": "2025-12-21 09:01:00", "name": "LG", "qty": 3, "price": 1000.5},
                {"id": 1, "time": "2025-12-21 09:00:00", "name": "삼성전자", "qty": 10, "price": 70000}
            ],
            "sells": [
                {"id": 3, "time": "2025-12-21 10:00:00", "name": "LG", "qty": 3, "price": 1100, "yield": 9.9, "reason": "익절"}
            ],
            "stats": {"total": 1, "wins": 1, "total_profit": 298.5, "avg_profit": 9.9}
        })),
        _ => Json(json!({ "buys": [], "sells": [] })),
    }
}

async fn command(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match body["command"].as_str() {
        Some("start") => (StatusCode::OK, Json(json!({"success": true, "message": "started"}))),
        Some("stop") => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, Json(json!({"success": true})))
        }
        Some("sellall") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "보유 종목 없음"})),
        ),
        _ => (StatusCode::OK, Json(json!({"success": false}))),
    }
}

fn fake_server() -> Router {
    Router::new()
        .route(
            "/api/status",
            get(|| async {
                Json(json!({
                    "summary": {"total_asset": 1250000, "bot_running": true, "api_mode": "PAPER"},
                    "holdings": [{"stk_nm": "카카오", "pl_rt": -1.2, "rmnd_qty": 4}]
                }))
            }),
        )
        .route("/api/trading-log", get(trading_log))
        .route("/api/command", post(command))
        .route(
            "/api/settings",
            get(|| async { Json(json!({"max_stocks": 3, "strategy": "safe"})) })
                .post(|Json(body): Json<Value>| async move {
                    if body["max_stocks"] == json!(5) {
                        Json(json!({"success": true}))
                    } else {
                        Json(json!({"success": false, "error": "unexpected body"}))
                    }
                }),
        )
        .route("/api/buy-log", delete(|| async { Json(json!({"success": true})) }))
        .route(
            "/api/sell-log",
            delete(|| async { (StatusCode::LOCKED, Json(json!({"error": "locked"}))) }),
        )
}

#[tokio::test]
async fn test_fetch_status_and_trade_log() {
    let base = serve(fake_server()).await;
    let client = HttpDashboardClient::new(base, Duration::from_secs(5));

    let status = client.fetch_status().await.unwrap();
    let summary = status.summary.unwrap();
    assert_eq!(summary.total_asset, Some(1250000.0));
    assert!(summary.running());
    assert_eq!(status.holdings.len(), 1);

    let full = client.fetch_trade_log(0).await.unwrap();
    assert_eq!(full.buys.as_ref().map(Vec::len), Some(2));
    assert_eq!(full.sells.as_ref().map(Vec::len), Some(1));
    assert_eq!(full.stats.as_ref().map(|s| s.wins), Some(1));

    let incremental = client.fetch_trade_log(3).await.unwrap();
    assert_eq!(incremental.buys.map(|b| b.len()), Some(0));
}

#[tokio::test]
async fn test_trade_log_error_field_is_rejected() {
    let app = Router::new().route(
        "/api/trading-log",
        get(|| async { Json(json!({"error": "db down"})) }),
    );
    let base = serve(app).await;
    let client = HttpDashboardClient::new(base, Duration::from_secs(5));

    match client.fetch_trade_log(0).await {
        Err(ClientError::Rejected(message)) => assert_eq!(message, "db down"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_trade_log_without_sequences_is_decode_error() {
    let app = Router::new().route(
        "/api/trading-log",
        get(|| async { Json(json!({"buys": []})) }),
    );
    let base = serve(app).await;
    let client = HttpDashboardClient::new(base, Duration::from_secs(5));

    assert!(matches!(
        client.fetch_trade_log(0).await,
        Err(ClientError::Decode(_))
    ));
}

#[tokio::test]
async fn test_commands() {
    let base = serve(fake_server()).await;
    let client = HttpDashboardClient::new(base, Duration::from_millis(300));

    let reply = client.send_command(Command::Start).await.unwrap();
    assert_eq!(reply.message.as_deref(), Some("started"));

    match client.send_command(Command::SellAll).await {
        Err(ClientError::Rejected(message)) => assert_eq!(message, "보유 종목 없음"),
        other => panic!("unexpected result: {:?}", other),
    }

    match client.send_command(Command::Report).await {
        Err(ClientError::Rejected(message)) => assert_eq!(message, "알 수 없는 오류"),
        other => panic!("unexpected result: {:?}", other),
    }

    match client.send_command(Command::Stop).await {
        Err(ClientError::Timeout(after)) => assert_eq!(after, Duration::from_millis(300)),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_settings_and_log_clearing() {
    let base = serve(fake_server()).await;
    let client = HttpDashboardClient::new(base, Duration::from_secs(5));

    let mut settings = client.fetch_settings().await.unwrap();
    assert_eq!(settings.get("strategy"), Some(&json!("safe")));

    settings.insert("max_stocks".to_string(), json!(5));
    assert!(client.save_settings(&settings).await.unwrap().succeeded());

    assert!(client.clear_entries().await.is_ok());
    match client.clear_exits().await {
        Err(ClientError::Rejected(message)) => assert_eq!(message, "locked"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpDashboardClient::new(format!("http://{}", addr), Duration::from_secs(1));
    assert!(matches!(client.fetch_status().await, Err(ClientError::Http(_))));
}
