use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

use mirror::transport::{ChannelEvent, ReconnectPolicy, StatusChannel};

const WAIT: Duration = Duration::from_secs(5);

async fn ws_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(push_then_close)
}

async fn push_then_close(mut socket: WebSocket) {
    // 깨진 프레임은 건너뛰고 다음 스냅샷은 받아야 한다
    let _ = socket.send(Message::Text("not json".to_string())).await;
    let _ = socket
        .send(Message::Text(
            r#"{"summary": {"total_asset": 1000, "bot_running": true}, "holdings": []}"#.to_string(),
        ))
        .await;
    let _ = socket.send(Message::Close(None)).await;
}

async fn next_event(rx: &mut mpsc::Receiver<ChannelEvent>) -> ChannelEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("channel event timed out")
        .expect("channel closed")
}

#[tokio::test]
async fn test_snapshot_survives_malformed_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/ws", get(ws_handler));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (tx, mut rx) = mpsc::channel(16);
    let channel = StatusChannel::new(
        format!("ws://{}/ws", addr),
        ReconnectPolicy::new(Duration::from_millis(50), 3),
    );
    let handle = channel.spawn(tx);

    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Connected));
    match next_event(&mut rx).await {
        ChannelEvent::Snapshot(message) => {
            let summary = message.summary.unwrap();
            assert_eq!(summary.total_asset, Some(1000.0));
            assert!(summary.running());
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Disconnected));

    // 연결에 성공했으므로 시도 횟수가 초기화되고 다시 붙는다
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Connected));

    handle.abort();
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, mut rx) = mpsc::channel(16);
    let channel = StatusChannel::new(
        format!("ws://{}/ws", addr),
        ReconnectPolicy::new(Duration::from_millis(20), 3),
    );
    let handle = channel.spawn(tx);

    // 최초 1회 + 재시도 3회
    for _ in 0..4 {
        assert!(matches!(next_event(&mut rx).await, ChannelEvent::Disconnected));
    }
    match next_event(&mut rx).await {
        ChannelEvent::GaveUp { attempts } => assert_eq!(attempts, 3),
        other => panic!("unexpected event: {:?}", other),
    }

    // 포기한 뒤에는 채널이 닫힌다
    assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
    handle.await.unwrap();
}
