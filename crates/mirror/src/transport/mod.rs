use std::time::Duration;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use interface::StatusMessage;

use crate::config::Config;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("event receiver dropped")]
    Closed,
}

#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Connected,
    /// 연결이 끊기거나 연결에 실패함
    Disconnected,
    Snapshot(StatusMessage),
    /// 재연결 한도 소진. 이후로는 아무 이벤트도 오지 않는다.
    GaveUp { attempts: u32 },
}

/// 고정 간격, 횟수 제한 재연결
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    delay: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
            attempts: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.reconnect_delay, config.max_reconnect_attempts)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 연결 성공 시 시도 횟수 초기화
    pub fn on_connected(&mut self) {
        self.attempts = 0;
    }

    /// 다음 재연결까지 기다릴 시간. 한도를 넘으면 None.
    pub fn next_attempt(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.delay)
    }
}

/// 서버 상태 push 채널 (WebSocket)
pub struct StatusChannel {
    url: String,
    policy: ReconnectPolicy,
}

impl StatusChannel {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            url: url.into(),
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ws_url.clone(), ReconnectPolicy::from_config(config))
    }

    pub fn spawn(self, events: mpsc::Sender<ChannelEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    pub async fn run(mut self, events: mpsc::Sender<ChannelEvent>) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    info!("WebSocket 연결 성공: {}", self.url);
                    self.policy.on_connected();
                    if events.send(ChannelEvent::Connected).await.is_err() {
                        return;
                    }
                    if let Err(ChannelError::Closed) = pump(stream, &events).await {
                        return;
                    }
                    warn!("WebSocket 연결이 닫혔습니다: {}", self.url);
                }
                Err(e) => {
                    warn!("WebSocket 연결 실패: {} ({})", self.url, e);
                }
            }

            if events.send(ChannelEvent::Disconnected).await.is_err() {
                return;
            }

            match self.policy.next_attempt() {
                Some(delay) => {
                    info!(
                        "재연결 시도 {}/{} ({:?} 후)",
                        self.policy.attempts(),
                        self.policy.max_attempts(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(
                        "재연결 {}회 실패, 자동 재연결을 중단합니다",
                        self.policy.max_attempts()
                    );
                    let _ = events
                        .send(ChannelEvent::GaveUp {
                            attempts: self.policy.attempts(),
                        })
                        .await;
                    return;
                }
            }
        }
    }
}

/// 연결이 끊길 때까지 메시지를 전달한다. 수신측이 사라졌으면 `Closed`.
async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: &mpsc::Sender<ChannelEvent>,
) -> Result<(), ChannelError> {
    let (_write, mut read) = stream.split();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => match decode_snapshot(&text) {
                Ok(snapshot) => {
                    events
                        .send(ChannelEvent::Snapshot(snapshot))
                        .await
                        .map_err(|_| ChannelError::Closed)?;
                }
                Err(e) => {
                    warn!("상태 메시지 처리 오류: {:?}", e);
                }
            },
            Ok(Message::Close(_)) => {
                debug!("서버가 close 프레임을 보냈습니다");
                break;
            }
            Err(e) => {
                warn!("WebSocket 메시지 수신 오류: {:?}", e);
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

pub fn decode_snapshot(text: &str) -> Result<StatusMessage, ChannelError> {
    Ok(serde_json::from_str(text)?)
}
