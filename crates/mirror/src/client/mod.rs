pub mod http;

use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use interface::{ClientError, CommandReply, Settings, StatusMessage, TradeLogResponse};

pub use http::HttpDashboardClient;

/// 봇 제어 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Stop,
    /// 일일 리포트 전송
    Report,
    /// 보유 종목 전량 매도
    SellAll,
    Status,
    /// 봇 상태 초기화
    Reset,
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
            Command::Report => write!(f, "report"),
            Command::SellAll => write!(f, "sellall"),
            Command::Status => write!(f, "status"),
            Command::Reset => write!(f, "reset"),
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "report" => Ok(Command::Report),
            "sellall" => Ok(Command::SellAll),
            "status" => Ok(Command::Status),
            "reset" => Ok(Command::Reset),
            _ => Err(format!("Invalid Command: {}", s)),
        }
    }
}

/// 조회/설정/로그 삭제 엔드포인트
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_status(&self) -> Result<StatusMessage, ClientError>;

    /// since_id = 0 이면 전체
    async fn fetch_trade_log(&self, since_id: u64) -> Result<TradeLogResponse, ClientError>;

    async fn fetch_settings(&self) -> Result<Settings, ClientError>;

    async fn save_settings(&self, settings: &Settings) -> Result<CommandReply, ClientError>;

    /// 매수 기록 전체 삭제
    async fn clear_entries(&self) -> Result<CommandReply, ClientError>;

    /// 매도 기록 전체 삭제
    async fn clear_exits(&self) -> Result<CommandReply, ClientError>;
}

/// 명령 전송. 재시도하지 않으며, 서버가 거절하면 `ClientError::Rejected`.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    async fn send_command(&self, command: Command) -> Result<CommandReply, ClientError>;
}

/// `success` 가 true 가 아니면 서버 오류 문구로 거절 처리
pub fn ensure_success(reply: CommandReply) -> Result<CommandReply, ClientError> {
    if reply.succeeded() {
        Ok(reply)
    } else {
        Err(ClientError::Rejected(
            reply
                .error
                .clone()
                .unwrap_or_else(|| "알 수 없는 오류".to_string()),
        ))
    }
}
