use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

pub mod lenient;

/// 봇 설정 (키-값, 내용은 해석하지 않음)
pub type Settings = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiMode {
    /// 내부 Mock 서버
    Mock,
    /// 모의투자 계좌
    Paper,
    /// 실전투자 계좌
    Real,
}

impl Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiMode::Mock => write!(f, "MOCK"),
            ApiMode::Paper => write!(f, "PAPER"),
            ApiMode::Real => write!(f, "REAL"),
        }
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MOCK" => Ok(ApiMode::Mock),
            "PAPER" => Ok(ApiMode::Paper),
            "REAL" => Ok(ApiMode::Real),
            _ => Err(format!("Invalid ApiMode: {}", s)),
        }
    }
}

/// 상태 메시지 (WebSocket push 와 /api/status 응답이 같은 모양)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(default, deserialize_with = "lenient::object")]
    pub summary: Option<Summary>,
    #[serde(default, deserialize_with = "lenient::objects")]
    pub holdings: Vec<HoldingRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// 총 평가자산
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_asset: Option<f64>,
    /// 총 매입금액
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_buy: Option<f64>,
    /// 예수금
    #[serde(default, deserialize_with = "lenient::number")]
    pub deposit: Option<f64>,
    /// 총 평가손익
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_pl: Option<f64>,
    /// 총 수익률 (%)
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_yield: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub api_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_paper: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub bot_running: Option<bool>,
}

impl Summary {
    /// 계좌 모드 판별: api_mode 가 MOCK 이면 Mock, 아니면 is_paper 가 명시적으로 false 일 때만 Real
    pub fn account_mode(&self) -> ApiMode {
        let is_mock = self
            .api_mode
            .as_deref()
            .map(|m| m.eq_ignore_ascii_case("MOCK"))
            .unwrap_or(false);

        if is_mock {
            ApiMode::Mock
        } else if self.is_paper != Some(false) {
            ApiMode::Paper
        } else {
            ApiMode::Real
        }
    }

    pub fn running(&self) -> bool {
        self.bot_running.unwrap_or(false)
    }
}

/// 보유 종목 레코드 (서버 필드명이 여러 버전으로 섞여 온다)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub stk_nm: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    /// 수익률
    #[serde(default, deserialize_with = "lenient::number")]
    pub pl_rt: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rate: Option<f64>,
    /// 평가손익
    #[serde(default, deserialize_with = "lenient::number")]
    pub pl_amt: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub eval_pnl: Option<f64>,
    /// 보유수량
    #[serde(default, deserialize_with = "lenient::number")]
    pub rmnd_qty: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub qty: Option<f64>,
    /// 현재가
    #[serde(default, deserialize_with = "lenient::number")]
    pub cur_prc: Option<f64>,
    /// 보유시간 (예: "12분")
    #[serde(default, deserialize_with = "lenient::text")]
    pub hold_time: Option<String>,
    /// 물타기/불타기 단계
    #[serde(default, deserialize_with = "lenient::text")]
    pub watering_step: Option<String>,
    /// 평균단가
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_prc: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pchs_avg_pric: Option<f64>,
}

/// 매매 로그 레코드 (매수/매도 공통)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// 서버 DB ID (없을 수 있음)
    #[serde(default, deserialize_with = "lenient::number")]
    pub id: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub stk_nm: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub stk_cd: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub qty: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amt: Option<f64>,
    /// 매도 수익률 (%)
    #[serde(default, rename = "yield", deserialize_with = "lenient::number")]
    pub yield_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub profit_rate: Option<f64>,
    /// 매도 사유 (매도만)
    #[serde(default, deserialize_with = "lenient::text")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub mode: Option<String>,
}

/// /api/trading-log 응답
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeLogResponse {
    #[serde(default, deserialize_with = "lenient::object_list")]
    pub buys: Option<Vec<TradeRecord>>,
    #[serde(default, deserialize_with = "lenient::object_list")]
    pub sells: Option<Vec<TradeRecord>>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub stats: Option<AggregateStats>,
    /// 서버측 조회 실패 시에만 채워짐
    #[serde(default, deserialize_with = "lenient::text")]
    pub error: Option<String>,
}

/// 서버가 계산한 오늘의 누적 매매 통계. 클라이언트에서 다시 계산하지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// 매도 횟수
    #[serde(default, deserialize_with = "lenient::count")]
    pub total: u64,
    /// 수익 매도 횟수
    #[serde(default, deserialize_with = "lenient::count")]
    pub wins: u64,
    /// 총 실현손익
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub total_profit: f64,
    /// 평균 수익률 (%)
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub avg_profit: f64,
}

impl AggregateStats {
    /// 승률 (%)
    pub fn win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64 * 100.0
        }
    }
}

/// 명령/삭제/설정 저장 응답 공통
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub message: Option<String>,
}

impl CommandReply {
    pub fn succeeded(&self) -> bool {
        self.success.unwrap_or(false)
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("rejected by server: {0}")]
    Rejected(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("other error: {0}")]
    Other(String),
}
