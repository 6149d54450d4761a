use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

/// 매매 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TradeKind {
    /// 매수 체결
    Entry,
    /// 매도 체결
    Exit,
}

impl TradeKind {
    /// 화면 표기
    pub fn label(&self) -> &'static str {
        match self {
            TradeKind::Entry => "매수",
            TradeKind::Exit => "매도",
        }
    }
}

impl Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeKind::Entry => write!(f, "BUY"),
            TradeKind::Exit => write!(f, "SELL"),
        }
    }
}

impl FromStr for TradeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(TradeKind::Entry),
            "SELL" => Ok(TradeKind::Exit),
            _ => Err(format!("Invalid TradeKind: {}", s)),
        }
    }
}

/// 매매 이벤트 식별자
///
/// 서버 ID 가 있으면 그것을 쓰고, 없으면 `시간_종목명_수량` 조합으로 대신한다.
/// 조합 ID 는 세 값이 모두 같은 서로 다른 체결을 하나로 합쳐버리는 한계가 있다.
/// 서버가 ID 를 항상 채워주기 전까지는 그대로 둔다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TradeId {
    Server(u64),
    Composite(String),
}

impl TradeId {
    /// high-water mark 계산용 순번. 조합 ID 는 순번이 없으므로 0.
    pub fn sequence(&self) -> u64 {
        match self {
            TradeId::Server(id) => *id,
            TradeId::Composite(_) => 0,
        }
    }
}

impl Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeId::Server(id) => write!(f, "{}", id),
            TradeId::Composite(key) => write!(f, "{}", key),
        }
    }
}

/// 매도 전용 정보
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitDetail {
    /// 매도 사유 (자유 텍스트)
    pub reason: String,
    /// 매도 수익률 (%)
    pub yield_percent: f64,
}

/// 매매 이벤트 (매수/매도 체결 1건)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    pub id: TradeId,
    pub kind: TradeKind,
    /// 체결 시각 원문 ("YYYY-MM-DD HH:MM:SS", 비어 있을 수 있음)
    pub timestamp: String,
    pub name: String,
    pub code: Option<String>,
    pub quantity: f64,
    pub price: f64,
    /// 매도일 때만 Some
    pub exit: Option<ExitDetail>,
}

impl TradeEvent {
    /// 정렬용 시각 (epoch millis). 해석 불가/빈 값은 0 (가장 오래된 것으로 취급).
    pub fn sort_millis(&self) -> i64 {
        parse_timestamp_millis(&self.timestamp).unwrap_or(0)
    }

    /// "HH:MM:SS" 부분. 공백이 없으면 원문 그대로.
    pub fn time_of_day(&self) -> &str {
        match self.timestamp.split_once(' ') {
            Some((_, time)) => time,
            None => &self.timestamp,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.exit.as_ref().map(|e| e.reason.as_str())
    }

    pub fn yield_percent(&self) -> Option<f64> {
        self.exit.as_ref().map(|e| e.yield_percent)
    }

    /// 체결 금액 (단가 × 수량, 원 단위 내림)
    pub fn notional(&self) -> i64 {
        (self.price * self.quantity).floor() as i64
    }
}

fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}
