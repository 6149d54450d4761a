use std::collections::VecDeque;
use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;
use tracing::{error, info, warn};

/// 화면 로그 최대 보관 개수
pub const ACTIVITY_CAPACITY: usize = 100;
/// 알림(토스트) 표시 시간
pub const NOTICE_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityLevel::Info => write!(f, "info"),
            ActivityLevel::Success => write!(f, "success"),
            ActivityLevel::Warning => write!(f, "warning"),
            ActivityLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub level: ActivityLevel,
    pub message: String,
}

impl Display for ActivityEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: ActivityLevel,
    pub message: String,
    pub expires_at: Instant,
}

/// 운영자용 휘발성 로그
/// 최신순으로 쌓고 100개를 넘으면 가장 오래된 것부터 버린다. 디스크에는 남기지 않는다.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    notices: VecDeque<Notice>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 로그 기록 + 알림 표시
    pub fn record(&mut self, level: ActivityLevel, message: impl Into<String>, now: Instant) {
        let message = message.into();

        match level {
            ActivityLevel::Error => error!("{}", message),
            ActivityLevel::Warning => warn!("{}", message),
            _ => info!("{}", message),
        }

        self.entries.push_front(ActivityEntry {
            at: Local::now(),
            level,
            message: message.clone(),
        });
        self.entries.truncate(ACTIVITY_CAPACITY);

        self.notify(level, message, now);
    }

    /// 로그 없이 알림만 표시
    pub fn notify(&mut self, level: ActivityLevel, message: impl Into<String>, now: Instant) {
        self.notices.push_front(Notice {
            level,
            message: message.into(),
            expires_at: now + NOTICE_LIFETIME,
        });
    }

    pub fn clear(&mut self, now: Instant) {
        self.entries.clear();
        self.record(ActivityLevel::Success, "로그 초기화됨", now);
    }

    /// 최신순
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 만료되지 않은 알림 (최신순)
    pub fn active_notices(&mut self, now: Instant) -> Vec<Notice> {
        self.notices.retain(|n| n.expires_at > now);
        self.notices.iter().cloned().collect()
    }
}
