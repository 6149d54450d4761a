use std::fmt::Display;
use std::str::FromStr;

use super::{ExclusionSet, LogStore, TradeEvent};

/// 매매 로그 화면에 보여주는 최대 건수
pub const VIEW_LIMIT: usize = 8;
/// 최근 활동 건수
pub const RECENT_LIMIT: usize = 5;

/// 대소문자 무시. 단순 "cut" 은 손절(loss cut) 사유와 겹쳐서 넣지 않는다.
const TIME_CUT_TOKENS: [&str; 5] = ["timecut", "time_cut", "time cut", "시간", "지루"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    All,
    Entries,
    Exits,
    TimeCut,
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::All => write!(f, "all"),
            ViewMode::Entries => write!(f, "buy"),
            ViewMode::Exits => write!(f, "sell"),
            ViewMode::TimeCut => write!(f, "timecut"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ViewMode::All),
            "buy" => Ok(ViewMode::Entries),
            "sell" => Ok(ViewMode::Exits),
            "timecut" => Ok(ViewMode::TimeCut),
            _ => Err(format!("Invalid ViewMode: {}", s)),
        }
    }
}

/// 매도 사유가 시간 기반 청산인지
pub fn is_time_cut(reason: &str) -> bool {
    let lowered = reason.to_lowercase();
    TIME_CUT_TOKENS.iter().any(|token| lowered.contains(token))
}

/// 필터 → 시각 내림차순 정렬 → 상위 8건
/// 시각이 같으면 저장 순서를 유지한다.
pub fn build_view<'a>(
    store: &'a LogStore,
    mode: ViewMode,
    exclusions: &ExclusionSet,
) -> Vec<&'a TradeEvent> {
    let mut events: Vec<&TradeEvent> = match mode {
        ViewMode::All => store.events().collect(),
        ViewMode::Entries => store.entries().iter().collect(),
        ViewMode::Exits => store.exits().iter().collect(),
        ViewMode::TimeCut => store
            .exits()
            .iter()
            .filter(|e| e.reason().map(is_time_cut).unwrap_or(false))
            .filter(|e| !exclusions.contains(&e.id))
            .collect(),
    };

    events.sort_by_key(|e| std::cmp::Reverse(e.sort_millis()));
    events.truncate(VIEW_LIMIT);
    events
}

/// 매수/매도 통틀어 최근 5건 (시각 문자열 사전순 내림차순)
pub fn recent_activity(store: &LogStore) -> Vec<&TradeEvent> {
    let mut events: Vec<&TradeEvent> = store.events().collect();
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(RECENT_LIMIT);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ExitDetail, MergeMode, TradeDelta, TradeId, TradeKind};

    fn event(id: u64, kind: TradeKind, timestamp: &str, reason: Option<&str>) -> TradeEvent {
        TradeEvent {
            id: TradeId::Server(id),
            kind,
            timestamp: timestamp.to_string(),
            name: format!("종목{}", id),
            code: None,
            quantity: 1.0,
            price: 100.0,
            exit: reason.map(|r| ExitDetail {
                reason: r.to_string(),
                yield_percent: 0.5,
            }),
        }
    }

    fn store_with(entries: Vec<TradeEvent>, exits: Vec<TradeEvent>) -> LogStore {
        let mut store = LogStore::new();
        store.apply(
            MergeMode::FullResync,
            TradeDelta {
                entries,
                exits,
                stats: None,
            },
        );
        store
    }

    #[test]
    fn test_time_cut_tokens() {
        assert!(is_time_cut("TimeCut(90분)"));
        assert!(is_time_cut("TIME_CUT"));
        assert!(is_time_cut("보유 시간 초과"));
        assert!(is_time_cut("지루함 청산"));
        assert!(!is_time_cut("익절"));
        assert!(!is_time_cut("StopLoss Cut"));
    }

    #[test]
    fn test_view_sorts_descending_and_caps() {
        let entries = (1..=10)
            .map(|i| {
                event(
                    i,
                    TradeKind::Entry,
                    &format!("2025-12-21 09:{:02}:00", i),
                    None,
                )
            })
            .collect();
        let exits = vec![event(11, TradeKind::Exit, "", Some("익절"))];
        let store = store_with(entries, exits);

        let view = build_view(&store, ViewMode::All, &ExclusionSet::new());
        assert_eq!(view.len(), VIEW_LIMIT);
        assert_eq!(view[0].id, TradeId::Server(10));
        assert_eq!(view[7].id, TradeId::Server(3));

        // 시각이 없는 매도는 가장 오래된 것으로 취급
        let exits = build_view(&store, ViewMode::Exits, &ExclusionSet::new());
        assert_eq!(exits.len(), 1);
        let entries = build_view(&store, ViewMode::Entries, &ExclusionSet::new());
        assert!(entries.iter().all(|e| e.kind == TradeKind::Entry));
    }

    #[test]
    fn test_time_cut_view_respects_exclusions() {
        let exits = vec![
            event(1, TradeKind::Exit, "2025-12-21 10:00:00", Some("TimeCut")),
            event(2, TradeKind::Exit, "2025-12-21 10:01:00", Some("손절")),
            event(3, TradeKind::Exit, "2025-12-21 10:02:00", Some("시간제한")),
        ];
        let store = store_with(vec![], exits);
        let mut exclusions = ExclusionSet::new();

        let view = build_view(&store, ViewMode::TimeCut, &exclusions);
        assert_eq!(
            view.iter().map(|e| e.id.sequence()).collect::<Vec<_>>(),
            vec![3, 1]
        );

        exclusions.exclude(TradeId::Server(3));
        let view = build_view(&store, ViewMode::TimeCut, &exclusions);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, TradeId::Server(1));
    }

    #[test]
    fn test_recent_activity_across_streams() {
        let entries = (1..=4)
            .map(|i| {
                event(
                    i,
                    TradeKind::Entry,
                    &format!("2025-12-21 09:0{}:00", i),
                    None,
                )
            })
            .collect();
        let exits = (5..=7)
            .map(|i| {
                event(
                    i,
                    TradeKind::Exit,
                    &format!("2025-12-21 09:0{}:00", i),
                    Some("익절"),
                )
            })
            .collect();
        let store = store_with(entries, exits);

        let recent = recent_activity(&store);
        assert_eq!(
            recent.iter().map(|e| e.id.sequence()).collect::<Vec<_>>(),
            vec![7, 6, 5, 4, 3]
        );
    }

    #[test]
    fn test_view_mode_text() {
        assert_eq!("timecut".parse::<ViewMode>().unwrap(), ViewMode::TimeCut);
        assert_eq!(ViewMode::Entries.to_string(), "buy");
        assert!("hold".parse::<ViewMode>().is_err());
    }
}
