use std::collections::HashSet;

use super::{is_time_cut, LogStore, TradeId};

/// 운영자가 타임컷 화면에서 숨긴 항목
///
/// 세션 메모리에만 있고 직렬화 경로가 없다. 재연결이나 전체 재동기화로는 지워지지 않고
/// `restore_all` 을 부르거나 프로세스가 끝나야 비워진다.
#[derive(Debug, Default)]
pub struct ExclusionSet {
    hidden: HashSet<TradeId>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새로 숨겼으면 true
    pub fn exclude(&mut self, id: TradeId) -> bool {
        self.hidden.insert(id)
    }

    /// 현재 로그의 타임컷 매도를 모두 숨기고, 새로 숨긴 개수를 돌려준다
    pub fn exclude_time_cuts(&mut self, store: &LogStore) -> usize {
        store
            .exits()
            .iter()
            .filter(|e| e.reason().map(is_time_cut).unwrap_or(false))
            .filter(|e| self.hidden.insert(e.id.clone()))
            .count()
    }

    /// 숨김 해제. 해제된 개수를 돌려준다.
    pub fn restore_all(&mut self) -> usize {
        let count = self.hidden.len();
        self.hidden.clear();
        count
    }

    pub fn contains(&self, id: &TradeId) -> bool {
        self.hidden.contains(id)
    }

    pub fn len(&self) -> usize {
        self.hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ExitDetail, MergeMode, TradeDelta, TradeEvent, TradeKind};

    fn exit(id: u64, reason: &str) -> TradeEvent {
        TradeEvent {
            id: TradeId::Server(id),
            kind: TradeKind::Exit,
            timestamp: "2025-12-21 10:00:00".to_string(),
            name: "LG".to_string(),
            code: None,
            quantity: 1.0,
            price: 100.0,
            exit: Some(ExitDetail {
                reason: reason.to_string(),
                yield_percent: 0.0,
            }),
        }
    }

    #[test]
    fn test_bulk_exclusion_counts_only_new() {
        let mut store = LogStore::new();
        store.apply(
            MergeMode::FullResync,
            TradeDelta {
                exits: vec![
                    exit(1, "TimeCut(120분)"),
                    exit(2, "익절"),
                    exit(3, "시간제한 매도"),
                ],
                ..Default::default()
            },
        );

        let mut set = ExclusionSet::new();
        assert!(set.exclude(TradeId::Server(1)));
        assert_eq!(set.exclude_time_cuts(&store), 1);
        assert_eq!(set.exclude_time_cuts(&store), 0);
        assert_eq!(set.len(), 2);
        assert!(!set.contains(&TradeId::Server(2)));

        assert_eq!(set.restore_all(), 2);
        assert!(set.is_empty());
    }
}
