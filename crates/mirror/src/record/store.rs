use std::collections::HashSet;

use interface::AggregateStats;
use tracing::debug;

use super::{TradeEvent, TradeId};

/// 한 번의 조회 결과 (매수/매도 묶음 + 서버 통계)
#[derive(Debug, Clone, Default)]
pub struct TradeDelta {
    pub entries: Vec<TradeEvent>,
    pub exits: Vec<TradeEvent>,
    pub stats: Option<AggregateStats>,
}

impl TradeDelta {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.exits.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// since_id = 0 으로 받은 전체 데이터로 통째로 교체
    FullResync,
    /// since_id = high-water mark 로 받은 신규분을 앞에 붙임
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// 새로 들어온 매수 건수 (중복 제거 후)
    pub new_entries: usize,
    /// 새로 들어온 매도 건수 (중복 제거 후)
    pub new_exits: usize,
    pub high_water_mark: u64,
    pub stats_replaced: bool,
}

/// 매매 로그 로컬 미러
///
/// - 매수/매도 두 시퀀스는 도착 순서를 유지하고, 각 시퀀스 안에서 ID 중복이 없다.
/// - `high_water_mark` 는 증분 병합에서 절대 줄어들지 않는다.
/// - 병합은 이미 완성된 `TradeDelta` 로만 하므로 실패한 조회가 상태를 반쯤 바꾸는 일은 없다.
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    entries: Vec<TradeEvent>,
    exits: Vec<TradeEvent>,
    high_water_mark: u64,
    stats: Option<AggregateStats>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TradeEvent] {
        &self.entries
    }

    pub fn exits(&self) -> &[TradeEvent] {
        &self.exits
    }

    pub fn high_water_mark(&self) -> u64 {
        self.high_water_mark
    }

    pub fn stats(&self) -> Option<&AggregateStats> {
        self.stats.as_ref()
    }

    /// 매수 → 매도 순으로 전체 이벤트
    pub fn events(&self) -> impl Iterator<Item = &TradeEvent> {
        self.entries.iter().chain(self.exits.iter())
    }

    /// 다음 조회에 쓸 since_id
    pub fn next_since_id(&self, force: bool) -> u64 {
        if force {
            0
        } else {
            self.high_water_mark
        }
    }

    pub fn apply(&mut self, mode: MergeMode, delta: TradeDelta) -> MergeOutcome {
        let TradeDelta {
            entries,
            exits,
            stats,
        } = delta;

        let stats_replaced = stats.is_some();
        if let Some(stats) = stats {
            self.stats = Some(stats);
        }

        match mode {
            MergeMode::FullResync => {
                self.entries = dedup_by_identity(entries);
                self.exits = dedup_by_identity(exits);
                self.high_water_mark = max_sequence(self.events(), 0);

                debug!(
                    "full resync: entries={}, exits={}, mark={}",
                    self.entries.len(),
                    self.exits.len(),
                    self.high_water_mark
                );

                MergeOutcome {
                    new_entries: self.entries.len(),
                    new_exits: self.exits.len(),
                    high_water_mark: self.high_water_mark,
                    stats_replaced,
                }
            }
            MergeMode::Incremental => {
                if entries.is_empty() && exits.is_empty() {
                    return MergeOutcome {
                        high_water_mark: self.high_water_mark,
                        stats_replaced,
                        ..Default::default()
                    };
                }

                let before_entries = self.entries.len();
                let before_exits = self.exits.len();

                self.entries = prepend_and_dedup(entries, std::mem::take(&mut self.entries));
                self.exits = prepend_and_dedup(exits, std::mem::take(&mut self.exits));
                // 동시에 돌던 조회가 있었을 수 있으므로 합집합에서 다시 계산한다
                self.high_water_mark = max_sequence(self.events(), self.high_water_mark);

                debug!(
                    "incremental merge: +{} entries, +{} exits, mark={}",
                    self.entries.len() - before_entries,
                    self.exits.len() - before_exits,
                    self.high_water_mark
                );

                MergeOutcome {
                    new_entries: self.entries.len() - before_entries,
                    new_exits: self.exits.len() - before_exits,
                    high_water_mark: self.high_water_mark,
                    stats_replaced,
                }
            }
        }
    }

    /// 로그, mark, 통계를 모두 비운다 (설정 변경 등)
    pub fn reset(&mut self) {
        self.entries.clear();
        self.exits.clear();
        self.high_water_mark = 0;
        self.stats = None;
    }
}

fn prepend_and_dedup(fresh: Vec<TradeEvent>, existing: Vec<TradeEvent>) -> Vec<TradeEvent> {
    let mut merged = fresh;
    merged.extend(existing);
    dedup_by_identity(merged)
}

/// 먼저 나온 것을 남긴다
fn dedup_by_identity(events: Vec<TradeEvent>) -> Vec<TradeEvent> {
    let mut seen: HashSet<TradeId> = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect()
}

fn max_sequence<'a>(events: impl Iterator<Item = &'a TradeEvent>, floor: u64) -> u64 {
    events.map(|e| e.id.sequence()).fold(floor, u64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ExitDetail, TradeKind};

    fn entry(id: u64) -> TradeEvent {
        TradeEvent {
            id: TradeId::Server(id),
            kind: TradeKind::Entry,
            timestamp: format!("2025-12-21 09:00:{:02}", id % 60),
            name: format!("종목{}", id),
            code: None,
            quantity: 1.0,
            price: 1000.0,
            exit: None,
        }
    }

    fn exit(id: u64, reason: &str) -> TradeEvent {
        TradeEvent {
            kind: TradeKind::Exit,
            exit: Some(ExitDetail {
                reason: reason.to_string(),
                yield_percent: 1.0,
            }),
            ..entry(id)
        }
    }

    fn ids(events: &[TradeEvent]) -> Vec<u64> {
        events.iter().map(|e| e.id.sequence()).collect()
    }

    #[test]
    fn test_forced_resync_replaces_store() {
        let mut store = LogStore::new();
        store.apply(
            MergeMode::Incremental,
            TradeDelta {
                entries: vec![entry(30), entry(20)],
                exits: vec![exit(31, "익절")],
                stats: None,
            },
        );
        assert_eq!(store.high_water_mark(), 31);

        let outcome = store.apply(
            MergeMode::FullResync,
            TradeDelta {
                entries: vec![entry(5)],
                exits: vec![],
                stats: None,
            },
        );

        assert_eq!(ids(store.entries()), vec![5]);
        assert!(store.exits().is_empty());
        assert_eq!(store.high_water_mark(), 5);
        assert_eq!(outcome.high_water_mark, 5);
    }

    #[test]
    fn test_incremental_exit_raises_mark() {
        let mut store = LogStore::new();
        store.apply(
            MergeMode::FullResync,
            TradeDelta {
                entries: vec![entry(7), entry(5)],
                ..Default::default()
            },
        );
        assert_eq!(store.next_since_id(false), 7);

        let outcome = store.apply(
            MergeMode::Incremental,
            TradeDelta {
                exits: vec![exit(9, "TimeCut")],
                ..Default::default()
            },
        );

        assert_eq!(ids(store.entries()), vec![7, 5]);
        assert_eq!(ids(store.exits()), vec![9]);
        assert_eq!(store.high_water_mark(), 9);
        assert_eq!(outcome.new_exits, 1);
        assert_eq!(outcome.new_entries, 0);
    }

    #[test]
    fn test_incremental_prepends_and_keeps_newest_copy() {
        let mut store = LogStore::new();
        store.apply(
            MergeMode::FullResync,
            TradeDelta {
                entries: vec![entry(2), entry(1)],
                ..Default::default()
            },
        );

        let mut updated = entry(2);
        updated.price = 2000.0;
        store.apply(
            MergeMode::Incremental,
            TradeDelta {
                entries: vec![entry(3), updated],
                ..Default::default()
            },
        );

        assert_eq!(ids(store.entries()), vec![3, 2, 1]);
        assert_eq!(store.entries()[1].price, 2000.0);
    }

    #[test]
    fn test_empty_delta_keeps_mark_but_replaces_stats() {
        let mut store = LogStore::new();
        store.apply(
            MergeMode::FullResync,
            TradeDelta {
                entries: vec![entry(4)],
                stats: Some(AggregateStats {
                    total: 1,
                    ..Default::default()
                }),
                ..Default::default()
            },
        );

        let outcome = store.apply(MergeMode::Incremental, TradeDelta::default());
        assert_eq!(outcome, MergeOutcome {
            high_water_mark: 4,
            ..Default::default()
        });
        assert_eq!(store.stats().map(|s| s.total), Some(1));

        store.apply(
            MergeMode::Incremental,
            TradeDelta {
                stats: Some(AggregateStats {
                    total: 2,
                    wins: 1,
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        assert_eq!(store.high_water_mark(), 4);
        assert_eq!(store.stats().map(|s| s.total), Some(2));
    }

    #[test]
    fn test_composite_ids_dedup_without_moving_mark() {
        let mut composite = entry(0);
        composite.id = TradeId::Composite("t_LG_1".to_string());

        let mut store = LogStore::new();
        store.apply(
            MergeMode::FullResync,
            TradeDelta {
                entries: vec![composite.clone(), composite.clone(), entry(3)],
                ..Default::default()
            },
        );

        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.high_water_mark(), 3);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = LogStore::new();
        store.apply(
            MergeMode::FullResync,
            TradeDelta {
                entries: vec![entry(1)],
                exits: vec![exit(2, "손절")],
                stats: Some(AggregateStats::default()),
            },
        );
        store.reset();

        assert_eq!(store.events().count(), 0);
        assert_eq!(store.high_water_mark(), 0);
        assert!(store.stats().is_none());
        assert_eq!(store.next_since_id(false), 0);
    }
}
