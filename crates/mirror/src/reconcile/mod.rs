//! key 기반 화면 동기화.
//!
//! 이전에 그린 행과 새 행을 key 로 맞춰 보고, 최소한의 생성/이동/삭제와
//! 실제로 달라진 칸만 다시 쓰는 조작 목록을 만든다.

pub mod surface;

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

pub use surface::{Cell, DisplaySurface, RenderedRow, SurfaceCounters, TableSurface};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Create { position: usize, row: RenderedRow },
    Move { key: String, position: usize },
    Patch { key: String, index: usize, cell: Cell },
    Remove { key: String },
    ShowPlaceholder(String),
    ClearPlaceholder,
}

impl Op {
    /// 행 자체를 만들거나 옮기거나 지우는 조작인지
    pub fn is_structural(&self) -> bool {
        matches!(self, Op::Create { .. } | Op::Move { .. } | Op::Remove { .. })
    }
}

/// 현재 화면(`current`, `current_placeholder`)을 `target` 으로 바꾸는 조작 목록
///
/// 1. target 에 없는 key 를 먼저 지운다.
/// 2. target 순서대로 돌며 자리가 다르면 옮기고, 없으면 만든다.
/// 3. 남아 있던 행은 달라진 칸만 다시 쓴다.
///
/// target 이 비어 있으면 placeholder 한 줄로 접는데, 이미 같은 문구가 떠 있으면 아무것도 하지 않는다.
pub fn plan(
    current: &[RenderedRow],
    current_placeholder: Option<&str>,
    target: &[RenderedRow],
    placeholder: &str,
) -> Vec<Op> {
    let mut ops = Vec::new();
    let target = unique_by_key(target);

    if target.is_empty() {
        for row in current {
            ops.push(Op::Remove {
                key: row.key.clone(),
            });
        }
        if current_placeholder != Some(placeholder) {
            ops.push(Op::ShowPlaceholder(placeholder.to_string()));
        }
        return ops;
    }

    if current_placeholder.is_some() {
        ops.push(Op::ClearPlaceholder);
    }

    let wanted: HashSet<&str> = target.iter().map(|r| r.key.as_str()).collect();
    let existing: HashMap<&str, &[Cell]> = current
        .iter()
        .map(|r| (r.key.as_str(), r.cells.as_slice()))
        .collect();

    // 조작을 적용했을 때의 key 순서를 따라간다
    let mut order: Vec<&str> = Vec::with_capacity(current.len());
    for row in current {
        if wanted.contains(row.key.as_str()) {
            order.push(row.key.as_str());
        } else {
            ops.push(Op::Remove {
                key: row.key.clone(),
            });
        }
    }

    for (position, row) in target.iter().enumerate() {
        let key = row.key.as_str();

        match order.iter().position(|k| *k == key) {
            Some(at) => {
                if at != position {
                    ops.push(Op::Move {
                        key: row.key.clone(),
                        position,
                    });
                    order.remove(at);
                    order.insert(position, key);
                }

                let old_cells = existing.get(key).copied().unwrap_or(&[]);
                for (index, cell) in row.cells.iter().enumerate() {
                    if old_cells.get(index) != Some(cell) {
                        ops.push(Op::Patch {
                            key: row.key.clone(),
                            index,
                            cell: cell.clone(),
                        });
                    }
                }
            }
            None => {
                ops.push(Op::Create {
                    position,
                    row: (*row).clone(),
                });
                order.insert(position, key);
            }
        }
    }

    ops
}

pub fn apply<S: DisplaySurface + ?Sized>(surface: &mut S, ops: &[Op]) {
    for op in ops {
        match op {
            Op::Create { position, row } => surface.insert(*position, row.clone()),
            Op::Move { key, position } => surface.relocate(key, *position),
            Op::Patch { key, index, cell } => surface.write_cell(key, *index, cell.clone()),
            Op::Remove { key } => surface.remove(key),
            Op::ShowPlaceholder(message) => surface.show_placeholder(message),
            Op::ClearPlaceholder => surface.clear_placeholder(),
        }
    }
}

/// 같은 key 가 두 번 오면 뒤의 것은 버린다
fn unique_by_key(rows: &[RenderedRow]) -> Vec<&RenderedRow> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| {
            let fresh = seen.insert(row.key.as_str());
            if !fresh {
                warn!("중복 key 행을 건너뜁니다: {}", row.key);
            }
            fresh
        })
        .collect()
}

/// 행 목록의 구조 해시 (sha256, hex)
pub fn digest_rows(rows: &[RenderedRow]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(row.key.as_bytes());
        hasher.update([0x1e]);
        for cell in &row.cells {
            hasher.update(cell.text.as_bytes());
            hasher.update([0x1f]);
            if let Some(class) = &cell.class {
                hasher.update(class.as_bytes());
            }
            hasher.update([0x1f]);
        }
        hasher.update([0x1d]);
    }
    hex::encode(hasher.finalize())
}

/// 갱신 순번. 조회를 시작할 때 받아 두고, 결과를 적용할 때 돌려준다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// 더 최근 순번이 이미 발급되어 버림
    Stale,
    /// 직전에 적용한 것과 같은 입력
    Unchanged,
    Applied(Vec<Op>),
}

/// surface 하나를 맡는 동기화기
///
/// 마지막으로 적용한 입력의 해시를 들고 있다가 같은 입력이면 건너뛴다.
/// 순번이 최신이 아닌 결과는 적용하지 않으므로, 늦게 도착한 응답이 새 화면을 덮어쓰지 않는다.
#[derive(Debug)]
pub struct Reconciler {
    placeholder: String,
    committed_digest: Option<String>,
    issued: u64,
}

impl Reconciler {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            committed_digest: None,
            issued: 0,
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn latest(&self) -> Ticket {
        Ticket(self.issued)
    }

    pub fn commit<S: DisplaySurface + ?Sized>(
        &mut self,
        ticket: Ticket,
        rows: &[RenderedRow],
        surface: &mut S,
    ) -> ReconcileOutcome {
        if ticket.0 != self.issued {
            debug!(
                "오래된 갱신 버림: ticket={}, latest={}",
                ticket.0, self.issued
            );
            return ReconcileOutcome::Stale;
        }

        let digest = digest_rows(rows);
        if self.committed_digest.as_deref() == Some(digest.as_str()) {
            return ReconcileOutcome::Unchanged;
        }

        let rendered = surface.rendered();
        let ops = plan(&rendered, surface.placeholder(), rows, &self.placeholder);
        apply(surface, &ops);
        self.committed_digest = Some(digest);

        ReconcileOutcome::Applied(ops)
    }

    /// 순번 발급과 적용을 한 번에
    pub fn reconcile<S: DisplaySurface + ?Sized>(
        &mut self,
        rows: &[RenderedRow],
        surface: &mut S,
    ) -> ReconcileOutcome {
        let ticket = self.issue();
        self.commit(ticket, rows, surface)
    }

    /// 다음 입력은 해시가 같아도 다시 맞춘다 (화면을 밖에서 비웠을 때)
    pub fn invalidate(&mut self) {
        self.committed_digest = None;
    }
}
