use super::format::{percent, won, LOSS_CLASS, PROFIT_CLASS};
use crate::reconcile::{Cell, RenderedRow};
use crate::record::{is_time_cut, TradeEvent, TradeKind, ViewMode};

pub const TRADES_PLACEHOLDER: &str = "조회된 데이터가 없습니다.";
pub const RECENT_PLACEHOLDER: &str = "체결 내역이 없습니다.";

const ENTRY_CLASS: &str = "buy";
const EXIT_CLASS: &str = "sell";
const TIME_CUT_CLASS: &str = "timecut";

/// 매매 로그 표 머리글
pub fn headers(mode: ViewMode) -> [&'static str; 6] {
    let amount = match mode {
        ViewMode::All => "구분",
        ViewMode::Entries => "매수금액",
        ViewMode::Exits | ViewMode::TimeCut => "매도금액",
    };
    let last = if mode == ViewMode::TimeCut {
        "관리"
    } else {
        "사유"
    };
    ["시간", "종목명", amount, "수량", "수익률", last]
}

/// 매수/매도 ID 공간이 달라서 종류를 key 에 붙인다
pub fn row_key(event: &TradeEvent) -> String {
    format!("{}-{}", event.kind, event.id)
}

pub fn trade_row(event: &TradeEvent, mode: ViewMode) -> RenderedRow {
    let amount = format!("{}원", won(event.notional() as f64));
    let quantity = Cell::plain(format!("{}주", event.quantity.trunc() as i64));
    let time = Cell::plain(event.time_of_day());
    let name = Cell::plain(event.name.clone());

    let cells = match (event.kind, event.exit.as_ref()) {
        (TradeKind::Exit, Some(exit)) => {
            let time_cut = is_time_cut(&exit.reason);
            let class = if time_cut {
                TIME_CUT_CLASS
            } else {
                EXIT_CLASS
            };
            let kind_cell = if mode == ViewMode::All {
                Cell::classed(if time_cut { "타임컷" } else { "매도" }, class)
            } else {
                Cell::classed(amount, class)
            };
            let rate_class = if exit.yield_percent > 0.0 {
                PROFIT_CLASS
            } else {
                LOSS_CLASS
            };
            // 숨김 명령에 그대로 넣을 수 있도록 식별자를 같이 보여준다
            let last = if mode == ViewMode::TimeCut {
                Cell::classed(format!("삭제 {}", event.id), "action-delete")
            } else if exit.reason.is_empty() {
                Cell::plain("-")
            } else {
                Cell::plain(exit.reason.clone())
            };

            vec![
                time,
                name,
                kind_cell,
                quantity,
                Cell::classed(percent(exit.yield_percent, 2), rate_class),
                last,
            ]
        }
        _ => {
            let kind_cell = if mode == ViewMode::All {
                Cell::classed(TradeKind::Entry.label(), ENTRY_CLASS)
            } else {
                Cell::classed(amount, ENTRY_CLASS)
            };
            vec![
                time,
                name,
                kind_cell,
                quantity,
                Cell::plain("-"),
                Cell::plain("-"),
            ]
        }
    };

    RenderedRow::new(row_key(event), cells)
}

pub fn trade_rows(events: &[&TradeEvent], mode: ViewMode) -> Vec<RenderedRow> {
    events.iter().map(|e| trade_row(e, mode)).collect()
}

/// 대시보드 "최근 체결" 한 줄
pub fn recent_line(event: &TradeEvent) -> String {
    let head = format!(
        "{} {} {} {}원",
        event.time_of_day(),
        event.kind.label(),
        event.name,
        won(event.price)
    );
    match &event.exit {
        Some(exit) => {
            let reason = if exit.reason.is_empty() {
                "-"
            } else {
                exit.reason.as_str()
            };
            format!("{} {} {}", head, percent(exit.yield_percent, 2), reason)
        }
        None => format!("{} {}주", head, event.quantity.trunc() as i64),
    }
}
