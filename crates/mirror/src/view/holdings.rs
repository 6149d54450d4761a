use interface::HoldingRecord;

use super::format::{profit_class, signed_percent, truncate, won};
use crate::reconcile::{Cell, RenderedRow};

pub const HOLDINGS_PLACEHOLDER: &str = "현재 보유 중인 종목이 없습니다.";

/// 보유 종목 한 줄. 종목명이 reconcile key 다.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRow {
    pub name: String,
    pub avg_price: i64,
    pub rate: f64,
    pub pnl: i64,
    pub quantity: i64,
    pub current_price: i64,
    pub hold_time: String,
    pub stage: String,
}

impl From<&HoldingRecord> for HoldingRow {
    fn from(record: &HoldingRecord) -> Self {
        Self {
            name: record
                .stk_nm
                .clone()
                .or_else(|| record.name.clone())
                .unwrap_or_else(|| "-".to_string()),
            avg_price: truncate(record.avg_prc.or(record.pchs_avg_pric).unwrap_or(0.0)),
            rate: record.pl_rt.or(record.rate).unwrap_or(0.0),
            pnl: truncate(record.pl_amt.or(record.eval_pnl).unwrap_or(0.0)),
            quantity: truncate(record.rmnd_qty.or(record.qty).unwrap_or(0.0)),
            current_price: truncate(record.cur_prc.unwrap_or(0.0)),
            hold_time: record
                .hold_time
                .clone()
                .unwrap_or_else(|| "0분".to_string()),
            stage: record
                .watering_step
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

impl HoldingRow {
    pub fn render(&self) -> RenderedRow {
        RenderedRow::new(
            self.name.clone(),
            vec![
                Cell::plain(self.name.clone()),
                Cell::plain(won(self.avg_price as f64)),
                Cell::classed(signed_percent(self.rate, 2), profit_class(self.rate)),
                Cell::classed(won(self.pnl as f64), profit_class(self.pnl as f64)),
                Cell::plain(format!("{}주", self.quantity)),
                Cell::plain(won(self.current_price as f64)),
                Cell::plain(self.hold_time.clone()),
                Cell::plain(self.stage.clone()),
            ],
        )
    }
}

pub fn holding_rows(records: &[HoldingRecord]) -> Vec<RenderedRow> {
    records
        .iter()
        .map(|r| HoldingRow::from(r).render())
        .collect()
}
