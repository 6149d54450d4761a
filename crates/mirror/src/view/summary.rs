use interface::{AggregateStats, ApiMode, Summary};

use super::format::{percent, profit_class, signed_percent, signed_won, won};
use crate::reconcile::Cell;

/// 자산 현황 카드
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub total_asset: Cell,
    pub total_buy: Cell,
    pub deposit: Cell,
    pub total_pl: Cell,
    pub total_yield: Cell,
    pub mode: ApiMode,
}

impl From<&Summary> for SummaryView {
    fn from(summary: &Summary) -> Self {
        let pl = summary.total_pl.unwrap_or(0.0);
        let yield_percent = summary.total_yield.unwrap_or(0.0);
        let class = |v: f64| if v >= 0.0 { "profit" } else { "loss" };

        Self {
            total_asset: Cell::plain(format!("{} 원", won(summary.total_asset.unwrap_or(0.0)))),
            total_buy: Cell::plain(format!("{} 원", won(summary.total_buy.unwrap_or(0.0)))),
            deposit: Cell::plain(format!("{} 원", won(summary.deposit.unwrap_or(0.0)))),
            total_pl: Cell::classed(format!("{} 원", signed_won(pl)), class(pl)),
            total_yield: Cell::classed(signed_percent(yield_percent, 2), class(yield_percent)),
            mode: summary.account_mode(),
        }
    }
}

impl SummaryView {
    pub fn badge(&self) -> &'static str {
        match self.mode {
            ApiMode::Mock => "MOCK 서버",
            ApiMode::Paper => "모의투자",
            ApiMode::Real => "실전투자",
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("계좌 모드  : {}", self.badge()),
            format!("총 평가자산: {}", self.total_asset.text),
            format!("총 매입금액: {}", self.total_buy.text),
            format!("예수금     : {}", self.deposit.text),
            format!("총 손익    : {}", self.total_pl.text),
            format!("총 수익률  : {}", self.total_yield.text),
        ]
    }
}

/// 매매 리포트 통계. 값은 서버가 준 그대로 표시만 한다.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub count: Cell,
    pub win_rate: Cell,
    pub total_profit: Cell,
    pub avg_return: Cell,
}

impl From<&AggregateStats> for StatsView {
    fn from(stats: &AggregateStats) -> Self {
        let win_rate = stats.win_rate();
        let profit = stats.total_profit.round();
        let win_class = if win_rate >= 50.0 {
            "profit-cell"
        } else {
            "loss-cell"
        };

        Self {
            count: Cell::plain(format!("{}회", stats.total)),
            win_rate: Cell::classed(percent(win_rate, 1), win_class),
            total_profit: Cell::classed(format!("{}원", signed_won(profit)), profit_class(profit)),
            avg_return: Cell::classed(
                signed_percent(stats.avg_profit, 2),
                profit_class(stats.avg_profit),
            ),
        }
    }
}

impl StatsView {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("매매 횟수  : {}", self.count.text),
            format!("승률       : {}", self.win_rate.text),
            format!("실현 손익  : {}", self.total_profit.text),
            format!("평균 수익률: {}", self.avg_return.text),
        ]
    }
}
