pub mod format;
pub mod holdings;
pub mod summary;
pub mod trades;

pub use holdings::{holding_rows, HoldingRow, HOLDINGS_PLACEHOLDER};
pub use summary::{StatsView, SummaryView};
pub use trades::{
    headers, recent_line, row_key, trade_row, trade_rows, RECENT_PLACEHOLDER, TRADES_PLACEHOLDER,
};
