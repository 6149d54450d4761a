pub mod exclusion;
pub mod filter;
pub mod helpers;
pub mod interfaces;
pub mod store;

pub use exclusion::ExclusionSet;
pub use filter::{build_view, is_time_cut, recent_activity, ViewMode, RECENT_LIMIT, VIEW_LIMIT};
pub use helpers::*;
pub use interfaces::{ExitDetail, TradeEvent, TradeId, TradeKind};
pub use store::{LogStore, MergeMode, MergeOutcome, TradeDelta};
