pub mod activity;
pub mod client;
pub mod config;
pub mod logger;
pub mod preferences;
pub mod reconcile;
pub mod record;
pub mod runtime;
pub mod session;
pub mod status;
pub mod transport;
pub mod view;

// 라이브러리 로드 시 .env 자동 적용
#[ctor::ctor]
fn init() {
    dotenv::dotenv().ok();
}
