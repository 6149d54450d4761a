use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// 로깅 초기화
/// 콘솔 + `log_dir` 아래 일 단위 롤링 파일에 기록한다.
/// 반환된 guard 가 drop 되면 파일 writer 가 flush 후 종료되므로 main 에서 들고 있어야 한다.
pub fn init_tracing(log_dir: &Path) -> Vec<WorkerGuard> {
    let info_file = RollingFileAppender::new(Rotation::DAILY, log_dir, "mirror.log");
    let error_file = RollingFileAppender::new(Rotation::DAILY, log_dir, "mirror-error.log");

    let (info_writer, info_guard) = tracing_appender::non_blocking(info_file);
    let (error_writer, error_guard) = tracing_appender::non_blocking(error_file);

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(console_filter))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(info_writer)
                .with_filter(EnvFilter::new("info")),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(error_writer)
                .with_filter(EnvFilter::new("error")),
        )
        .try_init();

    if let Err(e) = result {
        eprintln!("tracing subscriber 가 이미 설치되어 있습니다: {}", e);
    }

    vec![info_guard, error_guard]
}
