use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// 대시보드 클라이언트 설정
/// 모든 값은 환경 변수(.env 포함)에서 읽고, 없거나 잘못되면 기본값을 쓴다.
#[derive(Debug, Clone)]
pub struct Config {
    /// REST 서버 주소 (예: http://127.0.0.1:8000)
    pub server_url: String,
    /// 상태 push WebSocket 주소
    pub ws_url: String,
    /// 매매 로그 주기 조회 간격
    pub poll_interval: Duration,
    /// 재연결 사이 고정 대기
    pub reconnect_delay: Duration,
    /// 연속 재연결 시도 한도 (초과하면 더 이상 재연결하지 않음)
    pub max_reconnect_attempts: u32,
    /// 낙관적 상태가 서버 push 보다 우선하는 유예 시간
    pub grace_window: Duration,
    /// 명령 성공 후 "대기.." 라벨을 정상 라벨로 되돌리기까지의 지연
    pub label_relax_delay: Duration,
    /// 명령 요청 타임아웃
    pub command_timeout: Duration,
    /// 마지막 활성 화면 저장 파일
    pub view_state_path: PathBuf,
    /// 롤링 로그 파일 디렉터리
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let server_url = "http://127.0.0.1:8000".to_string();
        Self {
            ws_url: ws_url_from_server(&server_url),
            server_url,
            poll_interval: Duration::from_secs(5),
            reconnect_delay: Duration::from_millis(2000),
            max_reconnect_attempts: 10,
            grace_window: Duration::from_secs(10),
            label_relax_delay: Duration::from_millis(1000),
            command_timeout: Duration::from_secs(10),
            view_state_path: PathBuf::from("mirror_view.json"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_url = env::var("MIRROR_SERVER_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.server_url);
        let ws_url = env::var("MIRROR_WS_URL").unwrap_or_else(|_| ws_url_from_server(&server_url));

        Self {
            server_url,
            ws_url,
            poll_interval: Duration::from_secs(env_or("MIRROR_POLL_INTERVAL_SECS", 5)),
            reconnect_delay: Duration::from_millis(env_or("MIRROR_RECONNECT_DELAY_MS", 2000)),
            max_reconnect_attempts: env_or("MIRROR_MAX_RECONNECT_ATTEMPTS", 10),
            grace_window: Duration::from_secs(env_or("MIRROR_GRACE_WINDOW_SECS", 10)),
            label_relax_delay: Duration::from_millis(env_or("MIRROR_LABEL_RELAX_MS", 1000)),
            command_timeout: Duration::from_secs(env_or("MIRROR_COMMAND_TIMEOUT_SECS", 10)),
            view_state_path: env::var("MIRROR_VIEW_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.view_state_path),
            log_dir: env::var("MIRROR_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }
}

/// http(s)://host → ws(s)://host/ws
pub fn ws_url_from_server(server_url: &str) -> String {
    let base = server_url.trim_end_matches('/');
    let converted = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", base)
    };
    format!("{}/ws", converted)
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("{} 값을 해석할 수 없어 기본값을 사용합니다: {:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
