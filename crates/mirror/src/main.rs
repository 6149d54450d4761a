use color_eyre::eyre;
use structopt::StructOpt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use mirror::client::{Command, CommandGateway, DashboardApi, HttpDashboardClient};
use mirror::config::Config;
use mirror::record::{build_view, delta_from_response, ExclusionSet, LogStore, MergeMode, ViewMode};
use mirror::runtime::{Action, DashboardRuntime};
use mirror::view::{headers, trade_rows, StatsView, SummaryView};

// lib.rs에서 자동으로 dotenv가 로드됨

#[derive(Debug, StructOpt)]
#[structopt(name = "mirror", about = "자동매매 봇 대시보드 클라이언트")]
enum Cli {
    /// 대시보드 실행 (표준 입력으로 조작)
    Run,
    /// 현재 상태 1회 조회
    Status,
    /// 매매 로그 전체 조회
    Log {
        /// all | buy | sell | timecut
        #[structopt(long, default_value = "all")]
        mode: ViewMode,
    },
    /// 봇 시작
    Start,
    /// 봇 종료
    Stop,
    /// 그 밖의 제어 명령 전송 (report, sellall, status, reset)
    Command { command: String },
    /// 서버 설정 출력
    Settings,
    /// 매수 로그 삭제
    ClearBuys,
    /// 매도 로그 삭제
    ClearSells,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // init error reporting
    color_eyre::install()?;

    let config = Config::from_env();

    // init logging
    let _guards = mirror::logger::init_tracing(&config.log_dir);

    let client = HttpDashboardClient::from_config(&config);

    match Cli::from_args() {
        Cli::Run => run_dashboard(config, client).await,
        Cli::Status => show_status(&client).await,
        Cli::Log { mode } => show_trade_log(&client, mode).await,
        Cli::Start => dispatch(&client, Command::Start).await,
        Cli::Stop => dispatch(&client, Command::Stop).await,
        Cli::Command { command } => {
            let command = command.parse().map_err(|e| eyre::eyre!("{}", e))?;
            dispatch(&client, command).await
        }
        Cli::Settings => {
            let settings = client
                .fetch_settings()
                .await
                .map_err(|e| eyre::eyre!("설정 조회 실패: {}", e))?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Cli::ClearBuys => {
            client
                .clear_entries()
                .await
                .map_err(|e| eyre::eyre!("매수 로그 삭제 실패: {}", e))?;
            println!("매수 로그를 삭제했습니다");
            Ok(())
        }
        Cli::ClearSells => {
            client
                .clear_exits()
                .await
                .map_err(|e| eyre::eyre!("매도 로그 삭제 실패: {}", e))?;
            println!("매도 로그를 삭제했습니다");
            Ok(())
        }
    }
}

async fn run_dashboard(config: Config, client: HttpDashboardClient) -> eyre::Result<()> {
    let (actions_tx, actions_rx) = mpsc::channel(32);

    // 표준 입력 한 줄 = 조작 한 번
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("입력 읽기 실패: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Action>() {
                Ok(action) => {
                    if actions_tx.send(action).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    });

    let runtime = DashboardRuntime::new(config, client);
    let session = runtime.run(actions_rx).await;
    info!("종료 시점 매매 로그 {}건", session.store().events().count());
    Ok(())
}

async fn dispatch(client: &HttpDashboardClient, command: Command) -> eyre::Result<()> {
    let reply = client
        .send_command(command)
        .await
        .map_err(|e| eyre::eyre!("명령 전송 실패: {}", e))?;
    println!("{}: {}", command, reply.message.unwrap_or_else(|| "성공".to_string()));
    Ok(())
}

async fn show_status(client: &HttpDashboardClient) -> eyre::Result<()> {
    let message = client
        .fetch_status()
        .await
        .map_err(|e| eyre::eyre!("상태 조회 실패: {}", e))?;

    match &message.summary {
        Some(summary) => {
            for line in SummaryView::from(summary).lines() {
                println!("{}", line);
            }
        }
        None => println!("요약 정보가 없습니다"),
    }
    println!("보유 종목 {}개", message.holdings.len());
    Ok(())
}

async fn show_trade_log(client: &HttpDashboardClient, mode: ViewMode) -> eyre::Result<()> {
    let response = client
        .fetch_trade_log(0)
        .await
        .map_err(|e| eyre::eyre!("매매 로그 조회 실패: {}", e))?;

    let mut store = LogStore::new();
    store.apply(MergeMode::FullResync, delta_from_response(&response));

    let exclusions = ExclusionSet::new();
    let events = build_view(&store, mode, &exclusions);

    println!("{}", headers(mode).join(" | "));
    for row in trade_rows(&events, mode) {
        let cells: Vec<&str> = row.cells.iter().map(|c| c.text.as_str()).collect();
        println!("{}", cells.join(" | "));
    }
    if let Some(stats) = store.stats() {
        for line in StatsView::from(stats).lines() {
            println!("{}", line);
        }
    }
    Ok(())
}
