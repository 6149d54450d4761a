use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use interface::{ClientError, CommandReply, StatusMessage, TradeLogResponse};

use crate::client::{Command, CommandGateway, DashboardApi};
use crate::config::Config;
use crate::preferences::ActiveView;
use crate::reconcile::Ticket;
use crate::record::{TradeId, TradeKind, ViewMode};
use crate::session::{DashboardSession, Effect, TradeLogRequest};
use crate::transport::{ChannelEvent, StatusChannel};

/// 유예 만료, 알림 정리 주기
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(1);

/// 운영자 입력
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Toggle,
    Command(Command),
    ViewMode(ViewMode),
    Enter(ActiveView),
    Hide(TradeId),
    HideTimeCuts,
    RestoreHidden,
    SetSetting(String, Value),
    ClearEntries,
    ClearExits,
    ClearActivity,
    Show,
    Quit,
}

impl FromStr for Action {
    type Err = String;

    /// 한 줄 명령. 예: `toggle`, `mode sell`, `hide 42`, `set max_stocks 5`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let head = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();

        let parsed = match (head.as_str(), arg) {
            ("toggle", None) => Action::Toggle,
            ("cmd", Some(token)) => Action::Command(token.parse()?),
            ("mode", Some(mode)) => Action::ViewMode(mode.parse()?),
            ("view", Some(view)) => Action::Enter(view.parse()?),
            ("hide", Some(first)) => {
                // 조합 ID 는 시각의 공백을 포함하므로 줄 끝까지 읽는다
                let id = std::iter::once(first).chain(parts).collect::<Vec<_>>().join(" ");
                Action::Hide(match id.parse::<u64>() {
                    Ok(n) if n > 0 => TradeId::Server(n),
                    _ => TradeId::Composite(id),
                })
            }
            ("hide-timecut", None) => Action::HideTimeCuts,
            ("restore", None) => Action::RestoreHidden,
            ("set", Some(key)) => {
                let raw = parts.collect::<Vec<_>>().join(" ");
                if raw.is_empty() {
                    return Err(format!("값이 없습니다: {}", s));
                }
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                Action::SetSetting(key.to_string(), value)
            }
            ("clear-buys", None) => Action::ClearEntries,
            ("clear-sells", None) => Action::ClearExits,
            ("clear-log", None) => Action::ClearActivity,
            ("show", None) => Action::Show,
            ("quit", None) | ("exit", None) => Action::Quit,
            _ => return Err(format!("알 수 없는 입력: {}", s)),
        };
        Ok(parsed)
    }
}

/// 네트워크 작업 결과
#[derive(Debug)]
enum RuntimeEvent {
    TradeLog(TradeLogRequest, Result<TradeLogResponse, ClientError>),
    Status(Ticket, Result<StatusMessage, ClientError>),
    CommandDone {
        command: Command,
        generation: Option<u64>,
        result: Result<CommandReply, ClientError>,
    },
    RelaxLabel(u64),
    SettingsSaved(Result<CommandReply, ClientError>),
    LogCleared(TradeKind, Result<CommandReply, ClientError>),
}

/// 세션 하나를 단일 태스크에서 돌리는 이벤트 루프
///
/// 네트워크 요청은 별도 태스크에서 실행하고 결과를 이벤트로 받는다.
/// 이벤트는 하나씩 끝까지 처리하므로 세션 상태를 동시에 건드리는 일이 없다.
pub struct DashboardRuntime<C> {
    config: Config,
    client: Arc<C>,
    session: DashboardSession,
}

impl<C> DashboardRuntime<C>
where
    C: DashboardApi + CommandGateway + 'static,
{
    pub fn new(config: Config, client: C) -> Self {
        let session = DashboardSession::new(&config);
        Self {
            config,
            client: Arc::new(client),
            session,
        }
    }

    pub fn session(&self) -> &DashboardSession {
        &self.session
    }

    /// `Quit` 이 오거나 입력 채널이 닫힐 때까지 실행하고 세션을 돌려준다
    pub async fn run(mut self, mut actions: mpsc::Receiver<Action>) -> DashboardSession {
        let (events_tx, mut events) = mpsc::channel::<RuntimeEvent>(256);
        let (channel_tx, mut channel) = mpsc::channel::<ChannelEvent>(64);
        let channel_task = StatusChannel::from_config(&self.config).spawn(channel_tx);

        let effects = self.session.start(Instant::now());
        self.execute(effects, &events_tx);

        let mut poll = interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 첫 tick 은 즉시 끝나므로 start 의 전체 조회와 겹치지 않게 소비
        poll.tick().await;

        let mut housekeeping = interval(HOUSEKEEPING_INTERVAL);

        info!("대시보드 런타임 시작: {}", self.config.server_url);

        loop {
            tokio::select! {
                Some(event) = channel.recv() => {
                    let effects = self.session.on_channel_event(event, Instant::now());
                    self.execute(effects, &events_tx);
                }
                Some(event) = events.recv() => {
                    self.handle_event(event, &events_tx);
                }
                _ = poll.tick() => {
                    let effects = self.session.poll(Instant::now());
                    self.execute(effects, &events_tx);
                }
                _ = housekeeping.tick() => {
                    let now = Instant::now();
                    if self.session.tick(now) {
                        debug!("유예 시간 종료, 서버 상태로 복귀");
                    }
                    self.session.notices(now);
                }
                action = actions.recv() => match action {
                    Some(Action::Quit) | None => break,
                    Some(action) => self.handle_action(action, &events_tx),
                },
            }
        }

        channel_task.abort();
        info!("대시보드 런타임 종료");
        self.session
    }

    fn handle_event(&mut self, event: RuntimeEvent, events: &mpsc::Sender<RuntimeEvent>) {
        let now = Instant::now();
        let effects = match event {
            RuntimeEvent::TradeLog(request, result) => {
                self.session.on_trade_log(request, result);
                Vec::new()
            }
            RuntimeEvent::Status(ticket, result) => {
                self.session.on_status_fetched(ticket, result, now);
                Vec::new()
            }
            RuntimeEvent::CommandDone {
                command,
                generation,
                result,
            } => self
                .session
                .on_command_result(command, generation, result, now),
            RuntimeEvent::RelaxLabel(generation) => {
                self.session.on_label_relax(generation);
                Vec::new()
            }
            RuntimeEvent::SettingsSaved(result) => self.session.on_settings_saved(result, now),
            RuntimeEvent::LogCleared(kind, result) => {
                self.session.on_log_cleared(kind, result, now)
            }
        };
        self.execute(effects, events);
    }

    fn handle_action(&mut self, action: Action, events: &mpsc::Sender<RuntimeEvent>) {
        let now = Instant::now();
        let effects = match action {
            Action::Toggle => vec![self.session.toggle_bot(now)],
            Action::Command(command) => vec![self.session.send_command(command)],
            Action::ViewMode(mode) => {
                self.session.set_view_mode(mode);
                Vec::new()
            }
            Action::Enter(view) => self.session.enter_view(view, now),
            Action::Hide(id) => {
                self.session.exclude(id, now);
                Vec::new()
            }
            Action::HideTimeCuts => {
                self.session.exclude_time_cuts(now);
                Vec::new()
            }
            Action::RestoreHidden => {
                self.session.restore_exclusions(now);
                Vec::new()
            }
            Action::SetSetting(key, value) => {
                self.save_setting(key, value, events);
                Vec::new()
            }
            Action::ClearEntries => {
                self.clear_log(TradeKind::Entry, events);
                Vec::new()
            }
            Action::ClearExits => {
                self.clear_log(TradeKind::Exit, events);
                Vec::new()
            }
            Action::ClearActivity => {
                self.session.clear_activity(now);
                Vec::new()
            }
            Action::Show => {
                println!("{}", self.session.render_text());
                Vec::new()
            }
            Action::Quit => Vec::new(),
        };
        self.execute(effects, events);
    }

    fn execute(&self, effects: Vec<Effect>, events: &mpsc::Sender<RuntimeEvent>) {
        for effect in effects {
            let client = self.client.clone();
            let events = events.clone();

            match effect {
                Effect::SyncTradeLog(request) => {
                    tokio::spawn(async move {
                        let result = client.fetch_trade_log(request.since_id).await;
                        let _ = events.send(RuntimeEvent::TradeLog(request, result)).await;
                    });
                }
                Effect::FetchStatus(ticket) => {
                    tokio::spawn(async move {
                        let result = client.fetch_status().await;
                        let _ = events.send(RuntimeEvent::Status(ticket, result)).await;
                    });
                }
                Effect::SendCommand {
                    command,
                    generation,
                } => {
                    tokio::spawn(async move {
                        let result = client.send_command(command).await;
                        let _ = events
                            .send(RuntimeEvent::CommandDone {
                                command,
                                generation,
                                result,
                            })
                            .await;
                    });
                }
                Effect::RelaxLabel { generation, after } => {
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = events.send(RuntimeEvent::RelaxLabel(generation)).await;
                    });
                }
            }
        }
    }

    /// 현재 설정을 읽어 한 항목만 바꿔 저장
    fn save_setting(&self, key: String, value: Value, events: &mpsc::Sender<RuntimeEvent>) {
        let client = self.client.clone();
        let events = events.clone();

        tokio::spawn(async move {
            let result = match client.fetch_settings().await {
                Ok(mut settings) => {
                    settings.insert(key, value);
                    client.save_settings(&settings).await
                }
                Err(e) => Err(e),
            };
            let _ = events.send(RuntimeEvent::SettingsSaved(result)).await;
        });
    }

    fn clear_log(&self, kind: TradeKind, events: &mpsc::Sender<RuntimeEvent>) {
        let client = self.client.clone();
        let events = events.clone();

        tokio::spawn(async move {
            let result = match kind {
                TradeKind::Entry => client.clear_entries().await,
                TradeKind::Exit => client.clear_exits().await,
            };
            let _ = events.send(RuntimeEvent::LogCleared(kind, result)).await;
        });
    }
}
