use std::fmt::Display;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use interface::{ClientError, CommandReply, StatusMessage, TradeLogResponse};

use crate::activity::{ActivityLevel, ActivityLog, Notice};
use crate::client::Command;
use crate::config::Config;
use crate::preferences::{ActiveView, ViewPreference};
use crate::reconcile::{DisplaySurface, ReconcileOutcome, Reconciler, TableSurface, Ticket};
use crate::record::{
    build_view, delta_from_response, recent_activity, ExclusionSet, LogStore, MergeMode, TradeId,
    TradeKind, ViewMode,
};
use crate::status::{CommandResolution, RunState, StatusController};
use crate::transport::ChannelEvent;
use crate::view::{
    headers, holding_rows, recent_line, trade_rows, StatsView, SummaryView, HOLDINGS_PLACEHOLDER,
    RECENT_PLACEHOLDER, TRADES_PLACEHOLDER,
};

/// 서버 연결 표시
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Online,
    Offline,
    /// 재연결 한도 소진, 수동 재시작 전까지 그대로
    Dormant,
}

impl Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Online => write!(f, "온라인"),
            LinkState::Offline => write!(f, "오프라인"),
            LinkState::Dormant => write!(f, "연결 중단"),
        }
    }
}

/// 매매 로그 조회 요청. 응답을 받을 때 그대로 돌려준다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeLogRequest {
    pub since_id: u64,
    pub mode: MergeMode,
    epoch: u64,
}

/// 세션이 런타임에 요청하는 작업 (네트워크, 타이머)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SyncTradeLog(TradeLogRequest),
    FetchStatus(Ticket),
    SendCommand {
        command: Command,
        /// 토글로 나간 명령이면 Some
        generation: Option<u64>,
    },
    RelaxLabel {
        generation: u64,
        after: Duration,
    },
}

/// 대시보드 미러 전체 상태
///
/// 로그 저장소, 숨김 목록, 실행 상태, 화면 동기화기를 한곳에서 소유한다.
/// 모든 핸들러는 `&mut self` 로 끝까지 실행되고, 네트워크가 필요하면 `Effect` 로 돌려준다.
#[derive(Debug)]
pub struct DashboardSession {
    label_relax_delay: Duration,
    store: LogStore,
    /// 저장소를 비울 때마다 증가. 이전 epoch 의 응답은 버린다.
    store_epoch: u64,
    exclusions: ExclusionSet,
    view_mode: ViewMode,
    status: StatusController,
    summary: Option<SummaryView>,
    holdings: Reconciler,
    holdings_surface: TableSurface,
    trades: Reconciler,
    trades_surface: TableSurface,
    recent: Vec<String>,
    activity: ActivityLog,
    link: LinkState,
    ever_connected: bool,
    active_view: ActiveView,
    preference: ViewPreference,
}

impl DashboardSession {
    pub fn new(config: &Config) -> Self {
        let preference = ViewPreference::new(config.view_state_path.clone());
        let active_view = preference.load();

        Self {
            label_relax_delay: config.label_relax_delay,
            store: LogStore::new(),
            store_epoch: 0,
            exclusions: ExclusionSet::new(),
            view_mode: ViewMode::All,
            status: StatusController::new(config.grace_window),
            summary: None,
            holdings: Reconciler::new(HOLDINGS_PLACEHOLDER),
            holdings_surface: TableSurface::new(),
            trades: Reconciler::new(TRADES_PLACEHOLDER),
            trades_surface: TableSurface::new(),
            recent: Vec::new(),
            activity: ActivityLog::new(),
            link: LinkState::Offline,
            ever_connected: false,
            active_view,
            preference,
        }
    }

    /// 첫 화면: 상태 + 전체 매매 로그
    pub fn start(&mut self, now: Instant) -> Vec<Effect> {
        self.activity
            .record(ActivityLevel::Info, format!("대시보드 시작 ({})", self.active_view), now);
        vec![
            Effect::FetchStatus(self.holdings.issue()),
            Effect::SyncTradeLog(self.trade_log_request(true)),
        ]
    }

    /// 주기 조회 (증분)
    pub fn poll(&mut self, now: Instant) -> Vec<Effect> {
        self.status.refresh(now);
        vec![Effect::SyncTradeLog(self.trade_log_request(false))]
    }

    /// 유예 만료 확인. 화면이 바뀌었으면 true.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.status.refresh(now)
    }

    pub fn trade_log_request(&self, force: bool) -> TradeLogRequest {
        TradeLogRequest {
            since_id: self.store.next_since_id(force),
            mode: if force {
                MergeMode::FullResync
            } else {
                MergeMode::Incremental
            },
            epoch: self.store_epoch,
        }
    }

    pub fn on_trade_log(
        &mut self,
        request: TradeLogRequest,
        result: Result<TradeLogResponse, ClientError>,
    ) {
        if request.epoch != self.store_epoch {
            debug!(
                "이전 저장소 기준 응답 버림: epoch={}, current={}",
                request.epoch, self.store_epoch
            );
            return;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("매매 로그 조회 실패 (since_id={}): {}", request.since_id, e);
                return;
            }
        };

        let outcome = self
            .store
            .apply(request.mode, delta_from_response(&response));
        if request.mode == MergeMode::Incremental && outcome.new_entries + outcome.new_exits > 0 {
            info!(
                "증분 로드: +{} 매수, +{} 매도 (last id {})",
                outcome.new_entries, outcome.new_exits, outcome.high_water_mark
            );
        }

        self.render_trades();
    }

    /// 저장소 → 필터 → 매매 로그 표, 최근 체결 목록
    fn render_trades(&mut self) {
        let rows = {
            let view = build_view(&self.store, self.view_mode, &self.exclusions);
            trade_rows(&view, self.view_mode)
        };
        let outcome = self.trades.reconcile(&rows, &mut self.trades_surface);
        if let ReconcileOutcome::Applied(ops) = outcome {
            debug!("매매 로그 표 갱신: {} ops", ops.len());
        }

        self.recent = recent_activity(&self.store)
            .into_iter()
            .map(recent_line)
            .collect();
    }

    pub fn on_channel_event(&mut self, event: ChannelEvent, now: Instant) -> Vec<Effect> {
        match event {
            ChannelEvent::Connected => {
                self.link = LinkState::Online;
                self.activity
                    .record(ActivityLevel::Success, "서버 연결됨", now);

                // 끊겨 있던 동안 놓친 로그가 있을 수 있다
                let reconnected = self.ever_connected;
                self.ever_connected = true;
                if reconnected {
                    vec![Effect::SyncTradeLog(self.trade_log_request(true))]
                } else {
                    Vec::new()
                }
            }
            ChannelEvent::Disconnected => {
                if self.link == LinkState::Online {
                    self.activity
                        .record(ActivityLevel::Warning, "서버 연결 끊김. 재연결 중...", now);
                }
                if self.link != LinkState::Dormant {
                    self.link = LinkState::Offline;
                }
                Vec::new()
            }
            ChannelEvent::Snapshot(message) => {
                let ticket = self.holdings.issue();
                self.apply_snapshot(ticket, message, now);
                Vec::new()
            }
            ChannelEvent::GaveUp { attempts } => {
                self.link = LinkState::Dormant;
                self.activity.record(
                    ActivityLevel::Error,
                    format!("재연결 {}회 실패. 다시 시작해야 합니다", attempts),
                    now,
                );
                Vec::new()
            }
        }
    }

    pub fn on_status_fetched(
        &mut self,
        ticket: Ticket,
        result: Result<StatusMessage, ClientError>,
        now: Instant,
    ) {
        match result {
            Ok(message) => self.apply_snapshot(ticket, message, now),
            Err(e) => warn!("상태 조회 실패: {}", e),
        }
    }

    fn apply_snapshot(&mut self, ticket: Ticket, message: StatusMessage, now: Instant) {
        if ticket != self.holdings.latest() {
            debug!("늦게 도착한 상태 스냅샷 버림: ticket={}", ticket.sequence());
            return;
        }
        let Some(summary) = message.summary.as_ref() else {
            debug!("summary 가 없는 상태 메시지 무시");
            return;
        };

        self.summary = Some(SummaryView::from(summary));
        self.status
            .on_authoritative(RunState::from_running(summary.running()), now);

        let rows = holding_rows(&message.holdings);
        let outcome = self
            .holdings
            .commit(ticket, &rows, &mut self.holdings_surface);
        if let ReconcileOutcome::Applied(ops) = outcome {
            debug!("보유 종목 표 갱신: {} ops", ops.len());
        }
    }

    /// 시작/종료 버튼
    pub fn toggle_bot(&mut self, now: Instant) -> Effect {
        let toggle = self.status.toggle(now);
        Effect::SendCommand {
            command: toggle.command,
            generation: Some(toggle.generation),
        }
    }

    /// 토글 외 명령 (report, sellall 등)
    pub fn send_command(&mut self, command: Command) -> Effect {
        Effect::SendCommand {
            command,
            generation: None,
        }
    }

    pub fn on_command_result(
        &mut self,
        command: Command,
        generation: Option<u64>,
        result: Result<CommandReply, ClientError>,
        now: Instant,
    ) -> Vec<Effect> {
        match &result {
            Ok(_) => self
                .activity
                .record(ActivityLevel::Success, format!("명령 실행: {}", command), now),
            Err(e) => self
                .activity
                .record(ActivityLevel::Error, format!("명령 실패: {} ({})", command, e), now),
        }

        let Some(generation) = generation else {
            return Vec::new();
        };

        match self.status.on_command_result(generation, result.is_ok()) {
            CommandResolution::Accepted => {
                let message = match command {
                    Command::Start => "🚀 봇 시작 명령 전송됨",
                    _ => "🛑 봇 종료 명령 전송됨",
                };
                self.activity.notify(ActivityLevel::Info, message, now);
                vec![Effect::RelaxLabel {
                    generation,
                    after: self.label_relax_delay,
                }]
            }
            CommandResolution::RolledBack => {
                self.activity
                    .notify(ActivityLevel::Error, "명령 전송 실패", now);
                Vec::new()
            }
            CommandResolution::Superseded => {
                debug!("이전 토글의 결과라 무시: gen={}", generation);
                Vec::new()
            }
        }
    }

    pub fn on_label_relax(&mut self, generation: u64) {
        self.status.relax_label(generation);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.render_trades();
        }
    }

    /// 타임컷 화면에서 한 건 숨김
    pub fn exclude(&mut self, id: TradeId, now: Instant) -> bool {
        let added = self.exclusions.exclude(id.clone());
        if added {
            self.activity
                .record(ActivityLevel::Info, format!("타임컷 내역 숨김: {}", id), now);
            self.render_trades();
        }
        added
    }

    /// 타임컷 매도를 모두 숨긴다
    pub fn exclude_time_cuts(&mut self, now: Instant) -> usize {
        let added = self.exclusions.exclude_time_cuts(&self.store);
        if added == 0 {
            self.activity
                .notify(ActivityLevel::Info, "삭제할 타임컷 내역이 없습니다", now);
        } else {
            self.activity.record(
                ActivityLevel::Success,
                format!("타임컷 내역 {}건 숨김", added),
                now,
            );
            self.render_trades();
        }
        added
    }

    pub fn restore_exclusions(&mut self, now: Instant) -> usize {
        let restored = self.exclusions.restore_all();
        self.activity.record(
            ActivityLevel::Info,
            format!("숨긴 타임컷 내역 {}건 복원", restored),
            now,
        );
        self.render_trades();
        restored
    }

    pub fn enter_view(&mut self, view: ActiveView, now: Instant) -> Vec<Effect> {
        self.active_view = view;
        if let Err(e) = self.preference.save(view) {
            warn!("화면 설정 저장 실패: {}", e);
        }
        self.activity
            .record(ActivityLevel::Info, format!("화면 전환: {}", view), now);

        if view == ActiveView::Reports {
            self.view_mode = ViewMode::All;
            return vec![Effect::SyncTradeLog(self.trade_log_request(true))];
        }
        Vec::new()
    }

    /// 설정 저장 결과. 성공하면 모드가 바뀌었을 수 있으니 미러를 통째로 다시 만든다.
    pub fn on_settings_saved(
        &mut self,
        result: Result<CommandReply, ClientError>,
        now: Instant,
    ) -> Vec<Effect> {
        match result {
            Ok(_) => {
                self.reset_mirror();
                self.activity
                    .record(ActivityLevel::Success, "설정 저장 완료", now);
                vec![
                    Effect::SyncTradeLog(self.trade_log_request(true)),
                    Effect::FetchStatus(self.holdings.issue()),
                ]
            }
            Err(e) => {
                self.activity
                    .record(ActivityLevel::Error, format!("설정 저장 실패: {}", e), now);
                Vec::new()
            }
        }
    }

    pub fn on_log_cleared(
        &mut self,
        kind: TradeKind,
        result: Result<CommandReply, ClientError>,
        now: Instant,
    ) -> Vec<Effect> {
        match result {
            Ok(_) => {
                self.activity.record(
                    ActivityLevel::Success,
                    format!("{} 내역 삭제 완료", kind.label()),
                    now,
                );
                vec![Effect::SyncTradeLog(self.trade_log_request(true))]
            }
            Err(e) => {
                self.activity.record(
                    ActivityLevel::Error,
                    format!("{} 내역 삭제 실패: {}", kind.label(), e),
                    now,
                );
                Vec::new()
            }
        }
    }

    pub fn clear_activity(&mut self, now: Instant) {
        self.activity.clear(now);
    }

    /// 저장소, 통계, 화면 해시를 비운다. 숨김 목록은 유지.
    fn reset_mirror(&mut self) {
        self.store.reset();
        self.store_epoch += 1;
        self.holdings.invalidate();
        self.trades.invalidate();
        self.render_trades();
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn status(&self) -> &StatusController {
        &self.status
    }

    pub fn summary(&self) -> Option<&SummaryView> {
        self.summary.as_ref()
    }

    pub fn stats(&self) -> Option<StatsView> {
        self.store.stats().map(StatsView::from)
    }

    pub fn holdings_surface(&self) -> &TableSurface {
        &self.holdings_surface
    }

    pub fn trades_surface(&self) -> &TableSurface {
        &self.trades_surface
    }

    pub fn recent(&self) -> &[String] {
        &self.recent
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn notices(&mut self, now: Instant) -> Vec<Notice> {
        self.activity.active_notices(now)
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn active_view(&self) -> ActiveView {
        self.active_view
    }

    /// 터미널 출력용 화면
    pub fn render_text(&self) -> String {
        let mut lines = vec![format!(
            "[{}] 화면: {} | 봇: {}",
            self.link,
            self.active_view,
            self.status.label()
        )];

        if let Some(summary) = &self.summary {
            lines.extend(summary.lines());
        }

        lines.push(String::new());
        lines.push("보유 종목".to_string());
        push_table(&mut lines, &self.holdings_surface);

        lines.push(String::new());
        lines.push(format!("매매 로그 ({})", self.view_mode));
        lines.push(headers(self.view_mode).join(" | "));
        push_table(&mut lines, &self.trades_surface);

        if let Some(stats) = self.stats() {
            lines.push(String::new());
            lines.extend(stats.lines());
        }

        lines.push(String::new());
        lines.push("최근 체결".to_string());
        if self.recent.is_empty() {
            lines.push(format!("  {}", RECENT_PLACEHOLDER));
        } else {
            lines.extend(self.recent.iter().map(|line| format!("  {}", line)));
        }

        lines.push(String::new());
        lines.push("활동 로그".to_string());
        lines.extend(
            self.activity
                .entries()
                .take(10)
                .map(|entry| format!("  {}", entry)),
        );

        lines.join("\n")
    }
}

fn push_table(lines: &mut Vec<String>, surface: &TableSurface) {
    if let Some(placeholder) = surface.placeholder() {
        lines.push(format!("  {}", placeholder));
        return;
    }
    for row in surface.rows() {
        let cells: Vec<&str> = row.cells.iter().map(|c| c.text.as_str()).collect();
        lines.push(format!("  {}", cells.join(" | ")));
    }
}
