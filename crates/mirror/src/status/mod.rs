use std::fmt::Display;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::client::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped,
}

impl RunState {
    pub fn from_running(running: bool) -> Self {
        if running {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            RunState::Running => RunState::Stopped,
            RunState::Stopped => RunState::Running,
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::Stopped => write!(f, "stopped"),
        }
    }
}

/// 토글로 발행된 명령. `generation` 으로 결과를 짝지어 돌려준다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    pub command: Command,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResolution {
    /// 성공. 라벨 완화를 예약하면 된다.
    Accepted,
    /// 실패. 토글 이전 상태로 되돌림.
    RolledBack,
    /// 이후 토글이 있어서 이 결과는 무시
    Superseded,
}

/// 봇 실행 상태의 낙관적 표시
///
/// 토글하면 서버 확인 전에 바로 반대 상태를 보여주고, 유예 시간 동안은 서버 push 를 화면에 반영하지 않는다.
/// push 는 저장해 두었다가 유예가 끝나면 `refresh` 에서 반영한다.
#[derive(Debug)]
pub struct StatusController {
    grace_window: Duration,
    displayed: RunState,
    authoritative: Option<RunState>,
    pending: bool,
    label_pending: bool,
    override_at: Option<Instant>,
    revert_to: RunState,
    generation: u64,
}

impl StatusController {
    pub fn new(grace_window: Duration) -> Self {
        Self {
            grace_window,
            displayed: RunState::Stopped,
            authoritative: None,
            pending: false,
            label_pending: false,
            override_at: None,
            revert_to: RunState::Stopped,
            generation: 0,
        }
    }

    pub fn displayed(&self) -> RunState {
        self.displayed
    }

    pub fn authoritative(&self) -> Option<RunState> {
        self.authoritative
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 버튼 문구. 실행 중이면 종료 버튼, 정지 중이면 시작 버튼.
    pub fn label(&self) -> String {
        let base = match self.displayed {
            RunState::Running => "⏹ 종료",
            RunState::Stopped => "▶ 시작",
        };
        if self.label_pending {
            format!("{} 대기..", base)
        } else {
            base.to_string()
        }
    }

    fn in_grace(&self, now: Instant) -> bool {
        match self.override_at {
            Some(at) => now.saturating_duration_since(at) <= self.grace_window,
            None => false,
        }
    }

    pub fn toggle(&mut self, now: Instant) -> Toggle {
        self.revert_to = self.displayed;
        self.displayed = self.displayed.opposite();
        self.pending = true;
        self.label_pending = true;
        self.override_at = Some(now);
        self.generation += 1;

        let command = match self.displayed {
            RunState::Running => Command::Start,
            RunState::Stopped => Command::Stop,
        };
        debug!(
            "낙관적 토글: {} -> {} (gen {})",
            self.revert_to, self.displayed, self.generation
        );

        Toggle {
            command,
            generation: self.generation,
        }
    }

    pub fn on_command_result(&mut self, generation: u64, succeeded: bool) -> CommandResolution {
        if generation != self.generation {
            return CommandResolution::Superseded;
        }
        if succeeded {
            return CommandResolution::Accepted;
        }

        // 서버 상태를 바로 다시 믿는다
        self.displayed = self.revert_to;
        self.pending = false;
        self.label_pending = false;
        self.override_at = None;
        CommandResolution::RolledBack
    }

    /// 명령 성공 후 "대기.." 를 떼어낸다. 유예 시간과 pending 은 그대로.
    pub fn relax_label(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.label_pending || !self.pending {
            return false;
        }
        self.label_pending = false;
        true
    }

    /// 서버 push 반영. 화면이 바뀌었으면 true.
    pub fn on_authoritative(&mut self, state: RunState, now: Instant) -> bool {
        self.authoritative = Some(state);
        if self.in_grace(now) {
            debug!("유예 시간 중이라 서버 상태({}) 반영 보류", state);
            return false;
        }
        self.settle(state)
    }

    /// 유예가 끝났으면 마지막 서버 상태로 맞춘다
    pub fn refresh(&mut self, now: Instant) -> bool {
        if self.override_at.is_none() || self.in_grace(now) {
            return false;
        }
        match self.authoritative {
            Some(state) => self.settle(state),
            None => {
                let changed = self.pending || self.label_pending;
                self.pending = false;
                self.label_pending = false;
                self.override_at = None;
                changed
            }
        }
    }

    fn settle(&mut self, state: RunState) -> bool {
        let changed = self.displayed != state || self.pending || self.label_pending;
        self.displayed = state;
        self.pending = false;
        self.label_pending = false;
        self.override_at = None;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_secs(10);

    #[test]
    fn test_push_inside_grace_is_held_back() {
        let t0 = Instant::now();
        let mut status = StatusController::new(GRACE);
        status.on_authoritative(RunState::Stopped, t0);

        let toggle = status.toggle(t0);
        assert_eq!(toggle.command, Command::Start);
        assert_eq!(status.displayed(), RunState::Running);
        assert_eq!(status.label(), "⏹ 종료 대기..");

        assert!(!status.on_authoritative(RunState::Stopped, t0 + Duration::from_secs(5)));
        assert_eq!(status.displayed(), RunState::Running);
        assert!(status.is_pending());

        assert!(status.refresh(t0 + Duration::from_secs(11)));
        assert_eq!(status.displayed(), RunState::Stopped);
        assert!(!status.is_pending());
        assert_eq!(status.label(), "▶ 시작");
    }

    #[test]
    fn test_failure_rolls_back_and_trusts_server_again() {
        let t0 = Instant::now();
        let mut status = StatusController::new(GRACE);
        status.on_authoritative(RunState::Running, t0);

        let toggle = status.toggle(t0);
        assert_eq!(toggle.command, Command::Stop);
        assert_eq!(
            status.on_command_result(toggle.generation, false),
            CommandResolution::RolledBack
        );
        assert_eq!(status.displayed(), RunState::Running);
        assert!(!status.is_pending());

        // 유예가 풀렸으므로 바로 반영
        assert!(status.on_authoritative(RunState::Stopped, t0 + Duration::from_secs(1)));
        assert_eq!(status.displayed(), RunState::Stopped);
    }

    #[test]
    fn test_relax_label_keeps_grace() {
        let t0 = Instant::now();
        let mut status = StatusController::new(GRACE);
        let toggle = status.toggle(t0);

        assert_eq!(
            status.on_command_result(toggle.generation, true),
            CommandResolution::Accepted
        );
        assert!(status.relax_label(toggle.generation));
        assert_eq!(status.label(), "⏹ 종료");
        assert!(status.is_pending());

        assert!(!status.on_authoritative(RunState::Stopped, t0 + Duration::from_secs(2)));
        assert_eq!(status.displayed(), RunState::Running);
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let t0 = Instant::now();
        let mut status = StatusController::new(GRACE);
        let first = status.toggle(t0);
        let second = status.toggle(t0 + Duration::from_millis(300));

        assert_eq!(
            status.on_command_result(first.generation, false),
            CommandResolution::Superseded
        );
        assert!(!status.relax_label(first.generation));
        assert_eq!(status.displayed(), RunState::Stopped);
        assert_eq!(second.command, Command::Stop);
    }
}
