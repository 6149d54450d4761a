use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// 마지막으로 보던 화면
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    #[default]
    Dashboard,
    Reports,
    /// 예전 이름 "credentials" 도 설정 화면으로 읽는다
    #[serde(alias = "credentials")]
    Settings,
}

impl Display for ActiveView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveView::Dashboard => write!(f, "dashboard"),
            ActiveView::Reports => write!(f, "reports"),
            ActiveView::Settings => write!(f, "settings"),
        }
    }
}

impl FromStr for ActiveView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(ActiveView::Dashboard),
            "reports" => Ok(ActiveView::Reports),
            "settings" | "credentials" => Ok(ActiveView::Settings),
            _ => Err(format!("Invalid ActiveView: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPreference {
    active_view: ActiveView,
}

/// 재시작 후에도 남는 유일한 상태 (활성 화면)
#[derive(Debug, Clone)]
pub struct ViewPreference {
    path: PathBuf,
}

impl ViewPreference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 파일이 없거나 읽을 수 없으면 대시보드
    pub fn load(&self) -> ActiveView {
        match self.try_load() {
            Ok(Some(view)) => view,
            Ok(None) => ActiveView::default(),
            Err(e) => {
                warn!(
                    "화면 설정을 읽을 수 없어 대시보드로 시작합니다: {} ({})",
                    self.path.display(),
                    e
                );
                ActiveView::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<ActiveView>, PreferenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let stored: StoredPreference = serde_json::from_str(&raw)?;
        Ok(Some(stored.active_view))
    }

    pub fn save(&self, view: ActiveView) -> Result<(), PreferenceError> {
        let raw = serde_json::to_string_pretty(&StoredPreference { active_view: view })?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let pref = ViewPreference::new(dir.path().join("view.json"));

        assert_eq!(pref.load(), ActiveView::Dashboard);
        pref.save(ActiveView::Reports).unwrap();
        assert_eq!(pref.load(), ActiveView::Reports);
    }

    #[test]
    fn test_legacy_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.json");
        let pref = ViewPreference::new(&path);

        fs::write(&path, r#"{"active_view": "credentials"}"#).unwrap();
        assert_eq!(pref.load(), ActiveView::Settings);

        fs::write(&path, "{not json").unwrap();
        assert_eq!(pref.load(), ActiveView::Dashboard);
    }

    #[test]
    fn test_view_text() {
        assert_eq!("credentials".parse::<ActiveView>().unwrap(), ActiveView::Settings);
        assert_eq!(ActiveView::Reports.to_string(), "reports");
    }
}
