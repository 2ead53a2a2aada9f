//! Test helper utilities for inviter integration tests

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use tempfile::TempDir;

use inviter::{Clock, InviterConfig, LedgerState, Pacing};
use shared::{GroupId, GroupRef};

pub const TARGET: GroupId = GroupId(111);
pub const DESTINATION: GroupId = GroupId(222);

/// Clock that never blocks: sleeping only advances the reported time
#[derive(Clone)]
pub struct RecordingClock {
    now: Arc<Mutex<DateTime<Local>>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    pub fn starting_at(now: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Number of recorded sleeps within `[min, max]`
    pub fn sleeps_between(&self, min: Duration, max: Duration) -> usize {
        self.sleeps().into_iter().filter(|d| *d >= min && *d <= max).count()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let step = chrono::Duration::from_std(duration).unwrap();
        *self.now.lock().unwrap() += step;
    }
}

pub fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Configuration against a fake API, numeric groups, only the activity filter on
pub fn test_config(api_url: &str, stats_file: &Path) -> InviterConfig {
    let mut config = InviterConfig::new("test-token", GroupRef::Id(TARGET), GroupRef::Id(DESTINATION));
    config.api_url = api_url.to_string();
    config.stats_file = stats_file.to_path_buf();
    config.shuffle_members = false;
    config.pacing = Pacing::default();
    config
}

/// Write a ledger document the way a previous run would have left it
pub fn write_ledger(dir: &TempDir, state: &LedgerState) -> std::path::PathBuf {
    let path = dir.path().join("stats.json");
    std::fs::write(&path, serde_json::to_string_pretty(state).unwrap()).unwrap();
    path
}

pub fn read_ledger(path: &Path) -> LedgerState {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
