//! System clock backed by the tokio timer

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::traits::Clock;

/// Local wall-clock time and real sleeps
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
