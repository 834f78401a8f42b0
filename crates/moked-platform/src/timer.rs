//! Browser timer backed by `setTimeout` via gloo-timers.

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;

use moked_core::ports::Timer;

pub struct BrowserTimer;

#[async_trait(?Send)]
impl Timer for BrowserTimer {
    async fn sleep_ms(&self, ms: u32) {
        TimeoutFuture::new(ms).await;
    }
}
