//! Cancellable delayed trigger.
//!
//! [`Debounce::schedule`] (re)arms a deadline one window from now, so a burst
//! of edits collapses into a single firing after the last one. Built on
//! `tokio::time` so it works under paused test time.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Arm (or push back) the deadline to one window from now.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve once the armed deadline passes, disarming it. Never resolves
    /// while disarmed, which makes it safe as a `select!` branch.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}
