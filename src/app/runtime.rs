// SPDX-License-Identifier: GPL-3.0-only

//! Headless event loop for [`CameraApp`]
//!
//! Polls every outstanding [`Task`] stream and feeds the produced messages back
//! into `update`, one at a time, on the calling task.

use super::state::Message;
use super::task::Task;
use super::CameraApp;
use futures::StreamExt;
use futures::stream::{BoxStream, SelectAll};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Drives a [`CameraApp`] and its pending tasks
pub struct Runtime {
    app: CameraApp,
    pending: SelectAll<BoxStream<'static, Message>>,
}

impl Runtime {
    pub fn new(app: CameraApp, init: Task<Message>) -> Self {
        let mut runtime = Self {
            app,
            pending: SelectAll::new(),
        };
        runtime.spawn(init);
        runtime
    }

    pub fn app(&self) -> &CameraApp {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut CameraApp {
        &mut self.app
    }

    pub fn into_app(self) -> CameraApp {
        self.app
    }

    /// Number of task streams still producing messages
    pub fn pending_tasks(&self) -> usize {
        self.pending.len()
    }

    fn spawn(&mut self, task: Task<Message>) {
        for stream in task.into_streams() {
            self.pending.push(stream);
        }
    }

    /// Handle one message and queue the task it returns
    pub fn dispatch(&mut self, message: Message) {
        debug!(?message, "Dispatching message");
        let task = self.app.update(message);
        self.spawn(task);
    }

    /// Process messages until no task produces one for `quiet`
    ///
    /// Long-lived streams (a running recorder) do not keep this from
    /// returning; it returns once they go quiet.
    pub async fn settle(&mut self, quiet: Duration) {
        loop {
            match tokio::time::timeout(quiet, self.pending.next()).await {
                Ok(Some(message)) => self.dispatch(message),
                Ok(None) | Err(_) => break,
            }
        }
    }

    /// Process messages for a fixed amount of time
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            match tokio::time::timeout_at(deadline, self.pending.next()).await {
                Ok(Some(message)) => self.dispatch(message),
                Ok(None) => {
                    tokio::time::sleep_until(deadline).await;
                    break;
                }
                Err(_) => break,
            }
        }
    }

    /// Process messages until `done` holds or `timeout` elapses
    ///
    /// Returns whether the condition was reached.
    pub async fn run_until(
        &mut self,
        mut done: impl FnMut(&CameraApp) -> bool,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        while !done(&self.app) {
            match tokio::time::timeout_at(deadline, self.pending.next()).await {
                Ok(Some(message)) => self.dispatch(message),
                Ok(None) | Err(_) => return done(&self.app),
            }
        }
        true
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("app", &self.app)
            .field("pending", &self.pending.len())
            .finish()
    }
}
