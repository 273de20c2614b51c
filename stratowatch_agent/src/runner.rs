//! Async driver for the refresh state machine.
//!
//! The controller decides, the runner does: fetches run as spawned tasks
//! that report back over a completion channel tagged with their request
//! generation, so at most one is in flight and late arrivals are dropped
//! by the controller rather than raced against.

use anyhow::Result;
use std::sync::Arc;
use stratowatch_core::refresh::{
    Decision, FetchOutcome, RefreshController, RefreshTrigger, RenderFrame,
};
use stratowatch_env::{FeedError, HostContext, SnapshotFeed};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::report;

pub struct RunnerOptions {
    /// Fetch one snapshot, render it, exit
    pub once: bool,
    /// Emit frames as JSON instead of the boxed report
    pub json: bool,
}

type Completion = (u64, Result<serde_json::Value, FeedError>);

pub struct Runner<C: HostContext, F: SnapshotFeed> {
    controller: RefreshController,
    context: Arc<C>,
    feed: Arc<F>,
    options: RunnerOptions,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<C: HostContext, F: SnapshotFeed> Runner<C, F> {
    pub fn new(
        controller: RefreshController,
        context: Arc<C>,
        feed: Arc<F>,
        options: RunnerOptions,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            context,
            feed,
            options,
            completions_tx,
            completions_rx,
        }
    }

    /// Runs the refresh loop until the process exits (or, with `once`,
    /// until the first fetch resolves).
    pub async fn run(mut self) -> Result<()> {
        let (trigger_tx, mut triggers) = mpsc::unbounded_channel();

        if !self.options.once {
            let interval = self.controller.config().refresh_interval;
            let context = self.context.clone();
            let tx = trigger_tx.clone();
            self.context.spawn("refresh-timer", async move {
                loop {
                    context.sleep(interval).await;
                    if tx.send(RefreshTrigger::Timer).is_err() {
                        break;
                    }
                }
            });
        }

        // Startup fetch; Manual so server-side caches are bypassed
        self.dispatch(RefreshTrigger::Manual);

        loop {
            tokio::select! {
                Some(trigger) = triggers.recv() => self.dispatch(trigger),
                Some((generation, result)) = self.completions_rx.recv() => {
                    match self.controller.on_fetch_complete(generation, result) {
                        FetchOutcome::Applied(frame) => {
                            self.render(&frame);
                            if self.options.once {
                                return Ok(());
                            }
                        }
                        FetchOutcome::Stale { generation } => {
                            debug!(generation, "Discarded stale response");
                        }
                        FetchOutcome::Failed(e) => {
                            if self.options.once {
                                return Err(e.into());
                            }
                            warn!("Refresh failed, keeping previous view: {e}");
                        }
                    }
                }
                else => return Ok(()),
            }
        }
    }

    fn dispatch(&mut self, trigger: RefreshTrigger) {
        match self.controller.on_trigger(trigger) {
            Decision::StartFetch { generation, query } => {
                info!(generation, "Fetching snapshot");
                let feed = self.feed.clone();
                let tx = self.completions_tx.clone();
                let fetch_timeout = self.controller.config().fetch_timeout;
                self.context.spawn("snapshot-fetch", async move {
                    let result = match tokio::time::timeout(fetch_timeout, feed.fetch(&query)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(FeedError::Timeout(fetch_timeout.as_millis() as u64)),
                    };
                    let _ = tx.send((generation, result));
                });
            }
            Decision::Redraw => {
                if let Some(frame) = self.controller.redraw() {
                    self.render(&frame);
                }
            }
            Decision::Coalesced => {
                debug!("Trigger coalesced into in-flight fetch");
            }
        }
    }

    fn render(&self, frame: &RenderFrame) {
        if self.options.json {
            match serde_json::to_string_pretty(frame) {
                Ok(text) => println!("{text}"),
                Err(e) => warn!("Failed to serialize frame: {e}"),
            }
        } else {
            report::print_frame(frame);
        }
    }
}
