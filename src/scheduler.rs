//! Polling loop around a [`Coordinator`].
//!
//! The loop runs on its own tokio task and is strictly sequential: the next
//! cycle is armed only after the current one has finished, so a fetch that
//! outlasts the interval delays the following cycle instead of overlapping
//! it. The [`MonitorHandle`] returned by [`spawn`] is the host's side of the
//! loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::config::{self, MonitorOptions};
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::fetcher::PageSource;
use crate::presentation::Presentation;

/// Host-side handle to a running monitor.
///
/// Dropping the handle stops the loop; a fetch in flight at that moment is
/// abandoned and nothing from it is committed.
pub struct MonitorHandle<S> {
    options_tx: watch::Sender<MonitorOptions>,
    view_rx: watch::Receiver<Option<Presentation>>,
    shutdown_tx: watch::Sender<bool>,
    refresh: Arc<Notify>,
    task: JoinHandle<Coordinator<S>>,
}

/// Start polling on the current tokio runtime.
///
/// The first cycle runs immediately.
pub fn spawn<S>(coordinator: Coordinator<S>) -> MonitorHandle<S>
where
    S: PageSource + 'static,
{
    let (options_tx, options_rx) = watch::channel(coordinator.options());
    let (view_tx, view_rx) = watch::channel(None);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh = Arc::new(Notify::new());

    let task = tokio::spawn(run(
        coordinator,
        options_rx,
        view_tx,
        shutdown_rx,
        Arc::clone(&refresh),
    ));

    MonitorHandle {
        options_tx,
        view_rx,
        shutdown_tx,
        refresh,
        task,
    }
}

impl<S> MonitorHandle<S> {
    /// Run a cycle as soon as the current one (if any) completes.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// Replace the runtime options.
    ///
    /// A new interval counts from now when the loop is waiting, or from the
    /// end of the running cycle when one is in flight.
    pub fn set_options(&self, options: MonitorOptions) -> Result<()> {
        config::check_interval(options.scan_interval)?;
        self.options_tx.send_replace(options);
        Ok(())
    }

    pub fn set_interval(&self, interval: Duration) -> Result<()> {
        config::check_interval(interval)?;
        self.options_tx
            .send_modify(|options| options.scan_interval = interval);
        Ok(())
    }

    pub fn set_verbose_errors(&self, verbose: bool) {
        self.options_tx
            .send_modify(|options| options.verbose_errors = verbose);
    }

    pub fn options(&self) -> MonitorOptions {
        *self.options_tx.borrow()
    }

    /// Receiver that observes every published [`Presentation`].
    pub fn subscribe(&self) -> watch::Receiver<Option<Presentation>> {
        self.view_rx.clone()
    }

    /// The most recently published presentation, if a cycle has completed.
    pub fn latest(&self) -> Option<Presentation> {
        self.view_rx.borrow().clone()
    }

    /// Stop the loop and hand back the coordinator with its history.
    ///
    /// Returns `None` if the polling task panicked.
    pub async fn shutdown(self) -> Option<Coordinator<S>> {
        self.shutdown_tx.send_replace(true);
        self.task.await.ok()
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

async fn run<S: PageSource>(
    mut coordinator: Coordinator<S>,
    mut options_rx: watch::Receiver<MonitorOptions>,
    view_tx: watch::Sender<Option<Presentation>>,
    mut shutdown_rx: watch::Receiver<bool>,
    refresh: Arc<Notify>,
) -> Coordinator<S> {
    info!(
        slug = %coordinator.target(),
        interval = coordinator.options().scan_interval.as_secs(),
        "monitor started"
    );

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                info!(slug = %coordinator.target(), "monitor stopped; in-flight refresh abandoned");
                return coordinator;
            }
            outcome = coordinator.refresh() => {
                debug!(slug = %coordinator.target(), updated = outcome.is_updated(), "cycle finished");
            }
        }
        view_tx.send_replace(Some(coordinator.presentation()));

        // Options changed during the cycle count from its completion.
        if options_rx.has_changed().unwrap_or(false) {
            apply(&mut coordinator, *options_rx.borrow_and_update());
        }
        let mut deadline = Instant::now() + coordinator.options().scan_interval;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!(slug = %coordinator.target(), "monitor stopped");
                    return coordinator;
                }
                _ = sleep_until(deadline) => break,
                _ = refresh.notified() => {
                    debug!(slug = %coordinator.target(), "refresh requested");
                    break;
                }
                changed = options_rx.changed() => {
                    if changed.is_err() {
                        return coordinator;
                    }
                    let options = *options_rx.borrow_and_update();
                    let previous = coordinator.options().scan_interval;
                    apply(&mut coordinator, options);
                    if coordinator.options().scan_interval != previous {
                        deadline = Instant::now() + coordinator.options().scan_interval;
                    }
                }
            }
        }
    }
}

fn apply<S: PageSource>(coordinator: &mut Coordinator<S>, options: MonitorOptions) {
    if let Err(e) = coordinator.apply_options(options) {
        warn!(slug = %coordinator.target(), error = %e, "ignoring invalid options");
    }
}
