//! LeaderboardPoller processor.
//!
//! The LeaderboardPoller is responsible for:
//! - Fetching the contest ranking immediately on start, then once per
//!   interval
//! - Handing each successful snapshot to the `on_data` callback
//! - Keeping the last delivered snapshot when a fetch fails
//! - Discarding the result of a fetch that was in flight when `stop()` ran
//!
//! The poller is independent of the submission pipeline; it shares nothing
//! with the event channels.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ojlive_sdk::auth::AuthToken;
use ojlive_sdk::client::{ClientError, JudgeClient};
use ojlive_sdk::objects::{ContestId, RankingEntry, RankingSnapshot};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Default refresh cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Shortest interval the poller accepts; shorter values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Public data types
// ---------------------------------------------------------------------------

/// Where ranking rows come from.
#[async_trait]
pub trait RankingSource: Send + Sync + 'static {
    type Error: std::fmt::Display + Send;

    async fn fetch_ranking(
        &self,
        contest_id: &ContestId,
        token: &AuthToken,
    ) -> Result<Vec<RankingEntry>, Self::Error>;
}

#[async_trait]
impl RankingSource for JudgeClient {
    type Error = ClientError;

    async fn fetch_ranking(
        &self,
        contest_id: &ContestId,
        token: &AuthToken,
    ) -> Result<Vec<RankingEntry>, ClientError> {
        self.leaderboard(contest_id, token).await
    }
}

#[async_trait]
impl<S: RankingSource> RankingSource for Arc<S> {
    type Error = S::Error;

    async fn fetch_ranking(
        &self,
        contest_id: &ContestId,
        token: &AuthToken,
    ) -> Result<Vec<RankingEntry>, S::Error> {
        (**self).fetch_ranking(contest_id, token).await
    }
}

/// How rows are ordered before delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingOrder {
    /// Keep the order the backend returned.
    #[default]
    Server,
    /// Re-sort by total score, best first.
    ByScore,
}

/// Configuration for the LeaderboardPoller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub order: RankingOrder,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            order: RankingOrder::Server,
        }
    }
}

type DataCallback = Box<dyn FnMut(Arc<RankingSnapshot>) + Send>;

#[derive(Default)]
struct PollState {
    stopped: bool,
    latest: Option<Arc<RankingSnapshot>>,
}

/// State shared between the poll task and its handle.
///
/// `delivery` is held from the `stopped` check until `on_data` returns, and
/// `stop()` waits for it, so once `stop()` has returned no callback runs.
/// `state` is only ever locked briefly and never across the callback.
#[derive(Default)]
struct PollShared {
    state: Mutex<PollState>,
    delivery: Mutex<()>,
}

// ---------------------------------------------------------------------------
// LeaderboardPoller
// ---------------------------------------------------------------------------

pub struct LeaderboardPoller<S> {
    source: Arc<S>,
    config: PollerConfig,
}

impl<S: RankingSource> LeaderboardPoller<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        Self::from_shared(Arc::new(source), config)
    }

    pub fn from_shared(source: Arc<S>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> PollerConfig {
        self.config
    }

    /// Start polling `contest_id`.
    ///
    /// The first fetch happens right away.  `on_data` runs on the poll task
    /// for every successful fetch.  It may use its own [`PollHandle`],
    /// including stopping or dropping it.
    pub fn start<F>(&self, contest_id: ContestId, token: AuthToken, on_data: F) -> PollHandle
    where
        F: FnMut(Arc<RankingSnapshot>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let shared = Arc::new(PollShared::default());

        let task = tokio::spawn(run_poller(
            Arc::clone(&self.source),
            contest_id.clone(),
            token,
            self.config,
            Arc::clone(&shared),
            Box::new(on_data),
            stop_rx,
        ));

        PollHandle {
            contest_id,
            stop_tx,
            shared,
            task: Some(task),
        }
    }
}

// ---------------------------------------------------------------------------
// PollHandle
// ---------------------------------------------------------------------------

/// Owner's handle to a running poller.  Dropping it stops the poller.
pub struct PollHandle {
    contest_id: ContestId,
    stop_tx: watch::Sender<bool>,
    shared: Arc<PollShared>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn contest_id(&self) -> &ContestId {
        &self.contest_id
    }

    /// Stop polling.  Idempotent.
    ///
    /// Cancels the pending tick.  A fetch already in flight is left to
    /// finish, but its result is dropped.
    pub fn stop(&self) {
        {
            let mut state = self.lock_state();
            if !state.stopped {
                state.stopped = true;
                info!(contest_id = %self.contest_id, "Stopping leaderboard poller");
            }
        }
        self.stop_tx.send_replace(true);

        // From inside `on_data` the delivery lock is our own caller's.
        if !self.on_poll_task() {
            drop(
                self.shared
                    .delivery
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.lock_state().stopped
    }

    /// The last snapshot handed to `on_data`, if any.
    pub fn latest(&self) -> Option<Arc<RankingSnapshot>> {
        self.lock_state().latest.clone()
    }

    /// Stop the poller and wait for its task to exit.
    pub async fn stopped(mut self) {
        self.stop();
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(e) = task.await {
            error!(contest_id = %self.contest_id, error = %e, "Leaderboard poll task failed");
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, PollState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_poll_task(&self) -> bool {
        match (tokio::task::try_id(), &self.task) {
            (Some(current), Some(task)) => current == task.id(),
            _ => false,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollHandle")
            .field("contest_id", &self.contest_id)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Poll task
// ---------------------------------------------------------------------------

async fn run_poller<S: RankingSource>(
    source: Arc<S>,
    contest_id: ContestId,
    token: AuthToken,
    config: PollerConfig,
    shared: Arc<PollShared>,
    mut on_data: DataCallback,
    mut stop_rx: watch::Receiver<bool>,
) {
    let interval = config.interval.max(MIN_POLL_INTERVAL);
    // The first tick completes immediately.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(%contest_id, ?interval, order = ?config.order, "Leaderboard poller started");

    loop {
        tokio::select! {
            biased;

            _ = stop_requested(&mut stop_rx) => break,

            _ = ticker.tick() => {}
        }

        let fetched = source.fetch_ranking(&contest_id, &token).await;
        if !deliver(&contest_id, config.order, &shared, &mut on_data, fetched) {
            debug!(%contest_id, "Discarding leaderboard fetched after stop");
            break;
        }
    }

    info!(%contest_id, "Leaderboard poller stopped");
}

/// Hand a fetch result to `on_data` unless the poller has been stopped.
/// Returns `false` once stopped.
fn deliver<E: std::fmt::Display>(
    contest_id: &ContestId,
    order: RankingOrder,
    shared: &PollShared,
    on_data: &mut DataCallback,
    fetched: Result<Vec<RankingEntry>, E>,
) -> bool {
    let _delivering = shared.delivery.lock().unwrap_or_else(PoisonError::into_inner);
    let snapshot = {
        let mut state = shared.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.stopped {
            return false;
        }
        match fetched {
            Ok(entries) => {
                let mut snapshot = RankingSnapshot::new(entries, OffsetDateTime::now_utc());
                if order == RankingOrder::ByScore {
                    snapshot.sort_by_score();
                }
                let snapshot = Arc::new(snapshot);
                state.latest = Some(Arc::clone(&snapshot));
                Some(snapshot)
            }
            Err(e) => {
                warn!(%contest_id, error = %e, "Leaderboard fetch failed, keeping previous snapshot");
                None
            }
        }
    };
    if let Some(snapshot) = snapshot {
        debug!(%contest_id, rows = snapshot.entries.len(), "Delivering leaderboard snapshot");
        on_data(snapshot);
    }
    true
}

async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    loop {
        if *stop_rx.borrow_and_update() {
            return;
        }
        if stop_rx.changed().await.is_err() {
            return;
        }
    }
}
