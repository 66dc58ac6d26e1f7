//! Adaptive local tick scheduling.
//!
//! The host delivers a heartbeat roughly every 600ms, but actual delivery
//! times wander with network and processing latency. [`TickScheduler`] runs
//! its own repeating tick on a dedicated background thread, nudging the
//! interval a few milliseconds toward the heartbeat on every heartbeat, so
//! the local tick converges on the heartbeat's long-run pace without
//! inheriting its short-term jitter.

mod drift;


use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use thiserror::Error;
use tokio::runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use cadence_types::TimingSettings;

use crate::events::{SchedulerSignal, SignalHandler};
use drift::DriftModel;

/// Lifecycle of a [`TickScheduler`].
///
/// `Idle → Running` on the first heartbeat or an explicit [`TickScheduler::start`],
/// `Running → Idle` on [`TickScheduler::reset`], and either state to the
/// terminal `ShutDown` on [`TickScheduler::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    ShutDown,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler's background resource has been released; the instance
    /// cannot be re-armed.
    #[error("tick scheduler has been shut down")]
    ShutDown,

    /// The dedicated timer runtime could not be built. Fatal, reported at
    /// construction.
    #[error("failed to build tick runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Point-in-time view of the scheduler, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub state: SchedulerState,
    pub external_ticks: i64,
    pub local_ticks: i64,
    pub current_interval: std::time::Duration,
}

/// State shared between the heartbeat path and the timer task. One lock
/// serializes both, which is what makes cancel-before-fire well defined.
struct Shared {
    drift: DriftModel,
    state: SchedulerState,
    /// Bumped on every arm/disarm; a fire whose generation is stale belongs
    /// to a cancelled loop and must not run the callback.
    generation: u64,
    tick_loop: Option<JoinHandle<()>>,
    handlers: Vec<Box<dyn SignalHandler + Send>>,
}

/// Tracks tick timing independently of the host's heartbeat, with the
/// heartbeat's help: every heartbeat nudges the local interval a few
/// milliseconds toward the observed pace, imperceptibly drifting toward an
/// almost perfect average so local ticks land where heartbeats *should*,
/// free of delivery jitter.
///
/// The tick callback runs on the scheduler's background thread, serialized
/// with heartbeat processing. It must not call back into the scheduler. A
/// slow callback delays the next re-arm and thus skews timing; keeping it
/// brief is the consumer's responsibility.
pub struct TickScheduler {
    shared: Arc<Mutex<Shared>>,
    callback: Arc<dyn Fn() + Send + Sync>,
    /// Dedicated single-worker runtime driving the tick loop. Taken (and
    /// dropped, joining its thread) on shutdown.
    runtime: Mutex<Option<runtime::Runtime>>,
    handle: runtime::Handle,
}

impl TickScheduler {
    /// Build a scheduler around the given tick consumer. The timer does not
    /// arm until [`start`](Self::start) or the first
    /// [`on_external_tick`](Self::on_external_tick).
    pub fn new(
        timing: TimingSettings,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self, SchedulerError> {
        let timing = timing.normalized();
        let rt = runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("cadence-tick")
            .enable_time()
            .build()?;

        Ok(Self {
            shared: Arc::new(Mutex::new(Shared {
                drift: DriftModel::new(timing.base_interval(), timing.max_adjustment()),
                state: SchedulerState::Idle,
                generation: 0,
                tick_loop: None,
                handlers: Vec::new(),
            })),
            callback: Arc::new(callback),
            handle: rt.handle().clone(),
            runtime: Mutex::new(Some(rt)),
        })
    }

    /// Register a handler for diagnostic signals.
    pub fn add_signal_handler(&self, handler: Box<dyn SignalHandler + Send>) {
        self.lock_shared().handlers.push(handler);
    }

    /// Ingest one heartbeat from the external tick source.
    ///
    /// Updates drift state and, on the very first heartbeat, arms the local
    /// tick loop. Never invokes the tick callback directly. After
    /// [`shutdown`](Self::shutdown) this is a silent no-op: the heartbeat
    /// source typically outlives the scheduler during host teardown.
    pub fn on_external_tick(&self) {
        let now = Instant::now();
        let mut shared = self.lock_shared();

        if shared.state == SchedulerState::ShutDown {
            debug!("heartbeat after shutdown ignored");
            return;
        }

        let report = shared.drift.record_heartbeat(now);
        // Bootstrap: arm unless an explicit start() already did.
        if report.bootstrapped && shared.state == SchedulerState::Idle {
            self.arm(&mut shared, now);
        }

        if report.resynced {
            info!(
                external = report.external_ticks,
                local = report.local_ticks,
                "tick counters out of sync, forcing equal"
            );
            Self::dispatch(
                &mut shared,
                &SchedulerSignal::Resync {
                    external_ticks: report.external_ticks,
                    local_ticks: report.local_ticks,
                },
            );
        }

        debug!(
            external = report.external_ticks,
            local = report.local_ticks,
            diff = report.diff,
            interval_ms = report.interval.as_millis() as u64,
            delta_ms = report.delta_ms,
            "heartbeat"
        );
        Self::dispatch(
            &mut shared,
            &SchedulerSignal::Heartbeat {
                external_ticks: report.external_ticks,
                local_ticks: report.local_ticks,
                diff: report.diff,
                interval: report.interval,
                delta_ms: report.delta_ms,
            },
        );
    }

    /// Arm the tick loop. No-op when already running;
    /// [`SchedulerError::ShutDown`] after shutdown.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let now = Instant::now();
        let mut shared = self.lock_shared();
        match shared.state {
            SchedulerState::ShutDown => Err(SchedulerError::ShutDown),
            SchedulerState::Running => Ok(()),
            SchedulerState::Idle => {
                self.arm(&mut shared, now);
                Ok(())
            }
        }
    }

    /// Cancel any pending fire, zero all counters and timers, and return to
    /// `Idle`. Safe to call from any state, any number of times; after
    /// shutdown the scheduler stays terminal.
    pub fn reset(&self) {
        let mut shared = self.lock_shared();
        if shared.state == SchedulerState::ShutDown {
            return;
        }
        debug!("resetting tick scheduler");
        Self::disarm(&mut shared);
        shared.state = SchedulerState::Idle;
    }

    /// Reset, transition to the terminal state, and release the background
    /// runtime, joining its worker thread. Idempotent; the instance cannot
    /// be re-armed afterward.
    pub fn shutdown(&self) {
        {
            let mut shared = self.lock_shared();
            if shared.state != SchedulerState::ShutDown {
                info!("shutting down tick scheduler");
                Self::disarm(&mut shared);
                shared.state = SchedulerState::ShutDown;
            }
        }

        // Dropping the runtime blocks until its worker exits, and the worker
        // may be waiting on the state lock: release the lock first.
        let rt = self
            .runtime
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(rt);
    }

    /// Current lifecycle state and drift bookkeeping.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let shared = self.lock_shared();
        SchedulerSnapshot {
            state: shared.state,
            external_ticks: shared.drift.external_ticks(),
            local_ticks: shared.drift.local_ticks(),
            current_interval: shared.drift.current_interval(),
        }
    }

    /// Anchor the local clock and spawn the self-rescheduling tick loop.
    fn arm(&self, shared: &mut Shared, now: Instant) {
        info!(
            interval_ms = shared.drift.current_interval().as_millis() as u64,
            "starting local tick loop"
        );
        shared.drift.anchor_local(now);
        shared.state = SchedulerState::Running;
        shared.generation += 1;

        let generation = shared.generation;
        let inner = Arc::clone(&self.shared);
        let callback = Arc::clone(&self.callback);

        shared.tick_loop = Some(self.handle.spawn(async move {
            loop {
                // Each fire schedules the next one with whatever interval the
                // heartbeats have steered to by then.
                let interval = {
                    let guard = lock(&inner);
                    if guard.generation != generation || guard.state != SchedulerState::Running {
                        break;
                    }
                    guard.drift.current_interval()
                };

                tokio::time::sleep(interval).await;

                let mut guard = lock(&inner);
                // A reset/shutdown between the sleep and this lock wins: the
                // callback must not be observed after cancellation returns.
                if guard.generation != generation || guard.state != SchedulerState::Running {
                    break;
                }
                callback();
                guard.drift.record_local_tick(Instant::now());
            }
        }));
    }

    /// Invalidate the running loop and reset drift state. The generation
    /// bump is what guarantees an in-flight fire skips its callback.
    fn disarm(shared: &mut Shared) {
        shared.generation += 1;
        if let Some(tick_loop) = shared.tick_loop.take() {
            tick_loop.abort();
        }
        shared.drift.reset();
    }

    fn dispatch(shared: &mut Shared, signal: &SchedulerSignal) {
        for handler in &mut shared.handlers {
            handler.handle_signal(signal);
        }
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        lock(&self.shared)
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A panicking tick consumer must not wedge the scheduler: recover the
/// guard from a poisoned lock instead of propagating.
fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
