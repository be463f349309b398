use async_trait::async_trait;
use futures_util::FutureExt;
use std::any::Any;
use std::fmt::Debug;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::time::{sleep, Duration, Instant};

const DEFAULT_TICK: Duration = Duration::from_secs(1);
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// Executes scheduled actions
#[async_trait]
pub trait TaskRunner<A: Send + 'static>: Send {
    async fn run_task(&mut self, action: A) -> crate::Result<()>;
}

/// A periodic action and when it last completed
#[derive(Debug, Clone)]
pub struct ScheduledTask<A> {
    pub action: A,
    pub interval: Duration,
    pub last_run_at: Instant,
}

impl<A> ScheduledTask<A> {
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_run_at) >= self.interval
    }
}

/// Cooperative single-loop scheduler.
///
/// Due tasks run one at a time in registration order; a slow task delays
/// everything behind it in the same tick.
pub struct Scheduler<A> {
    tasks: Vec<ScheduledTask<A>>,
    tick: Duration,
    error_backoff: Duration,
}

impl<A> Scheduler<A>
where
    A: Copy + Debug + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            tick: DEFAULT_TICK,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Register an action; it first becomes due one interval from now
    pub fn register(&mut self, action: A, interval: Duration) {
        self.tasks.push(ScheduledTask {
            action,
            interval,
            last_run_at: Instant::now(),
        });
    }

    pub fn tasks(&self) -> &[ScheduledTask<A>] {
        &self.tasks
    }

    /// Actions due at `now`, in registration order
    pub fn due_actions(&self, now: Instant) -> Vec<A> {
        self.tasks
            .iter()
            .filter(|task| task.is_due(now))
            .map(|task| task.action)
            .collect()
    }

    /// Run every due task in order. Stops at the first error or panic; the
    /// failing task is left due so it runs again on a later tick.
    pub async fn run_pending<R>(&mut self, runner: &mut R) -> crate::Result<usize>
    where
        R: TaskRunner<A>,
    {
        let now = Instant::now();
        let mut ran = 0;

        for task in self.tasks.iter_mut() {
            if !task.is_due(now) {
                continue;
            }

            let action = task.action;
            tracing::debug!(?action, "Running scheduled task");
            match AssertUnwindSafe(runner.run_task(action)).catch_unwind().await {
                Ok(result) => result?,
                Err(panic) => {
                    return Err(
                        format!("task {:?} panicked: {}", action, panic_message(&*panic)).into(),
                    )
                }
            }
            task.last_run_at = Instant::now();
            ran += 1;
        }

        Ok(ran)
    }

    /// Poll tasks every tick until `shutdown` resolves.
    ///
    /// `shutdown` is only observed between ticks, so a running task always
    /// completes. A tick that fails is logged and followed by the error backoff.
    pub async fn run<R, F>(&mut self, runner: &mut R, shutdown: F)
    where
        R: TaskRunner<A>,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let pause = match self.run_pending(runner).await {
                Ok(_) => self.tick,
                Err(e) => {
                    tracing::error!(
                        "Unexpected error in scheduler tick: {}. Backing off {:?}",
                        e,
                        self.error_backoff
                    );
                    self.error_backoff
                }
            };

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = sleep(pause) => {}
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

impl<A> Default for Scheduler<A>
where
    A: Copy + Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
