//! Run poller
//!
//! Waits for a submitted task to reach a terminal state by querying its
//! status at a fixed interval. The status query and the sleep are both
//! injected, so the same loop serves every call site and runs
//! deterministically in tests.
//!
//! The poller only reads. Cleanup of the task is left to the caller.

use async_trait::async_trait;
use runwatch_core::domain::task::TaskStatus;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::service::StatusSource;

/// Default delay between status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default upper bound on the total wait
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Errors returned by the poller
#[derive(Debug, Error)]
pub enum PollError {
    /// Interval or budget is unusable; raised before any status query
    #[error("Invalid poll configuration: {0}")]
    Configuration(String),

    /// The task reached `Failed`; `detail` is what the service reported
    #[error("Task {task_id} failed: {detail}")]
    RemoteFailure { task_id: String, detail: String },

    /// The budget ran out while the task was still non-terminal
    #[error("Timed out after {waited:?} waiting for task {task_id} (last status: {last_status})")]
    Timeout {
        task_id: String,
        waited: Duration,
        last_status: TaskStatus,
    },

    /// The caller's cancellation token fired
    #[error("Stopped waiting for task {task_id}: cancelled")]
    Cancelled { task_id: String },

    /// A status query itself failed
    #[error("Status query failed: {0}")]
    Status(#[from] ClientError),
}

impl PollError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteFailure { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Outcome of a task that reached `Succeeded`
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub task_id: String,
    /// Result payload supplied by the service, `Null` if it sent none
    pub payload: serde_json::Value,
    /// Number of status queries issued, including the final one
    pub polls: u64,
}

/// Polling interval and wait budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    max_wait: Option<Duration>,
}

impl PollConfig {
    /// Creates a configuration; checked when polling starts
    ///
    /// `max_wait` of `None` polls until the task is terminal.
    pub fn new(interval: Duration, max_wait: Option<Duration>) -> Self {
        Self { interval, max_wait }
    }

    /// Creates a configuration from signed millisecond values
    ///
    /// Zero or negative values are rejected.
    pub fn from_millis(interval_ms: i64, max_wait_ms: Option<i64>) -> Result<Self, PollError> {
        let interval = positive_millis("poll interval", interval_ms)?;
        let max_wait = max_wait_ms
            .map(|ms| positive_millis("max wait", ms))
            .transpose()?;

        Ok(Self { interval, max_wait })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), PollError> {
        if self.interval.is_zero() {
            return Err(PollError::Configuration(
                "poll interval must be greater than 0".to_string(),
            ));
        }

        if self.max_wait.is_some_and(|max| max.is_zero()) {
            return Err(PollError::Configuration(
                "max wait must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, Some(DEFAULT_MAX_WAIT))
    }
}

fn positive_millis(name: &str, ms: i64) -> Result<Duration, PollError> {
    if ms <= 0 {
        return Err(PollError::Configuration(format!(
            "{} must be greater than 0 (got {} ms)",
            name, ms
        )));
    }
    Ok(Duration::from_millis(ms as u64))
}

/// Suspension primitive used between polls
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polls one task at a time until it is terminal or the budget runs out
///
/// Independent pollers share nothing and may run concurrently, one per
/// task handle.
pub struct RunPoller<Z: Sleeper = TokioSleeper> {
    config: PollConfig,
    sleeper: Z,
    cancel: Option<CancellationToken>,
}

impl RunPoller {
    /// Creates a poller sleeping on the tokio timer
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            sleeper: TokioSleeper,
            cancel: None,
        }
    }
}

impl<Z: Sleeper> RunPoller<Z> {
    /// Replaces the sleeper
    pub fn with_sleeper<Y: Sleeper>(self, sleeper: Y) -> RunPoller<Y> {
        RunPoller {
            config: self.config,
            sleeper,
            cancel: self.cancel,
        }
    }

    /// Stops the loop at the next cycle once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Waits for `handle` to reach a terminal state
    ///
    /// Returns the success payload, or fails with
    /// [`PollError::RemoteFailure`], [`PollError::Timeout`],
    /// [`PollError::Cancelled`] or [`PollError::Status`]. No query is made
    /// after a terminal status has been seen, and an already-terminal first
    /// status returns without sleeping.
    pub async fn await_completion<S>(
        &self,
        source: &S,
        handle: &S::Handle,
    ) -> Result<TaskResult, PollError>
    where
        S: StatusSource + ?Sized,
    {
        self.config.validate()?;

        let task_id = handle.to_string();
        let started = Instant::now();
        let mut slept = Duration::ZERO;
        let mut polls: u64 = 0;
        let mut last_status: Option<TaskStatus> = None;

        loop {
            if self.cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
                info!("Polling for task {} cancelled after {} poll(s)", task_id, polls);
                return Err(PollError::Cancelled { task_id });
            }

            let task = source.get_status(handle).await?;
            polls = polls.saturating_add(1);

            debug!("Poll {} for task {}: {:?}", polls, task_id, task.status);
            if last_status != Some(task.status) {
                info!("Task {} status: {}", task_id, task.status);
                last_status = Some(task.status);
            }

            match task.status {
                TaskStatus::Succeeded => {
                    return Ok(TaskResult {
                        task_id,
                        payload: task.result.unwrap_or(serde_json::Value::Null),
                        polls,
                    });
                }
                TaskStatus::Failed => {
                    let detail = task
                        .error
                        .unwrap_or_else(|| "no error detail provided".to_string());
                    return Err(PollError::RemoteFailure { task_id, detail });
                }
                TaskStatus::Pending | TaskStatus::Running | TaskStatus::WaitingOnExternalAction => {}
            }

            // Injected sleepers may not advance the clock, so count slept time too.
            let elapsed = started.elapsed().max(slept);
            let wait = match self.config.max_wait {
                Some(max_wait) if elapsed >= max_wait => {
                    warn!(
                        "Gave up on task {} after {:?} ({} poll(s), last status {})",
                        task_id, elapsed, polls, task.status
                    );
                    return Err(PollError::Timeout {
                        task_id,
                        waited: elapsed,
                        last_status: task.status,
                    });
                }
                Some(max_wait) => self.config.interval.min(max_wait - elapsed),
                None => self.config.interval,
            };

            self.sleeper.sleep(wait).await;
            slept += wait;
        }
    }
}

/// Waits for `handle` using the tokio timer
///
/// Shorthand for `RunPoller::new(*config).await_completion(source, handle)`.
pub async fn await_completion<S>(
    source: &S,
    handle: &S::Handle,
    config: &PollConfig,
) -> Result<TaskResult, PollError>
where
    S: StatusSource + ?Sized,
{
    RunPoller::new(*config).await_completion(source, handle).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use runwatch_core::domain::task::Task;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays a fixed status sequence, repeating the last entry forever
    struct ScriptedSource {
        script: Mutex<VecDeque<Task>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(tasks: Vec<Task>) -> Self {
            Self {
                script: Mutex::new(tasks.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn statuses(id: &str, statuses: &[TaskStatus]) -> Self {
            Self::new(statuses.iter().map(|s| Task::new(id, *s)).collect())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        type Handle = String;

        async fn get_status(&self, _handle: &String) -> crate::Result<Task> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let task = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            };
            Ok(task.expect("script must not be empty"))
        }
    }

    struct UnreachableSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusSource for UnreachableSource {
        type Handle = String;

        async fn get_status(&self, _handle: &String) -> crate::Result<Task> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::api_error(503, "service unavailable"))
        }
    }

    /// Records requested sleeps without suspending
    #[derive(Clone, Default)]
    struct RecordingSleeper {
        sleeps: Arc<Mutex<Vec<Duration>>>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl RecordingSleeper {
        fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            if let Some((n, token)) = &self.cancel_after {
                if sleeps.len() >= *n {
                    token.cancel();
                }
            }
        }
    }

    fn poller(interval_secs: u64, max_wait_secs: Option<u64>) -> (RunPoller<RecordingSleeper>, RecordingSleeper) {
        let sleeper = RecordingSleeper::default();
        let config = PollConfig::new(
            Duration::from_secs(interval_secs),
            max_wait_secs.map(Duration::from_secs),
        );
        (RunPoller::new(config).with_sleeper(sleeper.clone()), sleeper)
    }

    #[tokio::test]
    async fn test_returns_payload_after_three_sleeps() {
        let source = ScriptedSource::new(vec![
            Task::new("T1", TaskStatus::Pending),
            Task::new("T1", TaskStatus::Running),
            Task::new("T1", TaskStatus::Running),
            Task::succeeded("T1", serde_json::json!("42")),
        ]);
        let (poller, sleeper) = poller(1, Some(10));

        let result = poller
            .await_completion(&source, &"T1".to_string())
            .await
            .unwrap();

        assert_eq!(result.payload, serde_json::json!("42"));
        assert_eq!(result.task_id, "T1");
        assert_eq!(result.polls, 4);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(1); 3]);
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_no_queries_after_success() {
        let source = ScriptedSource::new(vec![
            Task::new("T2", TaskStatus::Running),
            Task::succeeded("T2", serde_json::json!({ "answer": 1 })),
            Task::failed("T2", "must never be observed"),
        ]);
        let (poller, sleeper) = poller(1, Some(10));

        let result = poller
            .await_completion(&source, &"T2".to_string())
            .await
            .unwrap();

        assert_eq!(result.payload["answer"], 1);
        assert_eq!(source.calls(), 2);
        assert_eq!(sleeper.sleeps().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_carries_exact_detail() {
        let source = ScriptedSource::new(vec![
            Task::new("T3", TaskStatus::Pending),
            Task::failed("T3", "rate_limit_exceeded: Try again in 7 seconds."),
        ]);
        let (poller, _sleeper) = poller(1, Some(10));

        let err = poller
            .await_completion(&source, &"T3".to_string())
            .await
            .unwrap_err();

        match err {
            PollError::RemoteFailure { task_id, detail } => {
                assert_eq!(task_id, "T3");
                assert_eq!(detail, "rate_limit_exceeded: Try again in 7 seconds.");
            }
            other => panic!("expected remote failure, got {:?}", other),
        }
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_initial_terminal_status_does_not_sleep() {
        let succeeded = ScriptedSource::new(vec![Task::succeeded("T4", serde_json::json!(null))]);
        let (poller_a, sleeper_a) = poller(1, Some(10));
        let result = poller_a
            .await_completion(&succeeded, &"T4".to_string())
            .await
            .unwrap();
        assert_eq!(result.polls, 1);
        assert!(sleeper_a.sleeps().is_empty());

        let failed = ScriptedSource::new(vec![Task::failed("T4", "bad input")]);
        let (poller_b, sleeper_b) = poller(1, Some(10));
        let err = poller_b
            .await_completion(&failed, &"T4".to_string())
            .await
            .unwrap_err();
        assert!(err.is_remote_failure());
        assert!(sleeper_b.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_times_out_when_never_terminal() {
        let source = ScriptedSource::statuses("T5", &[TaskStatus::Pending, TaskStatus::Running]);
        let (poller, sleeper) = poller(1, Some(10));

        let err = poller
            .await_completion(&source, &"T5".to_string())
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(!err.is_remote_failure());
        match err {
            PollError::Timeout {
                waited,
                last_status,
                ..
            } => {
                assert!(waited >= Duration::from_secs(10));
                assert_eq!(last_status, TaskStatus::Running);
            }
            other => panic!("expected timeout, got {:?}", other),
        }

        let total: Duration = sleeper.sleeps().iter().sum();
        assert_eq!(total, Duration::from_secs(10));
        assert_eq!(source.calls(), 11);
    }

    #[tokio::test]
    async fn test_last_sleep_is_clamped_to_budget() {
        let source = ScriptedSource::statuses("T6", &[TaskStatus::Running]);
        let (poller, sleeper) = poller(3, Some(10));

        let err = poller
            .await_completion(&source, &"T6".to_string())
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(
            sleeper.sleeps(),
            vec![
                Duration::from_secs(3),
                Duration::from_secs(3),
                Duration::from_secs(3),
                Duration::from_secs(1),
            ]
        );
    }

    #[tokio::test]
    async fn test_waiting_on_external_action_keeps_polling() {
        let source = ScriptedSource::new(vec![
            Task::new("T7", TaskStatus::WaitingOnExternalAction),
            Task::new("T7", TaskStatus::WaitingOnExternalAction),
            Task::new("T7", TaskStatus::Running),
            Task::succeeded("T7", serde_json::json!("done")),
        ]);
        let (poller, sleeper) = poller(2, None);

        let result = poller
            .await_completion(&source, &"T7".to_string())
            .await
            .unwrap();

        assert_eq!(result.payload, serde_json::json!("done"));
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(2); 3]);
    }

    #[tokio::test]
    async fn test_zero_interval_rejected_before_any_query() {
        let source = ScriptedSource::statuses("T8", &[TaskStatus::Running]);
        let (poller, sleeper) = poller(0, Some(10));

        let err = poller
            .await_completion(&source, &"T8".to_string())
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(source.calls(), 0);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_zero_budget_rejected_before_any_query() {
        let source = ScriptedSource::statuses("T9", &[TaskStatus::Running]);
        let (poller, _sleeper) = poller(1, Some(0));

        let err = poller
            .await_completion(&source, &"T9".to_string())
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn test_from_millis_rejects_non_positive_values() {
        assert!(PollConfig::from_millis(0, None).unwrap_err().is_configuration());
        assert!(PollConfig::from_millis(-250, Some(1000)).unwrap_err().is_configuration());
        assert!(PollConfig::from_millis(250, Some(-1)).unwrap_err().is_configuration());

        let config = PollConfig::from_millis(250, Some(5_000)).unwrap();
        assert_eq!(config.interval(), Duration::from_millis(250));
        assert_eq!(config.max_wait(), Some(Duration::from_secs(5)));

        let unbounded = PollConfig::from_millis(250, None).unwrap();
        assert_eq!(unbounded.max_wait(), None);
    }

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.max_wait(), Some(DEFAULT_MAX_WAIT));
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_first_query() {
        let source = ScriptedSource::statuses("T10", &[TaskStatus::Running]);
        let token = CancellationToken::new();
        token.cancel();
        let (poller, _sleeper) = poller(1, Some(10));
        let poller = poller.with_cancellation(token);

        let err = poller
            .await_completion(&source, &"T10".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled { ref task_id } if task_id == "T10"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_checked_at_cycle_boundary() {
        let source = ScriptedSource::statuses("T11", &[TaskStatus::Running]);
        let token = CancellationToken::new();
        let sleeper = RecordingSleeper {
            cancel_after: Some((2, token.clone())),
            ..Default::default()
        };
        let poller = RunPoller::new(PollConfig::new(Duration::from_secs(1), None))
            .with_sleeper(sleeper.clone())
            .with_cancellation(token);

        let err = poller
            .await_completion(&source, &"T11".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled { .. }));
        assert_eq!(source.calls(), 2);
        assert_eq!(sleeper.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn test_status_query_error_is_not_retried() {
        let source = UnreachableSource {
            calls: AtomicUsize::new(0),
        };
        let (poller, sleeper) = poller(1, Some(10));

        let err = poller
            .await_completion(&source, &"T12".to_string())
            .await
            .unwrap_err();

        match err {
            PollError::Status(inner) => assert!(inner.is_server_error()),
            other => panic!("expected status error, got {:?}", other),
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_free_function_uses_tokio_timer() {
        let source = ScriptedSource::new(vec![
            Task::new("T13", TaskStatus::Pending),
            Task::succeeded("T13", serde_json::json!([1, 2, 3])),
        ]);
        let config = PollConfig::from_millis(5, Some(5_000)).unwrap();

        let result = await_completion(&source, &"T13".to_string(), &config)
            .await
            .unwrap();

        assert_eq!(result.payload, serde_json::json!([1, 2, 3]));
        assert_eq!(result.polls, 2);
    }

    #[tokio::test]
    async fn test_missing_failure_detail_is_described() {
        let mut task = Task::new("T14", TaskStatus::Failed);
        task.error = None;
        let source = ScriptedSource::new(vec![task]);
        let (poller, _sleeper) = poller(1, Some(10));

        let err = poller
            .await_completion(&source, &"T14".to_string())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Task T14 failed: no error detail provided");
    }

    #[test]
    fn test_poll_count_outgrows_u32() {
        // Unbounded waits at millisecond intervals pass u32::MAX polls in ~49 days
        let result = TaskResult {
            task_id: "T15".to_string(),
            payload: serde_json::Value::Null,
            polls: u64::from(u32::MAX) + 1,
        };
        assert_eq!(result.polls, 4_294_967_296);
        assert_eq!(u64::MAX.saturating_add(1), u64::MAX);
    }
}
