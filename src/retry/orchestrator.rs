//! Retry orchestration for a single job.
//!
//! [`RetryOrchestrator`] wraps a [`JobHandler`] and is re-entered once per
//! physical execution. It keeps no state between calls; everything durable
//! lives in the attempt counter. One call runs:
//!
//! ```text
//! identity ─▶ ensure + increment (attempt N) ─▶ run job ─▶ bound TTL
//!     success            ─▶ clear counter            ─▶ Succeeded
//!     failure, N < limit ─▶ resubmit (now / delayed) ─▶ RetryScheduled
//!     failure, N ≥ limit ─▶ clear counter            ─▶ Err(Exhausted)
//! ```
//!
//! The first execution observes N = 0. With a schedule of length L a job that
//! always fails is resubmitted L times and the (L+1)-th execution returns
//! `RetryError::Exhausted` reporting L+1 attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::RetryConfig;
use crate::error::{JobError, RetryError, StoreError};
use crate::metrics::{
    MetricsCollector, OUTCOME_EXHAUSTED, OUTCOME_RETRY_SCHEDULED, OUTCOME_SUCCEEDED,
};
use crate::queue::{JobHandler, JobInvocation, QueueGateway};
use crate::retry::counter::AttemptCounter;
use crate::retry::identity::{RetryIdentity, DEFAULT_KEY_PREFIX};
use crate::retry::policy::{FailureReporting, RetryPolicy};
use crate::retry::schedule::BackoffSchedule;
use crate::store::CounterStore;

/// Non-error result of one orchestrated attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The job succeeded and its counter was cleared.
    Succeeded { attempt: i64 },
    /// The job failed and was resubmitted with `delay`.
    RetryScheduled { attempt: i64, delay: Duration },
}

impl Outcome {
    /// Zero-based attempt number that produced this outcome.
    pub fn attempt(&self) -> i64 {
        match self {
            Outcome::Succeeded { attempt } | Outcome::RetryScheduled { attempt, .. } => *attempt,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

/// Wraps a job with distributed, counter-driven retries.
pub struct RetryOrchestrator {
    job_name: String,
    handler: Arc<dyn JobHandler>,
    counter: AttemptCounter,
    schedule: BackoffSchedule,
    gateway: Arc<dyn QueueGateway>,
    policy: RetryPolicy,
    metrics: MetricsCollector,
}

impl RetryOrchestrator {
    /// Creates an orchestrator with the default schedule, policy and key
    /// prefix.
    pub fn new(
        job_name: impl Into<String>,
        handler: Arc<dyn JobHandler>,
        store: Arc<dyn CounterStore>,
        gateway: Arc<dyn QueueGateway>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            handler,
            counter: AttemptCounter::new(store, DEFAULT_KEY_PREFIX),
            schedule: BackoffSchedule::default(),
            gateway,
            policy: RetryPolicy::default(),
            metrics: MetricsCollector::new(),
        }
    }

    /// Creates an orchestrator using the schedule, policy and key prefix
    /// from `config`.
    pub fn from_config(
        job_name: impl Into<String>,
        handler: Arc<dyn JobHandler>,
        store: Arc<dyn CounterStore>,
        gateway: Arc<dyn QueueGateway>,
        config: &RetryConfig,
    ) -> Self {
        Self::new(job_name, handler, store, gateway)
            .with_schedule(config.schedule.clone())
            .with_policy(config.policy())
            .with_key_prefix(config.key_prefix.clone())
    }

    /// Sets the backoff schedule.
    pub fn with_schedule(mut self, schedule: BackoffSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how retry-eligible failures are reported.
    pub fn with_reporting(mut self, reporting: FailureReporting) -> Self {
        self.policy.reporting = reporting;
        self
    }

    /// Sets the counter key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.counter = AttemptCounter::new(self.counter_store(), prefix);
        self
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Counter key used for the given arguments.
    pub fn retry_key(&self, args: &[Value]) -> String {
        self.counter.key(&self.job_name, &RetryIdentity::from_args(args))
    }

    /// Runs one attempt of the job for `invocation`.
    pub async fn run_invocation(&self, invocation: &JobInvocation) -> Result<Outcome, RetryError> {
        self.run(&invocation.queue, &invocation.args).await
    }

    /// Runs one attempt of the job and decides what happens next.
    ///
    /// # Errors
    ///
    /// - `RetryError::Store` if the counter cannot be created or incremented;
    ///   the job is not executed in that case.
    /// - `RetryError::Enqueue` if the retry cannot be resubmitted.
    /// - `RetryError::Exhausted` once the retry limit is reached.
    /// - `RetryError::RetryScheduled` for retried failures when the policy
    ///   reports every failure.
    pub async fn run(&self, queue: &str, args: &[Value]) -> Result<Outcome, RetryError> {
        let key = self.retry_key(args);

        self.counter.ensure(&key).await?;
        let attempt = self.counter.increment(&key).await?;

        debug!(job = %self.job_name, queue = queue, attempt = attempt, "Running job attempt");
        self.metrics.record_attempt(&self.job_name);

        let result = self.handler.perform(queue, args).await;

        let ttl = self.counter_ttl(attempt);
        let bounded = self.counter.bound(&key, ttl).await;
        self.tolerate("expire", &key, bounded);

        let failure = match result {
            Ok(()) => {
                let cleared = self.counter.clear(&key).await;
                self.tolerate("delete", &key, cleared);

                if attempt > 0 {
                    info!(job = %self.job_name, attempt = attempt, "Job succeeded after retries");
                }
                self.metrics.record_outcome(&self.job_name, OUTCOME_SUCCEEDED);
                return Ok(Outcome::Succeeded { attempt });
            }
            Err(e) => e,
        };

        if self.is_exhausted(attempt) {
            let cleared = self.counter.clear(&key).await;
            self.tolerate("delete", &key, cleared);

            let attempts = attempt + 1;
            error!(
                job = %self.job_name,
                queue = queue,
                attempts = attempts,
                error = %failure,
                "Job failed, retries exhausted"
            );
            self.metrics.record_outcome(&self.job_name, OUTCOME_EXHAUSTED);
            return Err(RetryError::Exhausted {
                job: self.job_name.clone(),
                attempts,
                source: failure,
            });
        }

        let delay = self.schedule.delay_for(attempt);
        self.resubmit(queue, delay, args).await?;

        info!(
            job = %self.job_name,
            queue = queue,
            attempt = attempt,
            delay_secs = delay.as_secs(),
            error = %failure,
            "Job failed, retry scheduled"
        );
        self.metrics.record_outcome(&self.job_name, OUTCOME_RETRY_SCHEDULED);

        match self.policy.reporting {
            FailureReporting::SuppressWhileRetrying => {
                Ok(Outcome::RetryScheduled { attempt, delay })
            }
            FailureReporting::ReportEveryFailure => Err(RetryError::RetryScheduled {
                job: self.job_name.clone(),
                attempt,
                delay,
                source: failure,
            }),
        }
    }

    fn is_exhausted(&self, attempt: i64) -> bool {
        usize::try_from(attempt).is_ok_and(|n| n >= self.schedule.retry_limit())
    }

    /// Lifetime for the counter after `attempt`: the delay for the attempt,
    /// clamped to the last schedule entry, plus the safety margin. Saturates
    /// instead of overflowing for very large delays.
    fn counter_ttl(&self, attempt: i64) -> Duration {
        let delays = self.schedule.delays();
        let index = usize::try_from(attempt.max(0)).unwrap_or(usize::MAX);
        let delay = delays
            .get(index.min(delays.len().saturating_sub(1)))
            .copied()
            .unwrap_or_default();
        delay.saturating_add(self.policy.ttl_margin)
    }

    async fn resubmit(
        &self,
        queue: &str,
        delay: Duration,
        args: &[Value],
    ) -> Result<(), RetryError> {
        if delay.is_zero() {
            self.gateway.enqueue_now(queue, &self.job_name, args).await?;
        } else {
            self.gateway.enqueue_after(queue, delay, &self.job_name, args).await?;
        }
        Ok(())
    }

    /// Logs a failed bookkeeping operation; it never changes the outcome.
    fn tolerate(&self, operation: &str, key: &str, result: Result<(), StoreError>) {
        if let Err(e) = result {
            warn!(
                job = %self.job_name,
                key = key,
                operation = operation,
                error = %e,
                "Attempt counter bookkeeping failed, counter will expire on its own"
            );
            self.metrics.record_bookkeeping_error(operation);
        }
    }

    fn counter_store(&self) -> Arc<dyn CounterStore> {
        self.counter.store()
    }
}

#[async_trait]
impl JobHandler for RetryOrchestrator {
    async fn perform(&self, queue: &str, args: &[Value]) -> Result<(), JobError> {
        self.run(queue, args)
            .await
            .map(|_| ())
            .map_err(|e| Box::new(e) as JobError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{MemoryQueueGateway, QueueError};
    use crate::store::MemoryCounterStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Job that fails a fixed number of times, then succeeds.
    struct FlakyJob {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyJob {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobHandler for FlakyJob {
        async fn perform(&self, _queue: &str, _args: &[Value]) -> Result<(), JobError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(format!("failure #{}", call + 1).into())
            } else {
                Ok(())
            }
        }
    }

    /// Gateway that refuses every submission.
    struct RejectingGateway;

    #[async_trait]
    impl QueueGateway for RejectingGateway {
        async fn enqueue_now(&self, _: &str, _: &str, _: &[Value]) -> Result<(), QueueError> {
            Err(QueueError::ConnectionFailed("queue down".to_string()))
        }

        async fn enqueue_after(
            &self,
            _: &str,
            _: Duration,
            _: &str,
            _: &[Value],
        ) -> Result<(), QueueError> {
            Err(QueueError::ConnectionFailed("queue down".to_string()))
        }
    }

    /// Store whose increments fail, as if the connection dropped.
    struct UnreachableStore;

    #[async_trait]
    impl CounterStore for UnreachableStore {
        async fn set_if_absent(&self, _: &str, _: i64) -> Result<bool, StoreError> {
            Err(StoreError::ConnectionFailed("connection refused".to_string()))
        }
        async fn increment(&self, _: &str) -> Result<i64, StoreError> {
            Err(StoreError::ConnectionFailed("connection refused".to_string()))
        }
        async fn expire(&self, _: &str, _: Duration) -> Result<(), StoreError> {
            Ok(())
        }
        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn get(&self, _: &str) -> Result<Option<i64>, StoreError> {
            Ok(None)
        }
        async fn ttl(&self, _: &str) -> Result<Option<Duration>, StoreError> {
            Ok(None)
        }
    }

    /// Memory store whose bookkeeping operations always fail.
    struct LeakyStore {
        inner: MemoryCounterStore,
    }

    #[async_trait]
    impl CounterStore for LeakyStore {
        async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, StoreError> {
            self.inner.set_if_absent(key, value).await
        }
        async fn increment(&self, key: &str) -> Result<i64, StoreError> {
            self.inner.increment(key).await
        }
        async fn expire(&self, _: &str, _: Duration) -> Result<(), StoreError> {
            Err(StoreError::ConnectionFailed("expire lost".to_string()))
        }
        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::ConnectionFailed("delete lost".to_string()))
        }
        async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
            self.inner.get(key).await
        }
        async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
            self.inner.ttl(key).await
        }
    }

    /// Store that creates counters but loses the connection before `INCR`.
    struct IncrementFailsStore {
        inner: MemoryCounterStore,
    }

    #[async_trait]
    impl CounterStore for IncrementFailsStore {
        async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, StoreError> {
            self.inner.set_if_absent(key, value).await
        }
        async fn increment(&self, _: &str) -> Result<i64, StoreError> {
            Err(StoreError::ConnectionFailed("connection reset".to_string()))
        }
        async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
            self.inner.expire(key, ttl).await
        }
        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }
        async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
            self.inner.get(key).await
        }
        async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
            self.inner.ttl(key).await
        }
    }

    fn args() -> Vec<Value> {
        vec![json!(42), json!("report.pdf")]
    }

    #[tokio::test]
    async fn test_success_clears_counter() {
        let store = Arc::new(MemoryCounterStore::new());
        let gateway = Arc::new(MemoryQueueGateway::new());
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(0)),
            store.clone(),
            gateway.clone(),
        );

        let outcome = orchestrator.run("default", &args()).await.unwrap();

        assert_eq!(outcome, Outcome::Succeeded { attempt: 0 });
        assert!(outcome.is_success());
        assert!(store.is_empty());
        assert!(gateway.is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_resubmits_immediately() {
        let store = Arc::new(MemoryCounterStore::new());
        let gateway = Arc::new(MemoryQueueGateway::new());
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            store.clone(),
            gateway.clone(),
        );

        let outcome = orchestrator.run("default", &args()).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::RetryScheduled {
                attempt: 0,
                delay: Duration::ZERO
            }
        );
        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 1);
        assert!(submissions[0].is_immediate());
        assert_eq!(submissions[0].job_name, "Render");
        assert_eq!(submissions[0].queue, "default");
        assert_eq!(submissions[0].args, args());

        let key = orchestrator.retry_key(&args());
        assert_eq!(store.get(&key).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_counter_ttl_covers_next_delay() {
        let store = Arc::new(MemoryCounterStore::new());
        let gateway = Arc::new(MemoryQueueGateway::new());
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            store.clone(),
            gateway,
        )
        .with_schedule(BackoffSchedule::from_secs(&[120, 240]))
        .with_policy(RetryPolicy::default().with_ttl_margin(Duration::from_secs(60)));

        orchestrator.run("default", &args()).await.unwrap();

        let key = orchestrator.retry_key(&args());
        let ttl = store.ttl(&key).await.unwrap().expect("ttl should be set");
        assert!(ttl <= Duration::from_secs(180));
        assert!(ttl > Duration::from_secs(170));
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts_and_clears() {
        let store = Arc::new(MemoryCounterStore::new());
        let gateway = Arc::new(MemoryQueueGateway::new());
        let job = Arc::new(FlakyJob::new(usize::MAX));
        let orchestrator =
            RetryOrchestrator::new("Render", job.clone(), store.clone(), gateway.clone())
                .with_schedule(BackoffSchedule::from_secs(&[0, 5]));

        orchestrator.run("default", &args()).await.unwrap();
        orchestrator.run("default", &args()).await.unwrap();
        let err = orchestrator.run("default", &args()).await.unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), Some(3));
        assert!(err.to_string().contains("Render"));
        assert!(err.to_string().contains("failure #3"));
        assert_eq!(job.calls(), 3);
        assert_eq!(gateway.len(), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_schedule_fails_on_first_error() {
        let store = Arc::new(MemoryCounterStore::new());
        let gateway = Arc::new(MemoryQueueGateway::new());
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            store.clone(),
            gateway.clone(),
        )
        .with_schedule(BackoffSchedule::new(Vec::new()));

        let err = orchestrator.run("default", &args()).await.unwrap_err();

        assert_eq!(err.attempts(), Some(1));
        assert!(gateway.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_before_running_job() {
        let job = Arc::new(FlakyJob::new(0));
        let orchestrator = RetryOrchestrator::new(
            "Render",
            job.clone(),
            Arc::new(UnreachableStore),
            Arc::new(MemoryQueueGateway::new()),
        );

        let err = orchestrator.run("default", &args()).await.unwrap_err();

        assert!(matches!(err, RetryError::Store(_)));
        assert_eq!(job.calls(), 0);
    }

    #[tokio::test]
    async fn test_resubmission_failure_propagates() {
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(RejectingGateway),
        );

        let err = orchestrator.run("default", &args()).await.unwrap_err();

        assert!(matches!(err, RetryError::Enqueue(_)));
        assert!(err.to_string().contains("queue down"));
    }

    #[tokio::test]
    async fn test_bookkeeping_failures_do_not_change_outcome() {
        let store = Arc::new(LeakyStore {
            inner: MemoryCounterStore::new(),
        });
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(0)),
            store.clone(),
            Arc::new(MemoryQueueGateway::new()),
        );

        let outcome = orchestrator.run("default", &args()).await.unwrap();

        assert!(outcome.is_success());
        // delete failed, so the counter leaks until it expires
        let key = orchestrator.retry_key(&args());
        assert_eq!(store.get(&key).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_bookkeeping_failures_keep_retry_scheduled() {
        let store = Arc::new(LeakyStore {
            inner: MemoryCounterStore::new(),
        });
        let gateway = Arc::new(MemoryQueueGateway::new());
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            store.clone(),
            gateway.clone(),
        )
        .with_schedule(BackoffSchedule::from_secs(&[0, 45]));

        let first = orchestrator.run("default", &args()).await.unwrap();
        let second = orchestrator.run("default", &args()).await.unwrap();

        assert_eq!(
            first,
            Outcome::RetryScheduled {
                attempt: 0,
                delay: Duration::ZERO
            }
        );
        assert_eq!(
            second,
            Outcome::RetryScheduled {
                attempt: 1,
                delay: Duration::from_secs(45)
            }
        );
        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 2);
        assert!(submissions[0].is_immediate());
        assert_eq!(submissions[1].delay, Some(Duration::from_secs(45)));
        assert_eq!(submissions[1].args, args());
    }

    #[tokio::test]
    async fn test_bookkeeping_failures_keep_exhaustion() {
        let store = Arc::new(LeakyStore {
            inner: MemoryCounterStore::new(),
        });
        let gateway = Arc::new(MemoryQueueGateway::new());
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            store.clone(),
            gateway.clone(),
        )
        .with_schedule(BackoffSchedule::from_secs(&[0]));

        orchestrator.run("default", &args()).await.unwrap();
        let err = orchestrator.run("default", &args()).await.unwrap_err();

        match &err {
            RetryError::Exhausted { job, attempts, .. } => {
                assert_eq!(job, "Render");
                assert_eq!(*attempts, 2);
            }
            other => panic!("expected exhaustion, got {}", other),
        }
        assert!(err.to_string().contains("failure #2"));
        assert_eq!(gateway.len(), 1);
        // delete failed, so the counter survives until it expires
        let key = orchestrator.retry_key(&args());
        assert_eq!(store.get(&key).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_increment_failure_aborts_before_running_job() {
        let store = Arc::new(IncrementFailsStore {
            inner: MemoryCounterStore::new(),
        });
        let job = Arc::new(FlakyJob::new(0));
        let gateway = Arc::new(MemoryQueueGateway::new());
        let orchestrator =
            RetryOrchestrator::new("Render", job.clone(), store.clone(), gateway.clone());

        let err = orchestrator.run("default", &args()).await.unwrap_err();

        assert!(matches!(err, RetryError::Store(_)));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(job.calls(), 0);
        assert!(gateway.is_empty());
        // the counter was created at its baseline but never advanced
        let key = orchestrator.retry_key(&args());
        assert_eq!(store.get(&key).await.unwrap(), Some(-1));
    }

    #[tokio::test]
    async fn test_huge_delay_schedules_retry_without_overflow() {
        let store = Arc::new(MemoryCounterStore::new());
        let gateway = Arc::new(MemoryQueueGateway::new());
        let config = RetryConfig::default()
            .with_schedule(BackoffSchedule::parse("18446744073709551615").unwrap());
        let orchestrator = RetryOrchestrator::from_config(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            store.clone(),
            gateway.clone(),
            &config,
        );

        let outcome = orchestrator.run("q", &[]).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::RetryScheduled {
                attempt: 0,
                delay: Duration::from_secs(u64::MAX)
            }
        );
        assert_eq!(gateway.len(), 1);
        assert_eq!(store.get(&orchestrator.retry_key(&[])).await.unwrap(), Some(0));
    }

    #[test]
    fn test_counter_ttl_clamps_to_last_delay() {
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(0)),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(MemoryQueueGateway::new()),
        )
        .with_schedule(BackoffSchedule::from_secs(&[10, 20]))
        .with_policy(RetryPolicy::default().with_ttl_margin(Duration::from_secs(60)));

        assert_eq!(orchestrator.counter_ttl(0), Duration::from_secs(70));
        assert_eq!(orchestrator.counter_ttl(1), Duration::from_secs(80));
        assert_eq!(orchestrator.counter_ttl(5), Duration::from_secs(80));

        let empty = orchestrator.with_schedule(BackoffSchedule::new(Vec::new()));
        assert_eq!(empty.counter_ttl(0), Duration::from_secs(60));

        let huge = empty.with_schedule(BackoffSchedule::from_secs(&[u64::MAX]));
        assert_eq!(huge.counter_ttl(0), Duration::MAX);
    }

    #[tokio::test]
    async fn test_report_every_failure_policy() {
        let gateway = Arc::new(MemoryQueueGateway::new());
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            Arc::new(MemoryCounterStore::new()),
            gateway.clone(),
        )
        .with_schedule(BackoffSchedule::from_secs(&[30]))
        .with_reporting(FailureReporting::ReportEveryFailure);

        let err = orchestrator.run("default", &args()).await.unwrap_err();

        match err {
            RetryError::RetryScheduled { attempt, delay, .. } => {
                assert_eq!(attempt, 0);
                assert_eq!(delay, Duration::from_secs(30));
            }
            other => panic!("unexpected error: {}", other),
        }
        // the retry is still scheduled
        assert_eq!(gateway.submissions()[0].delay, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_distinct_args_use_distinct_counters() {
        let store = Arc::new(MemoryCounterStore::new());
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            store.clone(),
            Arc::new(MemoryQueueGateway::new()),
        );

        let first = orchestrator.run("default", &[json!(1)]).await.unwrap();
        let second = orchestrator.run("default", &[json!(2)]).await.unwrap();

        assert_eq!(first.attempt(), 0);
        assert_eq!(second.attempt(), 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_orchestrator_is_a_job_handler() {
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(usize::MAX)),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(MemoryQueueGateway::new()),
        )
        .with_schedule(BackoffSchedule::new(Vec::new()));
        let handler: Arc<dyn JobHandler> = Arc::new(orchestrator);

        let err = handler.perform("default", &args()).await.unwrap_err();
        assert!(err.to_string().contains("failed after 1 attempts"));
    }

    #[test]
    fn test_custom_key_prefix() {
        let orchestrator = RetryOrchestrator::new(
            "Render",
            Arc::new(FlakyJob::new(0)),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(MemoryQueueGateway::new()),
        )
        .with_key_prefix("myapp:retry");

        assert!(orchestrator.retry_key(&args()).starts_with("myapp:retry:Render:"));
    }
}
