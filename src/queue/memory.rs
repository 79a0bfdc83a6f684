//! In-memory queue gateway that records every submission.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{QueueError, QueueGateway};

/// A recorded resubmission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub queue: String,
    pub job_name: String,
    pub args: Vec<Value>,
    /// `None` for immediate submissions.
    pub delay: Option<Duration>,
}

impl Submission {
    /// Returns whether this was an immediate submission.
    pub fn is_immediate(&self) -> bool {
        self.delay.is_none()
    }
}

/// Gateway that keeps submissions in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryQueueGateway {
    submissions: Mutex<Vec<Submission>>,
}

impl MemoryQueueGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all submissions so far.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .expect("submissions lock poisoned")
            .clone()
    }

    /// Removes and returns all recorded submissions.
    pub fn drain(&self) -> Vec<Submission> {
        std::mem::take(&mut *self.submissions.lock().expect("submissions lock poisoned"))
    }

    pub fn len(&self) -> usize {
        self.submissions
            .lock()
            .expect("submissions lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, submission: Submission) {
        self.submissions
            .lock()
            .expect("submissions lock poisoned")
            .push(submission);
    }
}

#[async_trait]
impl QueueGateway for MemoryQueueGateway {
    async fn enqueue_now(
        &self,
        queue: &str,
        job_name: &str,
        args: &[Value],
    ) -> Result<(), QueueError> {
        self.record(Submission {
            queue: queue.to_string(),
            job_name: job_name.to_string(),
            args: args.to_vec(),
            delay: None,
        });
        Ok(())
    }

    async fn enqueue_after(
        &self,
        queue: &str,
        delay: Duration,
        job_name: &str,
        args: &[Value],
    ) -> Result<(), QueueError> {
        self.record(Submission {
            queue: queue.to_string(),
            job_name: job_name.to_string(),
            args: args.to_vec(),
            delay: Some(delay),
        });
        Ok(())
    }
}
