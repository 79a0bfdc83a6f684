//! Job definitions shared by the gateway and the orchestrator.
//!
//! - `JobInvocation`: one execution request (job, queue, arguments)
//! - `ResquePayload`: the JSON document stored in resque queues
//! - `JobHandler`: the wrapped job contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JobError;

/// A single request to execute a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInvocation {
    /// Name of the job (the resque class).
    pub job_name: String,
    /// Queue the job was pulled from and is resubmitted to.
    pub queue: String,
    /// Ordered job arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl JobInvocation {
    /// Creates a new invocation.
    pub fn new(job_name: impl Into<String>, queue: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            job_name: job_name.into(),
            queue: queue.into(),
            args,
        }
    }

    /// Payload for an immediate push onto the queue list.
    pub fn to_payload(&self) -> ResquePayload {
        ResquePayload {
            class: self.job_name.clone(),
            args: self.args.clone(),
            queue: None,
        }
    }

    /// Payload for the delayed schedule, which must remember its queue.
    pub fn to_delayed_payload(&self) -> ResquePayload {
        ResquePayload {
            queue: Some(self.queue.clone()),
            ..self.to_payload()
        }
    }
}

/// Resque job document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResquePayload {
    /// Job name.
    pub class: String,
    /// Job arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Target queue; only present on delayed entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
}

/// The job being protected by retries.
///
/// Invoked once per attempt and awaited to completion before any retry
/// decision is made.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Runs the job against its queue and arguments.
    async fn perform(&self, queue: &str, args: &[Value]) -> Result<(), JobError>;
}

#[async_trait]
impl<F> JobHandler for F
where
    F: Fn(&str, &[Value]) -> Result<(), JobError> + Send + Sync,
{
    async fn perform(&self, queue: &str, args: &[Value]) -> Result<(), JobError> {
        self(queue, args)
    }
}
