//! CLI command definitions for queue-retry.
//!
//! Operator tooling around the retry counters: compute the key a job would
//! use, print a backoff schedule, and inspect or reset live counters.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::retry::{
    AttemptCounter, BackoffSchedule, RetryIdentity, DEFAULT_KEY_PREFIX, DEFAULT_TTL_MARGIN,
};
use crate::store::RedisCounterStore;

/// Default Redis URL when neither the flag nor `REDIS_URL` is set.
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Retry counter tooling for resque-style job queues.
#[derive(Parser)]
#[command(name = "queue-retry")]
#[command(about = "Inspect and manage distributed job retry counters")]
#[command(version)]
#[command(
    long_about = "queue-retry manages the shared attempt counters used to retry failed queue jobs.\n\nExample usage:\n  queue-retry key SendEmail 42 '\"user@example.com\"'\n  queue-retry inspect SendEmail 42 '\"user@example.com\"' --redis-url redis://localhost:6379"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Print the retry identity and counter key for a job invocation.
    Key(KeyArgs),

    /// Print the attempt → delay table of a backoff schedule.
    Schedule(ScheduleArgs),

    /// Show the live attempt counter for a job invocation.
    Inspect(CounterArgs),

    /// Delete the attempt counter for a job invocation.
    Reset(CounterArgs),
}

/// Arguments for `queue-retry key`.
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Job name (resque class).
    pub job: String,

    /// Job arguments; each is parsed as JSON, or taken as a string if it is not valid JSON.
    pub args: Vec<String>,

    /// Counter key prefix.
    #[arg(long, env = "RETRY_KEY_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    pub prefix: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `queue-retry schedule`.
#[derive(Parser, Debug)]
pub struct ScheduleArgs {
    /// Comma-separated delays in seconds. Defaults to 0,60,600,3600,10800,21600.
    #[arg(long, env = "RETRY_BACKOFF_SCHEDULE")]
    pub schedule: Option<String>,

    /// Seconds added to each delay for the counter TTL.
    #[arg(long, env = "RETRY_TTL_MARGIN_SECS", default_value_t = DEFAULT_TTL_MARGIN.as_secs())]
    pub ttl_margin: u64,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `queue-retry inspect` and `queue-retry reset`.
#[derive(Parser, Debug)]
pub struct CounterArgs {
    /// Job name (resque class).
    pub job: String,

    /// Job arguments; each is parsed as JSON, or taken as a string if it is not valid JSON.
    pub args: Vec<String>,

    /// Redis connection URL.
    #[arg(long, env = "REDIS_URL", default_value = DEFAULT_REDIS_URL)]
    pub redis_url: String,

    /// Counter key prefix.
    #[arg(long, env = "RETRY_KEY_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    pub prefix: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Key(args) => run_key_command(args),
        Commands::Schedule(args) => run_schedule_command(args),
        Commands::Inspect(args) => run_inspect_command(args).await,
        Commands::Reset(args) => run_reset_command(args).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct KeyOutput {
    job: String,
    identity: String,
    key: String,
}

#[derive(Debug, Clone, Serialize)]
struct ScheduleEntry {
    attempt: usize,
    delay_secs: u64,
    counter_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
struct ScheduleOutput {
    retry_limit: usize,
    max_executions: usize,
    entries: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, Serialize)]
struct CounterOutput {
    key: String,
    exists: bool,
    attempt: Option<i64>,
    ttl_secs: Option<u64>,
}

fn run_key_command(args: KeyArgs) -> anyhow::Result<()> {
    let output = key_output(&args.job, &args.prefix, &parse_job_args(&args.args));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("identity: {}", output.identity);
        println!("key:      {}", output.key);
    }
    Ok(())
}

fn run_schedule_command(args: ScheduleArgs) -> anyhow::Result<()> {
    let schedule = match args.schedule.as_deref() {
        Some(input) => BackoffSchedule::parse(input)?,
        None => BackoffSchedule::default(),
    };
    let output = schedule_output(&schedule, Duration::from_secs(args.ttl_margin));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "retry limit: {} (a job runs at most {} times)",
        output.retry_limit, output.max_executions
    );
    println!("{:>8}  {:>10}  {:>12}", "attempt", "delay (s)", "ttl (s)");
    for entry in &output.entries {
        println!(
            "{:>8}  {:>10}  {:>12}",
            entry.attempt, entry.delay_secs, entry.counter_ttl_secs
        );
    }
    Ok(())
}

async fn run_inspect_command(args: CounterArgs) -> anyhow::Result<()> {
    let (counter, key) = connect_counter(&args).await?;

    let attempt = counter.current(&key).await?;
    let ttl = counter.ttl(&key).await?;
    let output = CounterOutput {
        key,
        exists: attempt.is_some(),
        attempt,
        ttl_secs: ttl.map(|t| t.as_secs()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("key:     {}", output.key);
    match output.attempt {
        Some(attempt) => {
            println!("attempt: {}", attempt);
            match output.ttl_secs {
                Some(secs) => println!("ttl:     {}s", secs),
                None => println!("ttl:     none"),
            }
        }
        None => println!("no counter (job never failed, or already finished)"),
    }
    Ok(())
}

async fn run_reset_command(args: CounterArgs) -> anyhow::Result<()> {
    let (counter, key) = connect_counter(&args).await?;

    let existed = counter.current(&key).await?.is_some();
    counter.clear(&key).await?;
    info!(key = %key, existed = existed, "Attempt counter reset");

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "key": key,
                "deleted": existed,
            }))?
        );
    } else if existed {
        println!("deleted {}", key);
    } else {
        println!("no counter at {}", key);
    }
    Ok(())
}

async fn connect_counter(args: &CounterArgs) -> anyhow::Result<(AttemptCounter, String)> {
    let store = RedisCounterStore::connect(&args.redis_url).await?;
    let counter = AttemptCounter::new(Arc::new(store), args.prefix.clone());
    let identity = RetryIdentity::from_args(&parse_job_args(&args.args));
    let key = counter.key(&args.job, &identity);
    Ok((counter, key))
}

fn key_output(job: &str, prefix: &str, args: &[Value]) -> KeyOutput {
    let identity = RetryIdentity::from_args(args);
    KeyOutput {
        job: job.to_string(),
        key: crate::retry::retry_key(prefix, job, &identity),
        identity: identity.to_string(),
    }
}

fn schedule_output(schedule: &BackoffSchedule, ttl_margin: Duration) -> ScheduleOutput {
    let entries = schedule
        .delays()
        .iter()
        .enumerate()
        .map(|(attempt, delay)| ScheduleEntry {
            attempt,
            delay_secs: delay.as_secs(),
            counter_ttl_secs: delay.saturating_add(ttl_margin).as_secs(),
        })
        .collect();

    ScheduleOutput {
        retry_limit: schedule.retry_limit(),
        max_executions: schedule.retry_limit() + 1,
        entries,
    }
}

/// Parses each CLI argument as JSON, falling back to a plain string.
fn parse_job_args(raw: &[String]) -> Vec<Value> {
    raw.iter()
        .map(|arg| serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.clone())))
        .collect()
}
