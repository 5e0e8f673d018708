use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use hashpool::{DigestAlg, PoolConfig};

/// Runtime configuration for the `hashpool-tonic-server` binary.
///
/// These settings control the parallelism, buffering and request limits of
/// the hashing service. All values are parsed from CLI arguments or
/// environment variables (a `.env` file is loaded first), with defaults
/// suitable for production.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hashpool-tonic-server",
    version,
    about = "A gRPC service that hashes batches of strings in parallel"
)]
pub struct CliArgs {
    /// Number of worker tasks hashing strings for each request.
    ///
    /// Defaults to the number of logical CPUs. A request never runs more
    /// workers than it has strings.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS")]
    pub num_workers: Option<usize>,

    /// Capacity of the work queue all workers of a request pull from.
    ///
    /// Defaults to the number of strings in the request, so dispatching never
    /// waits. Smaller values bound memory at the cost of more backpressure.
    ///
    /// Environment variable: `WORK_QUEUE_CAPACITY`
    #[arg(long, env = "WORK_QUEUE_CAPACITY")]
    pub work_queue_capacity: Option<usize>,

    /// Capacity of the queue carrying finished digests to the collector.
    ///
    /// Defaults to the number of strings in the request.
    ///
    /// Environment variable: `RESULT_QUEUE_CAPACITY`
    #[arg(long, env = "RESULT_QUEUE_CAPACITY")]
    pub result_queue_capacity: Option<usize>,

    /// Maximum number of strings accepted in one request.
    ///
    /// Environment variable: `MAX_ALLOWED_STRINGS`
    #[arg(long, env = "MAX_ALLOWED_STRINGS", default_value_t = 1_000_000)]
    pub max_allowed_strings: usize,

    /// Digest algorithm: `sha3-256` or `sha256`.
    ///
    /// Environment variable: `DIGEST_ALG`
    #[arg(long = "digest", env = "DIGEST_ALG", default_value_t = String::from("sha3-256"))]
    pub digest: String,

    /// Upper bound on the time spent hashing a single request, in
    /// milliseconds. Unset means requests run until done or cancelled.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_MS`
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Seconds to wait for in-flight requests during shutdown before they are
    /// cancelled.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// TCP address to listen on, e.g. "0.0.0.0:50051".
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub pool: PoolConfig,
    pub digest: DigestAlg,
    pub max_allowed_strings: usize,
    pub request_timeout: Option<Duration>,
    pub shutdown_timeout: Duration,
    pub server_addr: String,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let mut pool = PoolConfig::default();

        if let Some(num_workers) = args.num_workers {
            if num_workers == 0 {
                bail!("NUM_WORKERS must be greater than 0");
            }
            pool = pool.with_workers(num_workers);
        }

        if let Some(capacity) = args.work_queue_capacity {
            if capacity == 0 {
                bail!("WORK_QUEUE_CAPACITY must be greater than 0");
            }
            pool = pool.with_work_queue_capacity(capacity);
        }

        if let Some(capacity) = args.result_queue_capacity {
            if capacity == 0 {
                bail!("RESULT_QUEUE_CAPACITY must be greater than 0");
            }
            pool = pool.with_result_queue_capacity(capacity);
        }

        if args.max_allowed_strings == 0 {
            bail!("MAX_ALLOWED_STRINGS must be greater than 0");
        }

        let request_timeout = match args.request_timeout_ms {
            Some(0) => bail!("REQUEST_TIMEOUT_MS must be greater than 0"),
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        let digest = args.digest.parse::<DigestAlg>()?;

        Ok(Self {
            pool,
            digest,
            max_allowed_strings: args.max_allowed_strings,
            request_timeout,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            server_addr: args.server_addr,
        })
    }
}
