use crate::{config::PoolConfig, digest::DigestAlg, error::Result, pool::map_ordered};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Computes digests of many strings in parallel, in input order.
///
/// A `HashPool` is only configuration: workers are spawned per call and torn
/// down before the call returns, so a single pool can serve any number of
/// concurrent invocations with no shared state between them.
///
/// ```
/// use hashpool::{CancellationToken, HashPool};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pool = HashPool::default();
/// let token = CancellationToken::new();
/// let input = vec!["a".to_string(), "b".to_string(), "a".to_string()];
///
/// let digests = pool.hash(input, &token).await.unwrap();
/// assert_eq!(digests.len(), 3);
/// assert_eq!(digests[0], digests[2]);
/// assert_ne!(digests[0], digests[1]);
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HashPool {
    config: PoolConfig,
    alg: DigestAlg,
}

impl HashPool {
    pub fn new(config: PoolConfig, alg: DigestAlg) -> Self {
        Self { config, alg }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn alg(&self) -> DigestAlg {
        self.alg
    }

    /// Returns the lowercase-hex digest of every string in `input`, where
    /// `output[i]` is the digest of `input[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`](crate::Error::Cancelled) if `cancel` fires
    /// before all digests are collected.
    pub async fn hash(
        &self,
        input: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        self.run(input, cancel, None).await
    }

    /// Like [`HashPool::hash`], but also gives up once `deadline` passes.
    ///
    /// The deadline aborts only this invocation; `cancel` is left untouched.
    pub async fn hash_with_deadline(
        &self,
        input: Vec<String>,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<Vec<String>> {
        self.run(input, cancel, Some(deadline)).await
    }

    async fn run(
        &self,
        input: Vec<String>,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<Vec<String>> {
        let alg = self.alg;
        map_ordered(
            input,
            move |value: String| alg.digest_hex(&value),
            &self.config,
            cancel,
            deadline,
        )
        .await
    }
}

/// Hashes `input` with SHA3-256 using one worker per available CPU.
///
/// Shorthand for `HashPool::default().hash(input, cancel)`.
pub async fn hash_strings_parallel(
    input: Vec<String>,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    HashPool::default().hash(input, cancel).await
}
