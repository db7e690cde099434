//! The rotation cycle.

use std::sync::Arc;

use tracing::{debug, info};

use super::schedule::{should_rotate, KeyStatus};
use crate::backend::{SecretBackend, VaultBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::LocksmithConfig;
use crate::consistency::{verify_consistency, BackendRead};
use crate::keygen::{FernetKeyGenerator, KeyGenerator};
use crate::keyset::KeySet;
use crate::store::{read_key_set, write_key_set};
use crate::{LocksmithError, Result};

/// Callback invoked after a rotated key set has been written everywhere.
pub type RotationCallback = Arc<dyn Fn(&CycleOutcome) + Send + Sync>;

/// Result of one successful cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Keys are fresh; nothing was written.
    Fresh {
        /// Where the key set stands in its schedule.
        status: KeyStatus,
    },
    /// Keys were rotated and written to every backend.
    Rotated {
        /// New creation time of the key set.
        creation_time: i64,
        /// Number of keys in the rotated set.
        key_count: usize,
        /// Backends written, in order.
        written: Vec<String>,
    },
}

impl CycleOutcome {
    /// Check if this cycle rotated the keys.
    pub fn is_rotated(&self) -> bool {
        matches!(self, Self::Rotated { .. })
    }
}

/// Rotates one key set replicated across several backends.
///
/// The locksmith:
/// - Reads the key set from every backend, in order
/// - Refuses to act unless every backend holds the same, well-formed set
/// - Rotates once the set is within the TTL of its nominal expiry
/// - Writes the rotated set to every backend, stopping at the first failure
///
/// Each call to [`smith`](Locksmith::smith) is one self-contained cycle;
/// nothing is carried over between cycles. Cycles against the same
/// backends must not overlap.
pub struct Locksmith {
    backends: Vec<Arc<dyn SecretBackend>>,
    key_path: String,
    ttl_secs: u64,
    generator: Arc<dyn KeyGenerator>,
    clock: Arc<dyn Clock>,
    callbacks: Vec<RotationCallback>,
}

impl Locksmith {
    /// Create a locksmith over `backends`, in read/write order.
    pub fn new(
        backends: Vec<Arc<dyn SecretBackend>>,
        key_path: impl Into<String>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            backends,
            key_path: key_path.into(),
            ttl_secs,
            generator: Arc::new(FernetKeyGenerator),
            clock: Arc::new(SystemClock),
            callbacks: Vec::new(),
        }
    }

    /// Create a locksmith with one [`VaultBackend`] per configured Vault.
    pub fn from_config(config: &LocksmithConfig) -> Result<Self> {
        config.validate()?;

        let backends = config
            .vaults
            .iter()
            .map(|vault| {
                VaultBackend::new(vault.clone())
                    .map(|b| Arc::new(b) as Arc<dyn SecretBackend>)
                    .map_err(|e| LocksmithError::invalid_config("vaults", e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(backends, config.key_path.clone(), config.ttl_secs))
    }

    /// Use a different key generator.
    pub fn with_generator(mut self, generator: Arc<dyn KeyGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a callback for rotation events.
    pub fn on_rotation(mut self, callback: RotationCallback) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Configured backends, in order.
    pub fn backends(&self) -> &[Arc<dyn SecretBackend>] {
        &self.backends
    }

    /// Secret path holding the key set.
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    /// Safety margin and write TTL in seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Read the key set from every backend, in order.
    ///
    /// The first read error aborts; absent key sets are returned as `None`.
    pub async fn read_all(&self) -> Result<Vec<BackendRead>> {
        let mut reads = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let key_set = read_key_set(backend.as_ref(), &self.key_path).await?;
            reads.push(BackendRead::new(backend.name(), key_set));
        }
        Ok(reads)
    }

    /// Read, verify and check the agreed key set.
    async fn read_verified(&self) -> Result<KeySet> {
        let reads = self.read_all().await?;
        let key_set = verify_consistency(reads)?;
        key_set.check_integrity()?;
        debug!(
            keys = key_set.len(),
            creation_time = key_set.creation_time,
            period = key_set.period,
            "Keys identical in every backend"
        );
        Ok(key_set)
    }

    /// Write `key_set` to every backend, in order.
    pub async fn write_all(&self, key_set: &KeySet) -> Result<Vec<String>> {
        write_key_set(&self.backends, &self.key_path, key_set, self.ttl_secs).await
    }

    /// Report the agreed key set's schedule without changing anything.
    pub async fn status(&self) -> Result<KeyStatus> {
        let key_set = self.read_verified().await?;
        Ok(KeyStatus::of(&key_set, self.clock.now(), self.ttl_secs))
    }

    /// Run one rotation cycle.
    ///
    /// Reads every backend, verifies they agree and that the key set is well
    /// formed, and rotates and rewrites the set if it is due. Any failure
    /// aborts the cycle; no write happens unless every earlier step
    /// succeeded.
    #[tracing::instrument(skip(self), fields(key_path = %self.key_path))]
    pub async fn smith(&self) -> Result<CycleOutcome> {
        let mut key_set = self.read_verified().await?;

        let now = self.clock.now();
        if !should_rotate(&key_set, now, self.ttl_secs) {
            debug!("All keys are fresh, no rotation needed");
            return Ok(CycleOutcome::Fresh {
                status: KeyStatus::of(&key_set, now, self.ttl_secs),
            });
        }

        info!(age_secs = key_set.age(now), "Time to rotate keys");
        key_set.rotate(self.generator.as_ref(), now)?;

        let written = self.write_all(&key_set).await?;
        info!(backends = written.len(), "Rotation complete");

        let outcome = CycleOutcome::Rotated {
            creation_time: key_set.creation_time,
            key_count: key_set.len(),
            written,
        };
        for callback in &self.callbacks {
            callback(&outcome);
        }
        Ok(outcome)
    }

    /// Create the first key set in every backend.
    ///
    /// Refuses with [`LocksmithError::AlreadyInitialized`] if any backend
    /// already holds a key set, in which case nothing is written.
    #[tracing::instrument(skip(self), fields(key_path = %self.key_path))]
    pub async fn bootstrap(&self, period_secs: u64, num_keys: usize) -> Result<KeyStatus> {
        if period_secs <= self.ttl_secs {
            return Err(LocksmithError::invalid_config(
                "period_secs",
                format!(
                    "period ({}s) must be longer than the TTL ({}s)",
                    period_secs, self.ttl_secs
                ),
            ));
        }
        let period = i64::try_from(period_secs)
            .map_err(|_| LocksmithError::invalid_config("period_secs", "period too large"))?;

        let reads = self.read_all().await?;
        if let Some(existing) = reads.iter().find(|r| r.key_set.is_some()) {
            return Err(LocksmithError::AlreadyInitialized {
                backend: existing.backend.clone(),
            });
        }

        let now = self.clock.now();
        let key_set = KeySet::generate(self.generator.as_ref(), period, num_keys, now)?;
        let written = self.write_all(&key_set).await?;
        info!(
            backends = written.len(),
            keys = key_set.len(),
            "Key set created"
        );

        Ok(KeyStatus::of(&key_set, now, self.ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::clock::FixedClock;
    use crate::config::VaultConfig;
    use crate::errors::{ConsistencyError, IntegrityError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PATH: &str = "secret/fernet-keys";
    const T: i64 = 1_700_000_000;

    struct Counter(AtomicUsize);

    impl KeyGenerator for Counter {
        fn generate_key(&self) -> Result<String> {
            Ok(format!("gen-{}", self.0.fetch_add(1, Ordering::SeqCst)))
        }
    }

    fn setup(n: usize, now: i64) -> (Locksmith, Vec<Arc<InMemoryBackend>>) {
        let mems: Vec<Arc<InMemoryBackend>> = (0..n)
            .map(|i| Arc::new(InMemoryBackend::new(format!("mem-{}", i))))
            .collect();
        let backends = mems
            .iter()
            .map(|m| m.clone() as Arc<dyn SecretBackend>)
            .collect();
        let locksmith = Locksmith::new(backends, PATH, 300)
            .with_generator(Arc::new(Counter(AtomicUsize::new(0))))
            .with_clock(Arc::new(FixedClock::new(now)));
        (locksmith, mems)
    }

    fn seeded() -> KeySet {
        KeySet::new(
            vec!["k1".into(), "k2".into(), "k3".into(), "k4".into()],
            T,
            3_600,
        )
    }

    #[tokio::test]
    async fn test_fresh_keys_are_left_alone() {
        let (locksmith, mems) = setup(2, T + 3_200);
        for m in &mems {
            m.insert_key_set(PATH, &seeded()).unwrap();
        }

        let outcome = locksmith.smith().await.unwrap();

        assert!(!outcome.is_rotated());
        assert!(mems.iter().all(|m| m.write_count() == 0));
    }

    #[tokio::test]
    async fn test_due_keys_are_rotated_everywhere() {
        let (locksmith, mems) = setup(2, T + 3_301);
        for m in &mems {
            m.insert_key_set(PATH, &seeded()).unwrap();
        }

        let outcome = locksmith.smith().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Rotated {
                creation_time: T + 3_301,
                key_count: 4,
                written: vec!["mem-0".into(), "mem-1".into()],
            }
        );
        let a = mems[0].key_set(PATH).unwrap().unwrap();
        let b = mems[1].key_set(PATH).unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.keys, vec!["gen-0", "k1", "k2", "k3"]);
    }

    #[tokio::test]
    async fn test_integrity_failure_blocks_rotation() {
        let (locksmith, mems) = setup(1, T + 10_000);
        mems[0]
            .insert_key_set(PATH, &KeySet::new(vec!["k1".into(), "k2".into()], T, 3_600))
            .unwrap();

        let err = locksmith.smith().await.unwrap_err();

        assert!(matches!(
            err,
            LocksmithError::Integrity(IntegrityError::TooFewKeys { .. })
        ));
        assert_eq!(mems[0].write_count(), 0);
    }

    #[tokio::test]
    async fn test_read_error_aborts_before_other_backends() {
        let (locksmith, mems) = setup(2, T + 10_000);
        for m in &mems {
            m.insert_key_set(PATH, &seeded()).unwrap();
        }
        mems[0].fail_reads(true);

        let err = locksmith.smith().await.unwrap_err();

        assert_eq!(err.backend(), Some("mem-0"));
        assert!(mems.iter().all(|m| m.write_count() == 0));
    }

    #[tokio::test]
    async fn test_callbacks_fire_on_rotation_only() {
        let (locksmith, mems) = setup(1, T + 3_200);
        mems[0].insert_key_set(PATH, &seeded()).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let locksmith = locksmith.on_rotation(Arc::new(move |outcome| {
            assert!(outcome.is_rotated());
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        locksmith.smith().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let locksmith = locksmith.with_clock(Arc::new(FixedClock::new(T + 4_000)));
        locksmith.smith().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_reports_schedule() {
        let (locksmith, mems) = setup(2, T + 1_000);
        for m in &mems {
            m.insert_key_set(PATH, &seeded()).unwrap();
        }

        let status = locksmith.status().await.unwrap();

        assert_eq!(status.key_count, 4);
        assert_eq!(status.age_secs, 1_000);
        assert_eq!(status.now, T + 1_000);
        assert_eq!(status.rotates_at, T + 3_300);
        assert!(!status.rotation_due);
    }

    #[tokio::test]
    async fn test_bootstrap_writes_everywhere() {
        let (locksmith, mems) = setup(2, T);

        let status = locksmith.bootstrap(3_600, 3).await.unwrap();

        assert_eq!(status.key_count, 3);
        assert_eq!(status.creation_time, T);
        let a = mems[0].key_set(PATH).unwrap().unwrap();
        assert_eq!(Some(a), mems[1].key_set(PATH).unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_refuses_existing_keys() {
        let (locksmith, mems) = setup(2, T);
        mems[1].insert_key_set(PATH, &seeded()).unwrap();

        let err = locksmith.bootstrap(3_600, 3).await.unwrap_err();

        assert!(matches!(
            err,
            LocksmithError::AlreadyInitialized { ref backend } if backend == "mem-1"
        ));
        assert!(mems.iter().all(|m| m.write_count() == 0));
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_period_within_ttl() {
        let (locksmith, _mems) = setup(1, T);
        assert!(locksmith.bootstrap(300, 3).await.is_err());
    }

    #[tokio::test]
    async fn test_cycle_never_bootstraps() {
        let (locksmith, mems) = setup(2, T);

        let err = locksmith.smith().await.unwrap_err();

        assert!(matches!(
            err,
            LocksmithError::Consistency(ConsistencyError::NoKeysFound { .. })
        ));
        assert!(mems.iter().all(|m| m.write_count() == 0));
    }

    #[test]
    fn test_from_config() {
        let mut config = LocksmithConfig::default();
        config.vaults = vec![
            VaultConfig::new("https://a:8200", "t"),
            VaultConfig::new("https://b:8200", "t"),
        ];

        let locksmith = Locksmith::from_config(&config).unwrap();

        assert_eq!(locksmith.backends().len(), 2);
        assert_eq!(locksmith.backends()[1].name(), "https://b:8200");
        assert_eq!(locksmith.key_path(), "secret/fernet-keys");
        assert_eq!(locksmith.ttl_secs(), 120);
    }

    #[test]
    fn test_from_config_accepts_ttl_longer_than_bootstrap_period() {
        let mut config = LocksmithConfig::default();
        config.vaults = vec![VaultConfig::new("https://a:8200", "t")];
        config.ttl_secs = 7_200;

        let locksmith = Locksmith::from_config(&config).unwrap();

        assert_eq!(locksmith.ttl_secs(), 7_200);
    }

    #[test]
    fn test_from_config_validates() {
        assert!(Locksmith::from_config(&LocksmithConfig::default()).is_err());
    }
}
