//! Shared fixtures for locksmith integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use locksmith_lib::prelude::*;

pub const KEY_PATH: &str = "secret/fernet-keys";
pub const T: i64 = 1_700_000_000;
pub const PERIOD: i64 = 3_600;
pub const MARGIN: u64 = 300;

/// Generates `gen-0`, `gen-1`, ... so rotated sets are predictable.
#[derive(Default)]
pub struct SequentialKeyGenerator(AtomicUsize);

impl SequentialKeyGenerator {
    pub fn generated(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl KeyGenerator for SequentialKeyGenerator {
    fn generate_key(&self) -> Result<String> {
        Ok(format!("gen-{}", self.0.fetch_add(1, Ordering::SeqCst)))
    }
}

/// Always fails, as if the entropy source were unavailable.
pub struct FailingKeyGenerator;

impl KeyGenerator for FailingKeyGenerator {
    fn generate_key(&self) -> Result<String> {
        Err(LocksmithError::Generation("entropy source unavailable".into()))
    }
}

pub fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// `[k1, k2, k3, k4]` created at `T` with a one hour period.
pub fn seeded_key_set() -> KeySet {
    KeySet::new(keys(&["k1", "k2", "k3", "k4"]), T, PERIOD)
}

pub struct Harness {
    pub locksmith: Locksmith,
    pub backends: Vec<Arc<InMemoryBackend>>,
    pub clock: Arc<FixedClock>,
    pub generator: Arc<SequentialKeyGenerator>,
}

/// `n` empty in-memory backends named `vault-0`, `vault-1`, ...
pub fn harness(n: usize, now: i64) -> Harness {
    let backends: Vec<Arc<InMemoryBackend>> = (0..n)
        .map(|i| Arc::new(InMemoryBackend::new(format!("vault-{}", i))))
        .collect();
    let clock = Arc::new(FixedClock::new(now));
    let generator = Arc::new(SequentialKeyGenerator::default());

    let locksmith = Locksmith::new(
        backends
            .iter()
            .map(|b| b.clone() as Arc<dyn SecretBackend>)
            .collect(),
        KEY_PATH,
        MARGIN,
    )
    .with_clock(clock.clone())
    .with_generator(generator.clone());

    Harness {
        locksmith,
        backends,
        clock,
        generator,
    }
}

impl Harness {
    /// Store `key_set` in every backend.
    pub fn seed(&self, key_set: &KeySet) {
        for backend in &self.backends {
            backend.insert_key_set(KEY_PATH, key_set).unwrap();
        }
    }

    pub fn stored(&self, i: usize) -> Option<KeySet> {
        self.backends[i].key_set(KEY_PATH).unwrap()
    }

    pub fn total_writes(&self) -> usize {
        self.backends.iter().map(|b| b.write_count()).sum()
    }
}
