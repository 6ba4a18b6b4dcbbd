/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

//! The process-wide random source every die draws from.
//!
//! By default draws come straight from the operating system's
//! cryptographically secure generator. Hosts and tests can [install] a
//! different [RandomSource]; all access goes through one lock, so concurrent
//! callers never interleave inside a source.

use crate::error::{Error, Result};
use parking_lot::{const_mutex, Mutex};
use rand::{
    distributions::{Distribution, Uniform},
    rngs::OsRng,
    SeedableRng,
};
use rand_chacha::ChaCha20Rng;

#[cfg(feature = "logging")]
use log::info;

/// A generator of uniformly distributed integers.
pub trait RandomSource: Send {
    /// Returns an integer in `[0, n)`. Callers guarantee `n > 0`.
    fn uniform_int(&mut self, n: i64) -> Result<i64>;

    /// Reseeds the source. Sources that cannot be seeded ignore this.
    fn seed(&mut self, _seed: u64) {}
}

/// Draws from the operating system. Ignores seeding.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSource;

impl RandomSource for OsSource {
    fn uniform_int(&mut self, n: i64) -> Result<i64> {
        Ok(Uniform::new(0, n).sample(&mut OsRng))
    }
}

/// A reproducible ChaCha20 stream.
#[derive(Debug, Clone)]
pub struct ChaChaSource {
    rng: ChaCha20Rng,
}

impl ChaChaSource {
    pub fn new(seed: u64) -> ChaChaSource {
        ChaChaSource {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> ChaChaSource {
        ChaChaSource {
            rng: ChaCha20Rng::from_entropy(),
        }
    }
}

impl RandomSource for ChaChaSource {
    fn uniform_int(&mut self, n: i64) -> Result<i64> {
        Ok(Uniform::new(0, n).sample(&mut self.rng))
    }

    fn seed(&mut self, seed: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }
}

/// Replays a fixed cycle of draws, each reduced into `[0, n)`.
///
/// `SequenceSource::new(vec![16, 7])` makes a d20 roll 17 and then a d12 roll 8.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<i64>,
    position: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<i64>) -> SequenceSource {
        SequenceSource {
            values,
            position: 0,
        }
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> usize {
        self.position
    }
}

impl RandomSource for SequenceSource {
    fn uniform_int(&mut self, n: i64) -> Result<i64> {
        if self.values.is_empty() {
            return Err(Error::Internal("sequence source is empty".to_string()));
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        Ok(value.rem_euclid(n))
    }

    fn seed(&mut self, _seed: u64) {
        self.position = 0;
    }
}

static SOURCE: Mutex<Option<Box<dyn RandomSource>>> = const_mutex(None);

/// Returns a uniformly distributed integer in `[0, n)` from the installed source.
pub fn uniform_int(n: i64) -> Result<i64> {
    if n <= 0 {
        return Err(Error::Internal(format!(
            "cannot draw from an empty range [0, {})",
            n
        )));
    }
    let mut source = SOURCE.lock();
    match source.as_mut() {
        Some(s) => s.uniform_int(n),
        None => OsSource.uniform_int(n),
    }
}

/// Replaces the process-wide source, returning the previous one.
pub fn install(source: Box<dyn RandomSource>) -> Option<Box<dyn RandomSource>> {
    #[cfg(feature = "logging")]
    {
        info!("installing custom random source");
    }
    SOURCE.lock().replace(source)
}

/// Goes back to drawing from the operating system.
pub fn reset() -> Option<Box<dyn RandomSource>> {
    #[cfg(feature = "logging")]
    {
        info!("resetting random source to os generator");
    }
    SOURCE.lock().take()
}

/// Seeds the installed source. A no-op for the default generator.
pub fn seed(seed: u64) {
    if let Some(source) = SOURCE.lock().as_mut() {
        source.seed(seed);
    }
}

/// Runs `f` with `source` installed, then puts the previous source back.
#[cfg(test)]
pub(crate) fn with_source<S, T, F>(source: S, f: F) -> T
where
    S: RandomSource + 'static,
    F: FnOnce() -> T,
{
    struct Restore(Option<Box<dyn RandomSource>>);

    impl Drop for Restore {
        fn drop(&mut self) {
            *SOURCE.lock() = self.0.take();
        }
    }

    let _restore = Restore(install(Box::new(source)));
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_uniform_int_range() {
        for n in 1..50 {
            let x = uniform_int(n).unwrap();
            assert!((0..n).contains(&x));
        }
        assert!(matches!(uniform_int(0), Err(Error::Internal(_))));
        assert!(matches!(uniform_int(-3), Err(Error::Internal(_))));
    }

    #[test]
    #[serial]
    fn test_sequence_source() {
        with_source(SequenceSource::new(vec![16, 7, 25]), || {
            assert_eq!(uniform_int(20), Ok(16));
            assert_eq!(uniform_int(12), Ok(7));
            assert_eq!(uniform_int(20), Ok(5));
            assert_eq!(uniform_int(20), Ok(16));
        });
    }

    #[test]
    #[serial]
    fn test_seeded_source_repeats() {
        let first: Vec<i64> = with_source(ChaChaSource::new(42), || {
            (0..10).map(|_| uniform_int(6).unwrap()).collect()
        });
        let second: Vec<i64> = with_source(ChaChaSource::from_entropy(), || {
            seed(42);
            (0..10).map(|_| uniform_int(6).unwrap()).collect()
        });
        assert_eq!(first, second);
    }

    #[test]
    #[serial]
    fn test_source_restored_after_panic() {
        let outcome = std::panic::catch_unwind(|| {
            with_source(SequenceSource::new(vec![3]), || {
                assert_eq!(uniform_int(6), Ok(3));
                panic!("failing assertion");
            })
        });
        assert!(outcome.is_err());
        assert!(SOURCE.lock().is_none());
    }

    #[test]
    #[serial]
    fn test_concurrent_draws() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..200)
                        .map(|_| uniform_int(6).unwrap())
                        .all(|x| (0..6).contains(&x))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
