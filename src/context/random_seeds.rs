// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deterministic per-event random seed derivation.
//!
//! Seeds are computed from the triple (global seed, run number, event
//! number) alone:
//!
//! 1. The event number, run number and global seed are folded, in that
//!    order, through Bob Jenkins' lookup2 hash, each stage keyed by the
//!    previous result and the first stage starting from zero.
//! 2. The resulting 32-bit value seeds a ChaCha8 generator.
//! 3. One `u32` is drawn per registered consumer, in registration order.
//!
//! Because nothing depends on which thread derives the seeds or when, the
//! same event always receives the same map.

use crate::errors::{ConfigError, ContextError};
use crate::event::EventId;
use indexmap::{IndexMap, IndexSet};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};

const GOLDEN_RATIO: u32 = 0x9e37_79b9;

/// Seeds for one event, keyed by consumer name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RandomSeeds {
    seeds: IndexMap<String, u32>,
}

impl RandomSeeds {
    pub fn get(&self, consumer: &str) -> Result<u32, ContextError> {
        self.seeds
            .get(consumer)
            .copied()
            .ok_or_else(|| ContextError::UnregisteredConsumer {
                consumer: consumer.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.seeds.iter().map(|(name, seed)| (name.as_str(), *seed))
    }
}

/// Registry of seed consumers plus the global seed.
///
/// Consumers register during chain initialization. The first call to
/// [`RandomSeedManager::derive`] seals the registry; later registrations
/// are configuration errors.
#[derive(Debug)]
pub struct RandomSeedManager {
    global_seed: u32,
    consumers: IndexSet<String>,
    sealed: AtomicBool,
}

impl RandomSeedManager {
    pub fn new(global_seed: u32) -> Self {
        Self {
            global_seed,
            consumers: IndexSet::new(),
            sealed: AtomicBool::new(false),
        }
    }

    pub fn global_seed(&self) -> u32 {
        self.global_seed
    }

    /// Reserve a seed slot for `consumer`.
    ///
    /// Registering a name twice keeps the original slot, so every clone of a
    /// processor shares the seed of its declaration.
    pub fn register(&mut self, consumer: &str) -> Result<(), ConfigError> {
        if self.is_sealed() {
            return Err(ConfigError::SeedRegistrationClosed {
                consumer: consumer.to_string(),
            });
        }
        self.consumers.insert(consumer.to_string());
        Ok(())
    }

    pub fn is_registered(&self, consumer: &str) -> bool {
        self.consumers.contains(consumer)
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Close registration without deriving anything.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Compute the seed map for one event.
    pub fn derive(&self, id: EventId) -> RandomSeeds {
        self.seal();
        let hash = event_hash(self.global_seed, id.run_number, id.event_number);
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(hash));
        let seeds = self
            .consumers
            .iter()
            .map(|consumer| (consumer.clone(), rng.next_u32()))
            .collect();
        RandomSeeds { seeds }
    }
}

/// Fold event number, run number and global seed into one 32-bit value.
pub fn event_hash(global_seed: u32, run_number: u32, event_number: u32) -> u32 {
    let mut hash = 0;
    hash = lookup2(&event_number.to_le_bytes(), hash);
    hash = lookup2(&run_number.to_le_bytes(), hash);
    lookup2(&global_seed.to_le_bytes(), hash)
}

fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 13);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 8);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 13);
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 12);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 16);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 5);
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 3);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 10);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 15);
}

fn word(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Bob Jenkins' lookup2 hash.
fn lookup2(key: &[u8], initval: u32) -> u32 {
    let mut a = GOLDEN_RATIO;
    let mut b = GOLDEN_RATIO;
    let mut c = initval;

    let mut blocks = key.chunks_exact(12);
    for block in &mut blocks {
        a = a.wrapping_add(word(&block[0..4]));
        b = b.wrapping_add(word(&block[4..8]));
        c = c.wrapping_add(word(&block[8..12]));
        mix(&mut a, &mut b, &mut c);
    }

    // low byte of c is reserved for the length
    c = c.wrapping_add(key.len() as u32);
    for (i, &byte) in blocks.remainder().iter().enumerate() {
        let byte = u32::from(byte);
        match i {
            0..=3 => a = a.wrapping_add(byte << (8 * i)),
            4..=7 => b = b.wrapping_add(byte << (8 * (i - 4))),
            _ => c = c.wrapping_add(byte << (8 * (i - 7))),
        }
    }
    mix(&mut a, &mut b, &mut c);
    c
}
