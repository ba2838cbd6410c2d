//! Scan Simulator
//!
//! Mock randomness behind an attendance session: how many scans arrive each
//! second, how many students end up present, and the session id suffix.
//! Everything goes through [`ScanSource`] so tests can pin the numbers.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::attendance_session::{AttendanceResult, AttendanceSession};

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LENGTH: usize = 9;

/// Tuning for the simulated numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Countdown length in seconds
    pub duration_seconds: u32,
    /// Lower bound of the final present count, inclusive
    pub present_min: u32,
    /// Upper bound of the final present count, inclusive
    pub present_max: u32,
    /// Largest scan increment per tick
    pub max_scans_per_tick: u32,
    /// Share of the roster a broadcast reaches
    pub broadcast_reach_percent: u8,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            duration_seconds: crate::models::attendance_session::DEFAULT_DURATION_SECONDS,
            present_min: 35,
            present_max: 44,
            max_scans_per_tick: 2,
            broadcast_reach_percent: 80,
            seed: None,
        }
    }
}

/// Randomness consumed by a session
pub trait ScanSource: Send {
    /// Scans arriving during one tick
    fn scan_increment(&mut self) -> u32;

    /// Final present count for a roster of `total`; never above `total`
    fn present_count(&mut self, total: u32) -> u32;

    /// Random part of a session id
    fn session_suffix(&mut self) -> String;
}

/// [`ScanSource`] backed by a seedable PRNG
#[derive(Debug, Clone)]
pub struct ScanSimulator {
    rng: StdRng,
    config: SimulatorConfig,
}

impl ScanSimulator {
    /// Seeded from `config.seed`, or from OS entropy when unset
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, config }
    }

    pub fn seeded(config: SimulatorConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }
}

impl ScanSource for ScanSimulator {
    fn scan_increment(&mut self) -> u32 {
        self.rng.gen_range(0..=self.config.max_scans_per_tick)
    }

    fn present_count(&mut self, total: u32) -> u32 {
        let low = self.config.present_min.min(self.config.present_max);
        let high = self.config.present_max.max(low);
        self.rng.gen_range(low..=high).min(total)
    }

    fn session_suffix(&mut self) -> String {
        (0..SUFFIX_LENGTH)
            .map(|_| char::from(SUFFIX_ALPHABET[self.rng.gen_range(0..SUFFIX_ALPHABET.len())]))
            .collect()
    }
}

/// Run one second of a session. Returns the tally when this tick finalized it.
pub fn tick_session(
    session: &mut AttendanceSession,
    source: &mut dyn ScanSource,
    now: DateTime<Utc>,
) -> Option<AttendanceResult> {
    if !session.is_counting() {
        return None;
    }

    let expired = session.advance(source.scan_increment());
    if expired {
        let present = source.present_count(session.total_enrolled);
        Some(session.finalize(present, now))
    } else {
        None
    }
}
