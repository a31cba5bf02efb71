use std::{
    num::{NonZeroU128, NonZeroU16},
    time::{Duration, SystemTime},
};

use parking_lot::Mutex;
use rand::RngCore;

use crate::id::ResourceId;

const ONE: NonZeroU16 = match NonZeroU16::new(1) {
    None => unreachable!(),
    Some(value) => value,
};

const COUNTER_BITS: u32 = 10;
const RANDOM_BITS: u32 = 84;
const SECONDS_BITS: u32 = 34;

fn counter_next(counter: NonZeroU16) -> Option<NonZeroU16> {
    if counter.get() >= (1 << COUNTER_BITS) - 1 {
        None
    } else {
        Some(counter.saturating_add(1))
    }
}

/// Generates pseudo-unique resource ids.
///
/// The ids are generated with following scheme:
///
/// 34 bits - seconds since epoch.
/// 84 bits - random.
/// 10 bits - counter.
pub struct Generator {
    state: Mutex<State>,
    epoch: SystemTime,
}

struct State {
    // Last seconds since epoch.
    last_secs: u64,
    counter: NonZeroU16,
}

impl Default for Generator {
    fn default() -> Self {
        Generator::new()
    }
}

impl Generator {
    /// Returns default epoch.
    pub fn default_epoch() -> SystemTime {
        /// 2023-04-07 21:51:12 UTC as seconds since UNIX epoch.
        const DEFAULT_EPOCH: u64 = 1680904272;

        SystemTime::UNIX_EPOCH + Duration::from_secs(DEFAULT_EPOCH)
    }

    /// Creates a new generator with default epoch.
    pub fn new() -> Self {
        Generator::with_epoch(Self::default_epoch())
    }

    /// Creates a new generator with given epoch.
    pub const fn with_epoch(epoch: SystemTime) -> Self {
        Generator {
            state: Mutex::new(State {
                counter: ONE,
                last_secs: 0,
            }),
            epoch,
        }
    }

    /// Generates a new pseudo-unique id.
    ///
    /// Ids are guaranteed to be unique within one generator instance.
    /// Ids from different instances collide with negligible probability
    /// thanks to the random part.
    pub fn generate(&self) -> ResourceId {
        let (seconds, counter) = loop {
            let mut state = self.state.lock();
            let now = SystemTime::now();
            let seconds = now
                .duration_since(self.epoch)
                .unwrap_or_default()
                .as_secs()
                .max(state.last_secs)
                & ((1 << SECONDS_BITS) - 1);

            if state.last_secs == seconds {
                match counter_next(state.counter) {
                    None => {
                        // Counter exhausted for this second.
                        let next_second = self.epoch + Duration::from_secs(state.last_secs + 1);
                        let dur = next_second.duration_since(now).unwrap_or_default();
                        drop(state);
                        std::thread::sleep(dur);
                        continue;
                    }
                    Some(counter) => state.counter = counter,
                }
            } else {
                state.last_secs = seconds;
                state.counter = ONE;
            }

            break (seconds, state.counter);
        };

        let mut r = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut r[..11]);
        let random = u128::from_le_bytes(r) & ((1 << RANDOM_BITS) - 1);

        let value = ((seconds as u128) << (RANDOM_BITS + COUNTER_BITS))
            | (random << COUNTER_BITS)
            | counter.get() as u128;

        // Counter part is never zero.
        match NonZeroU128::new(value) {
            Some(value) => ResourceId(value),
            None => unreachable!(),
        }
    }
}
