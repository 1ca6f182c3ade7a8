// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Rate-limited progress logging for long step loops

use log::{log, Level};
use std::fmt::Display;
use std::time::{Duration, Instant};

/// Default spacing between two progress messages
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Emits at most one message per interval
///
/// ```
/// use log::Level;
/// use nbody_sim::progress::PeriodicLogger;
///
/// let mut progress = PeriodicLogger::new("integrating", Level::Info);
/// for step in 0..1000 {
///     progress.log(format_args!("step {} / {}", step + 1, 1000));
/// }
/// ```
pub struct PeriodicLogger {
    last_logged: Instant,
    interval: Duration,
    level: Level,
}

impl PeriodicLogger {
    /// Log `start_message` at `level` and start the interval clock
    pub fn new(start_message: &str, level: Level) -> Self {
        Self::with_interval(start_message, DEFAULT_INTERVAL, level)
    }

    /// Same as [`PeriodicLogger::new`] with a custom interval
    pub fn with_interval(start_message: &str, interval: Duration, level: Level) -> Self {
        log!(level, "{}", start_message);
        PeriodicLogger {
            last_logged: Instant::now(),
            interval,
            level,
        }
    }

    /// Log `message` if the interval has elapsed since the previous message
    ///
    /// Returns whether the message was emitted.
    pub fn log<D: Display>(&mut self, message: D) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_logged) < self.interval {
            return false;
        }
        self.last_logged = now;
        log!(self.level, "\t{}", message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited() {
        let mut progress = PeriodicLogger::with_interval("start", Duration::from_secs(3600), Level::Debug);
        assert!(!progress.log("too soon"));
        assert!(!progress.log("still too soon"));
    }

    #[test]
    fn test_zero_interval_always_logs() {
        let mut progress = PeriodicLogger::with_interval("start", Duration::ZERO, Level::Trace);
        assert!(progress.log(1));
        assert!(progress.log(2));
    }
}
