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
//! Error type shared by every layer of the simulator
//!
//! Argument and configuration errors fail fast at the call that detects
//! them and are never clamped. Numeric degeneracy is not an error: close
//! encounters are bounded by the softening length instead.

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised by the kernel, the simulators and their collaborators
#[derive(Debug, Error)]
pub enum SimError {
    /// A kernel range violated `0 <= start <= end <= len`
    #[error("index range [{start}, {end}) is invalid for {len} bodies")]
    RangeOutOfBounds {
        /// Requested start index
        start: usize,
        /// Requested end index (exclusive)
        end: usize,
        /// Number of bodies in the state
        len: usize,
    },

    /// A partition was requested with its start past its end
    #[error("partition [{start}, {end}) starts after it ends")]
    ReversedRange {
        /// Requested start index
        start: usize,
        /// Requested end index (exclusive)
        end: usize,
    },

    /// Two states of different size were compared
    #[error("state sizes differ: {left} vs {right} bodies")]
    SizeMismatch {
        /// Body count of the left-hand state
        left: usize,
        /// Body count of the right-hand state
        right: usize,
    },

    /// A state was requested with zero bodies
    #[error("body count must be positive")]
    EmptySystem,

    /// A parallel strategy was asked to run with zero workers
    #[error("worker count must be positive")]
    InvalidWorkerCount,

    /// A configuration value is out of its valid domain
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Leases were requested for partitions that overlap or are out of order
    #[error("partitions overlap or are not in ascending order")]
    OverlappingPartitions,

    /// A gathered chunk did not match the partition of the rank that sent it
    #[error("collective exchange returned a chunk of {actual} values, expected {expected}")]
    ExchangeMismatch {
        /// Length of the sending rank's partition
        expected: usize,
        /// Length of the chunk actually received
        actual: usize,
    },

    /// A distributed worker thread panicked
    #[error("worker {rank} failed")]
    WorkerFailed {
        /// Rank of the failed worker
        rank: usize,
    },

    /// The communicator can no longer complete an exchange
    #[error("communicator closed")]
    CommunicatorClosed,

    /// A snapshot file could not be parsed
    #[error("snapshot line {line}: {message}")]
    SnapshotParse {
        /// 1-based line number in the snapshot text
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Scenario file could not be deserialized
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl SimError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        SimError::InvalidConfig(message.into())
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        SimError::SnapshotParse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_error_message() {
        let err = SimError::RangeOutOfBounds { start: 4, end: 2, len: 10 };
        assert_eq!(err.to_string(), "index range [4, 2) is invalid for 10 bodies");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SimError = io.into();
        assert!(matches!(err, SimError::Io(_)));
    }
}
