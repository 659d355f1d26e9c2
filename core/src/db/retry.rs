// GeoQuery
// Copyright 2026 The GeoQuery Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Retry loop for database operations that fail due to transient faults.
//!
//! The database may be temporarily unreachable (a server restart, exhausted connection slots, a
//! serialization conflict...).  Operations wrapped in `retry` are re-run from scratch after a
//! randomized delay whenever they fail with an error for which `DbError::is_transient` holds.
//! Any other error, and any success, is returned immediately.

use crate::clocks::Clock;
use crate::db::{DbError, DbResult};
use crate::env::get_optional_var;
use log::warn;
use std::future::Future;
use std::time::Duration;

/// Default value for the `max_retries` configuration property.
pub const DEFAULT_MAX_RETRIES: u16 = 60;

/// Default value for the `initial_delay` configuration property.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Default value for the `max_delay` configuration property.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Configuration of the retry loop.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first failed attempt.  Zero disables retries.
    pub max_retries: u16,

    /// Lower bound of the delay before the first retry.  The first delay is a random value in
    /// the `[initial_delay, 10 * initial_delay)` range and subsequent delays grow by random
    /// increments of up to `10 * initial_delay`.
    pub initial_delay: Duration,

    /// Delay past which delays stop growing.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy that never retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Default::default() }
    }

    /// Initializes a policy from environment variables whose name is prefixed with the given
    /// `prefix`, falling back to the defaults for those that are not set.
    ///
    /// This will use variables such as `<prefix>_MAX_RETRIES`, `<prefix>_RETRY_INITIAL_DELAY` and
    /// `<prefix>_RETRY_MAX_DELAY`.
    pub fn from_env(prefix: &str) -> Result<RetryPolicy, String> {
        let policy = RetryPolicy {
            max_retries: get_optional_var::<u16>(prefix, "MAX_RETRIES")?
                .unwrap_or(DEFAULT_MAX_RETRIES),
            initial_delay: get_optional_var::<Duration>(prefix, "RETRY_INITIAL_DELAY")?
                .unwrap_or(DEFAULT_INITIAL_DELAY),
            max_delay: get_optional_var::<Duration>(prefix, "RETRY_MAX_DELAY")?
                .unwrap_or(DEFAULT_MAX_DELAY),
        };
        if policy.initial_delay > policy.max_delay {
            return Err(format!(
                "{}_RETRY_INITIAL_DELAY cannot be larger than {}_RETRY_MAX_DELAY",
                prefix, prefix
            ));
        }
        Ok(policy)
    }

    /// Computes the delay to wait before the first retry.
    fn first_delay(&self) -> Duration {
        let delay = self.initial_delay + jitter(self.initial_delay * 9);
        delay.min(self.max_delay)
    }

    /// Computes the delay to wait before the retry that follows one that waited for `delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        if delay < self.max_delay {
            (delay + jitter(self.initial_delay * 10)).min(self.max_delay)
        } else {
            delay
        }
    }
}

/// Returns a random duration in the `[0, max)` range with millisecond granularity.
fn jitter(max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::random::<u64>() % max_ms)
}

/// Runs `op` and re-runs it according to `policy` for as long as it fails with a transient error.
///
/// `op` is invoked once per attempt and must create a new, self-contained unit of work each time
/// (typically a whole transaction) because partial effects of failed attempts are not undone
/// here.  Waits happen via `clock` so that tests do not block.
///
/// Once the retries are exhausted, the last transient error is returned to the caller.
pub async fn retry<Op, OpFut, T>(
    clock: &(dyn Clock + Send + Sync),
    policy: &RetryPolicy,
    mut op: Op,
) -> DbResult<T>
where
    Op: FnMut() -> OpFut,
    OpFut: Future<Output = DbResult<T>>,
{
    let mut retries = policy.max_retries;
    let mut delay = policy.first_delay();
    loop {
        match op().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if retries == 0 {
                    return Err(e);
                }
                retries -= 1;

                warn!(
                    "Transient database error ({}); waiting {}ms before retrying with {} attempts left",
                    e,
                    delay.as_millis(),
                    retries
                );

                clock.sleep(delay).await;
                delay = policy.next_delay(delay);
            }
            Err(e) => return Err(e),
        }
    }
}
