//! Second-factor approval polling.
//!
//! The poller repeatedly asks the server whether the pending challenge
//! has been approved and resolves exactly once, on approval. The retry
//! cadence and the (optional) attempt bound are explicit policy, and the
//! wait carries a cancellation channel; by default there is no implicit
//! timeout, since a human may take arbitrarily long to approve.

use std::time::Duration;

use tokio::sync::watch;

use crate::api::Api;
use crate::error::LoginError;

/// Retry policy for the approval wait.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Delay between status requests.
    pub interval: Duration,
    /// Give up after this many pending answers; `None` waits forever.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(8),
            max_attempts: None,
        }
    }
}

pub struct SecondFactorPoller {
    policy: PollPolicy,
}

impl SecondFactorPoller {
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// Wait until the server reports the challenge approved.
    ///
    /// Resolves `Ok` exactly once, only on approval. An exhausted
    /// attempt bound yields [`LoginError::SecondFactorTimeout`]; setting
    /// the cancellation channel to `true` yields [`LoginError::Cancelled`].
    /// Transport errors propagate.
    pub async fn await_approval<A: Api>(
        &self,
        api: &A,
        access_token: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<(), LoginError> {
        let mut attempts = 0u32;
        loop {
            if *cancel.borrow() {
                return Err(LoginError::Cancelled);
            }

            if !api.second_factor_pending(access_token).await? {
                return Ok(());
            }

            attempts += 1;
            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(LoginError::SecondFactorTimeout);
                }
            }

            if cancel.has_changed().is_err() {
                // Cancellation handle dropped; plain sleep.
                tokio::time::sleep(self.policy.interval).await;
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(self.policy.interval) => {}
                    _ = cancel.changed() => {}
                }
            }
        }
    }
}
