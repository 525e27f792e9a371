//! Force-Update Guard.
//!
//! Decides whether a forced refresh is still needed and, if so, issues it
//! and waits for the rollout to settle within one deadline.
//!
//! The comparison instant is captured by the caller before any deployment
//! work starts and is never re-read here, so the decision is reproducible.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stackship_core::WorkloadIdentity;

use crate::collaborators::{RefreshError, RolloutState, ServiceRefresher};
use crate::error::DeployError;

/// Whether to issue a forced refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceDecision {
    /// Someone already updated the service after this command started.
    Skip,
    Force,
}

/// Skip iff the service was last updated strictly after `comparison_instant`.
pub fn decide(comparison_instant: DateTime<Utc>, last_updated: DateTime<Utc>) -> ForceDecision {
    if last_updated > comparison_instant {
        ForceDecision::Skip
    } else {
        ForceDecision::Force
    }
}

/// What the guard ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceOutcome {
    Skipped { last_updated: DateTime<Utc> },
    Forced,
}

pub struct ForceUpdateGuard<'a> {
    refresher: &'a dyn ServiceRefresher,
    timeout: Duration,
    poll_interval: Duration,
}

enum Interrupted {
    Cancelled,
    DeadlinePassed,
}

impl<'a> ForceUpdateGuard<'a> {
    pub fn new(refresher: &'a dyn ServiceRefresher, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            refresher,
            timeout,
            poll_interval,
        }
    }

    pub async fn run(
        &self,
        id: &WorkloadIdentity,
        comparison_instant: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<ForceOutcome, DeployError> {
        let workload = id.workload.to_string();

        let last_updated = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DeployError::Cancelled),
            res = self.refresher.last_updated_at(id) => res.map_err(|source| DeployError::LastUpdatedAt {
                workload: workload.clone(),
                source,
            })?,
        };

        if decide(comparison_instant, last_updated) == ForceDecision::Skip {
            info!(
                workload = %workload,
                env = %id.env,
                %last_updated,
                %comparison_instant,
                "service already updated since this deployment began, skipping forced update"
            );
            return Ok(ForceOutcome::Skipped { last_updated });
        }

        info!(workload = %workload, env = %id.env, "forcing a new rollout");
        let deadline = Instant::now() + self.timeout;

        let issued = self
            .within(cancel, deadline, self.refresher.force_update_service(id))
            .await
            .map_err(|i| self.interrupted(i, id))?;
        match issued {
            Ok(()) => {}
            Err(RefreshError::WaitTimeout) => return Err(self.timed_out(id)),
            Err(RefreshError::Other(source)) => {
                return Err(DeployError::ForceUpdate { workload, source })
            }
        }

        loop {
            let state = self
                .within(cancel, deadline, self.refresher.rollout_state(id))
                .await
                .map_err(|i| self.interrupted(i, id))?
                .map_err(|source| DeployError::ForceUpdate {
                    workload: workload.clone(),
                    source,
                })?;
            match state {
                RolloutState::Stable => {
                    info!(workload = %workload, env = %id.env, "forced rollout is stable");
                    return Ok(ForceOutcome::Forced);
                }
                RolloutState::Failed(reason) => {
                    warn!(workload = %workload, reason = %reason, "forced rollout failed");
                    return Err(DeployError::RolloutFailed { workload, reason });
                }
                RolloutState::InProgress => {
                    debug!(workload = %workload, "rollout in progress");
                    self.within(cancel, deadline, sleep(self.poll_interval))
                        .await
                        .map_err(|i| self.interrupted(i, id))?;
                }
            }
        }
    }

    /// Race `fut` against cancellation and the deadline.
    async fn within<T>(
        &self,
        cancel: &CancellationToken,
        deadline: Instant,
        fut: impl Future<Output = T>,
    ) -> Result<T, Interrupted> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = sleep_until(deadline) => Err(Interrupted::DeadlinePassed),
            out = fut => Ok(out),
        }
    }

    fn interrupted(&self, why: Interrupted, id: &WorkloadIdentity) -> DeployError {
        match why {
            Interrupted::Cancelled => DeployError::Cancelled,
            Interrupted::DeadlinePassed => self.timed_out(id),
        }
    }

    fn timed_out(&self, id: &WorkloadIdentity) -> DeployError {
        warn!(workload = %id.workload, env = %id.env, "forced update did not stabilise in time");
        DeployError::ForceUpdateTimeout {
            workload: id.workload.to_string(),
            env: id.env.to_string(),
            waited: self.timeout,
        }
    }
}
