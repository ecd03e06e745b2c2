//! Rollout status of DaemonSets
//!
//! Mirrors the kstatus rules: a DaemonSet is current once the controller has
//! observed the latest generation and every desired pod is scheduled,
//! updated, available, and ready.

use k8s_openapi::api::apps::v1::DaemonSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "PascalCase")]
pub enum RolloutState {
    InProgress,
    Current,
    Terminating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutStatus {
    pub state: RolloutState,
    pub message: String,
}

impl RolloutStatus {
    fn new(state: RolloutState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }

    pub fn is_current(&self) -> bool {
        self.state == RolloutState::Current
    }
}

pub fn compute_daemon_set_status(daemon_set: &DaemonSet) -> RolloutStatus {
    if daemon_set.metadata.deletion_timestamp.is_some() {
        return RolloutStatus::new(RolloutState::Terminating, "Resource scheduled for deletion");
    }

    let Some(status) = daemon_set.status.as_ref() else {
        return RolloutStatus::new(RolloutState::InProgress, "DaemonSet not yet observed");
    };

    let generation = daemon_set.metadata.generation.unwrap_or(0);
    let observed = status.observed_generation.unwrap_or(0);
    if observed < generation {
        return RolloutStatus::new(
            RolloutState::InProgress,
            format!(
                "Generation {} not yet observed, latest observed is {}",
                generation, observed
            ),
        );
    }

    let desired = status.desired_number_scheduled;
    let checks = [
        ("Current", status.current_number_scheduled),
        ("Updated", status.updated_number_scheduled.unwrap_or(0)),
        ("Available", status.number_available.unwrap_or(0)),
        ("Ready", status.number_ready),
    ];
    for (what, have) in checks {
        if desired > have {
            return RolloutStatus::new(
                RolloutState::InProgress,
                format!("{}: {}/{}", what, have, desired),
            );
        }
    }

    RolloutStatus::new(RolloutState::Current, "All replicas scheduled as expected")
}
