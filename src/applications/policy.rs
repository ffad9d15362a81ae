use std::collections::HashSet;

use super::repo_types::ApplicationStatus;
use crate::config::AppConfig;

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Owner,
    Admin,
}

/// Table of allowed `(actor, from, to)` transitions.
#[derive(Debug, Clone)]
pub struct TransitionPolicy {
    allowed: HashSet<(Actor, ApplicationStatus, ApplicationStatus)>,
}

impl TransitionPolicy {
    /// Every transition allowed for both actors, self-transitions included.
    pub fn permissive() -> Self {
        let mut allowed = HashSet::new();
        for actor in [Actor::Owner, Actor::Admin] {
            for from in ApplicationStatus::ALL {
                for to in ApplicationStatus::ALL {
                    allowed.insert((actor, from, to));
                }
            }
        }
        Self { allowed }
    }

    /// Owners may only move an application into one of `targets`.
    pub fn with_owner_targets(mut self, targets: &[ApplicationStatus]) -> Self {
        self.allowed
            .retain(|(actor, _, to)| *actor == Actor::Admin || targets.contains(to));
        self
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::permissive().with_owner_targets(&config.owner_status_targets)
    }

    pub fn allows(&self, actor: Actor, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        self.allowed.contains(&(actor, from, to))
    }
}
