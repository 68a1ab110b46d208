//! Per-outcome forwarding routes.

use std::fmt;
use std::sync::Arc;

use crate::message::{Outcome, OutcomeTable, Sender};

/// Where to forward one outcome, and what to do with the original afterwards.
#[derive(Clone)]
pub struct Forward {
    sender: Arc<dyn Sender>,
    outcome: Option<Outcome>,
}

impl Forward {
    /// Forward through `sender`, then resolve the original with the same outcome.
    pub fn to(sender: Arc<dyn Sender>) -> Self {
        Self {
            sender,
            outcome: None,
        }
    }

    /// Resolve the original with `outcome` after forwarding.
    pub fn then(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn sender(&self) -> &Arc<dyn Sender> {
        &self.sender
    }

    /// Outcome applied to the original after forwarding `original`.
    pub fn outcome_for(&self, original: Outcome) -> Outcome {
        self.outcome.unwrap_or(original)
    }
}

impl fmt::Debug for Forward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forward")
            .field("sender", &self.sender.name())
            .field("outcome", &self.outcome)
            .finish()
    }
}

/// Forwarding routes for all three outcomes. Empty means pass-through.
#[derive(Debug, Clone, Default)]
pub struct ForwardingConfig {
    routes: OutcomeTable<Option<Forward>>,
}

impl ForwardingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `outcome` through `forward`.
    pub fn on(mut self, outcome: Outcome, forward: Forward) -> Self {
        self.routes.set(outcome, Some(forward));
        self
    }

    pub fn route(&self, outcome: Outcome) -> Option<&Forward> {
        self.routes.get(outcome).as_ref()
    }

    /// True if no outcome is forwarded.
    pub fn is_empty(&self) -> bool {
        self.routes.iter().all(|(_, route)| route.is_none())
    }
}
