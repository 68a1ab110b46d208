//! Message dispositions and per-outcome lookup tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Terminal disposition of a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Processed successfully.
    Acknowledge,
    /// Failed transiently; the sender may try again.
    Rollback,
    /// Failed permanently; the message should not be retried.
    Reject,
}

impl Outcome {
    /// Every outcome, in declaration order.
    pub const ALL: [Outcome; 3] = [Outcome::Acknowledge, Outcome::Rollback, Outcome::Reject];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Acknowledge => "acknowledge",
            Outcome::Rollback => "rollback",
            Outcome::Reject => "reject",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "acknowledge" | "ack" => Ok(Outcome::Acknowledge),
            "rollback" => Ok(Outcome::Rollback),
            "reject" => Ok(Outcome::Reject),
            other => Err(format!("unknown outcome '{}'", other)),
        }
    }
}

/// One value per outcome.
///
/// Every outcome always has an entry, so lookups never fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeTable<T> {
    acknowledge: T,
    rollback: T,
    reject: T,
}

impl<T> OutcomeTable<T> {
    pub fn new(acknowledge: T, rollback: T, reject: T) -> Self {
        Self {
            acknowledge,
            rollback,
            reject,
        }
    }

    /// Entry for `outcome`.
    pub fn get(&self, outcome: Outcome) -> &T {
        match outcome {
            Outcome::Acknowledge => &self.acknowledge,
            Outcome::Rollback => &self.rollback,
            Outcome::Reject => &self.reject,
        }
    }

    /// Replace the entry for `outcome`, returning the previous one.
    pub fn set(&mut self, outcome: Outcome, value: T) -> T {
        std::mem::replace(&mut self[outcome], value)
    }

    /// Iterate `(outcome, entry)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Outcome, &T)> {
        Outcome::ALL.into_iter().map(move |o| (o, self.get(o)))
    }

    /// Build a new table by transforming every entry.
    pub fn map<U>(self, mut f: impl FnMut(Outcome, T) -> U) -> OutcomeTable<U> {
        OutcomeTable {
            acknowledge: f(Outcome::Acknowledge, self.acknowledge),
            rollback: f(Outcome::Rollback, self.rollback),
            reject: f(Outcome::Reject, self.reject),
        }
    }
}

impl<T> Index<Outcome> for OutcomeTable<T> {
    type Output = T;

    fn index(&self, outcome: Outcome) -> &T {
        self.get(outcome)
    }
}

impl<T> IndexMut<Outcome> for OutcomeTable<T> {
    fn index_mut(&mut self, outcome: Outcome) -> &mut T {
        match outcome {
            Outcome::Acknowledge => &mut self.acknowledge,
            Outcome::Rollback => &mut self.rollback,
            Outcome::Reject => &mut self.reject,
        }
    }
}
