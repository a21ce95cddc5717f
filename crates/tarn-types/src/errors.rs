// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Unification error types.

use std::fmt;

use thiserror::Error;

/// A failed unification. Both sides are rendered at the point of failure so
/// the message stays meaningful after the graph changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{left} is not {right}{reason}")]
pub struct TypeError {
    pub left: String,
    pub right: String,
    pub reason: MismatchReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// Different type constructors.
    Shape,
    /// A required member is absent from the other side's complete set.
    MissingMember(String),
    /// Two closed rows share no member.
    NoCommonMembers,
    /// Assignment required a member the other side declares immutable.
    ImmutableMember(String),
    /// Binding the variable would create an infinite type.
    Cyclic,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchReason::Shape => Ok(()),
            MismatchReason::MissingMember(name) => write!(f, " (member missing: {})", name),
            MismatchReason::NoCommonMembers => write!(f, " (no common members)"),
            MismatchReason::ImmutableMember(name) => {
                write!(f, " (member {} is not mutable)", name)
            }
            MismatchReason::Cyclic => write!(f, " (cyclic type)"),
        }
    }
}

impl TypeError {
    pub fn new(left: String, right: String, reason: MismatchReason) -> Self {
        Self { left, right, reason }
    }
}
