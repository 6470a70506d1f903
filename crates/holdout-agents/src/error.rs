//! Error types for the holdout-agents crate.

use holdout_types::ActorId;

/// Errors that can occur while applying per-actor rules.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// An arithmetic overflow occurred during a vital computation.
    #[error("arithmetic overflow in vital computation: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// A living-only rule was applied to an undead actor.
    #[error("actor {0} is undead and has no living needs")]
    NotLiving(ActorId),
}
