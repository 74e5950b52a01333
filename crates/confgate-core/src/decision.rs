//! Approver decisions and the tokens bound to prompt buttons.
//!
//! Token format: `cfg:{approve|reject}:{requester_id}`. The longest possible
//! token (`cfg:approve:-9223372036854775808`) is 31 bytes, well inside
//! Telegram's 64-byte callback data limit.

use std::fmt;
use std::str::FromStr;

use crate::error::TokenError;
use crate::types::RecipientId;

const TOKEN_PREFIX: &str = "cfg";

/// What the approver chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Deliver the reserved file.
    Approve,
    /// Release the reserved file.
    Reject,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(TokenError::UnknownOutcome(other.to_string())),
        }
    }
}

/// A single approver decision for one requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// The requester the decision applies to.
    pub requester_id: RecipientId,
    /// Approve or reject.
    pub outcome: Outcome,
}

impl Decision {
    /// Create a decision.
    #[must_use]
    pub fn new(requester_id: RecipientId, outcome: Outcome) -> Self {
        Self {
            requester_id,
            outcome,
        }
    }

    /// The token that encodes this decision.
    #[must_use]
    pub fn token(&self) -> DecisionToken {
        DecisionToken(format!(
            "{TOKEN_PREFIX}:{}:{}",
            self.outcome, self.requester_id
        ))
    }
}

/// Opaque string bound to one of the prompt's buttons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionToken(String);

impl DecisionToken {
    /// The approve/reject token pair for a requester.
    #[must_use]
    pub fn pair(requester_id: RecipientId) -> (Self, Self) {
        (
            Decision::new(requester_id, Outcome::Approve).token(),
            Decision::new(requester_id, Outcome::Reject).token(),
        )
    }

    /// Wire form of the token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a token back into the decision it encodes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the string is not a well-formed token.
    pub fn parse(raw: &str) -> Result<Decision, TokenError> {
        let mut parts = raw.splitn(3, ':');
        if parts.next() != Some(TOKEN_PREFIX) {
            return Err(TokenError::NotDecisionToken);
        }
        let (Some(verb), Some(id)) = (parts.next(), parts.next()) else {
            return Err(TokenError::NotDecisionToken);
        };
        let outcome = verb.parse::<Outcome>()?;
        let id = id
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidRequester(id.to_string()))?;
        Ok(Decision::new(RecipientId(id), outcome))
    }
}

impl fmt::Display for DecisionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
