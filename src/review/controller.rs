//! Retry/fallback state machine.
//!
//! ```text
//! Attempting(X, n) --Accepted--------------> Accepted
//!                  --RejectFixable---------> Attempting(X, n+1) with corrected description
//!                  --RejectHard/EngineError-> Attempting(Y != X, 1)
//!                  --budget spent----------> Exhausted
//! ```
//!
//! Every outcome consumes one attempt from a budget shared by all engines,
//! so the machine is terminal after at most `max_attempts` outcomes.

use super::ReviewVerdict;
use crate::render::{RenderAttempt, ToolName};

/// What happened to one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted,
    /// Same engine again with this description.
    RejectFixable { corrected_description: String },
    /// A different engine is needed.
    RejectHard { reason: String },
    /// The engine failed before review.
    EngineError { error: String },
}

impl AttemptOutcome {
    /// Classify a rendered attempt and, if it produced an image, its verdict.
    pub fn from_attempt(attempt: &RenderAttempt, verdict: Option<&ReviewVerdict>) -> Self {
        if let Some(error) = &attempt.engine_error {
            return AttemptOutcome::EngineError {
                error: error.clone(),
            };
        }
        match verdict {
            None => AttemptOutcome::EngineError {
                error: "attempt was not reviewed".to_string(),
            },
            Some(v) => Self::from_verdict(v),
        }
    }

    pub fn from_verdict(verdict: &ReviewVerdict) -> Self {
        if verdict.accepted {
            return AttemptOutcome::Accepted;
        }
        match (&verdict.corrected_description, verdict.fixable && !verdict.is_leakage()) {
            (Some(corrected), true) => AttemptOutcome::RejectFixable {
                corrected_description: corrected.clone(),
            },
            _ => AttemptOutcome::RejectHard {
                reason: verdict
                    .reason
                    .clone()
                    .unwrap_or_else(|| "unspecified".to_string()),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Accepted => "accepted",
            AttemptOutcome::RejectFixable { .. } => "reject_fixable",
            AttemptOutcome::RejectHard { .. } => "reject_hard",
            AttemptOutcome::EngineError { .. } => "engine_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    Attempting {
        tool: ToolName,
        /// Overall attempt number, 1-based
        attempt: u32,
        /// Attempt number on the current engine, 1-based
        engine_attempt: u32,
        description: String,
        /// Source of the rejected attempt being corrected
        previous_artifact: Option<String>,
    },
    Accepted {
        tool: ToolName,
        attempts_used: u32,
    },
    Exhausted {
        attempts_used: u32,
        last_tool: Option<ToolName>,
    },
    /// Stopped by the caller before a new attempt began.
    Cancelled {
        attempts_used: u32,
        last_tool: Option<ToolName>,
    },
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Attempting { .. })
    }
}

/// Owns the attempt counter and the engine fallback list for one question.
#[derive(Debug, Clone)]
pub struct RetryController {
    max_attempts: u32,
    order: Vec<ToolName>,
    tried: Vec<ToolName>,
    base_description: String,
    attempts_used: u32,
    last_tool: Option<ToolName>,
    state: RetryState,
}

impl RetryController {
    /// Start at `first_tool`, falling back through `order`.
    ///
    /// A `max_attempts` of zero is treated as one.
    pub fn new(
        first_tool: ToolName,
        description: impl Into<String>,
        order: Vec<ToolName>,
        max_attempts: u32,
    ) -> Self {
        let description = description.into();
        Self {
            max_attempts: max_attempts.max(1),
            order,
            tried: vec![first_tool],
            base_description: description.clone(),
            attempts_used: 0,
            last_tool: None,
            state: RetryState::Attempting {
                tool: first_tool,
                attempt: 1,
                engine_attempt: 1,
                description,
                previous_artifact: None,
            },
        }
    }

    pub fn state(&self) -> &RetryState {
        &self.state
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Engine that ran the most recent attempt.
    pub fn last_tool(&self) -> Option<ToolName> {
        self.last_tool
    }

    /// Stop before the next attempt. Terminal states are kept.
    pub fn cancel(&mut self) {
        if !self.is_terminal() {
            self.state = RetryState::Cancelled {
                attempts_used: self.attempts_used,
                last_tool: self.last_tool,
            };
        }
    }

    /// Record the outcome of the current attempt and advance.
    ///
    /// `source_artifact` is the attempt's code, markup or prompt; it is
    /// carried into a same-engine correction. Ignored in terminal states.
    pub fn on_outcome(&mut self, outcome: AttemptOutcome, source_artifact: &str) -> &RetryState {
        let (tool, engine_attempt) = match &self.state {
            RetryState::Attempting {
                tool,
                engine_attempt,
                ..
            } => (*tool, *engine_attempt),
            _ => return &self.state,
        };

        self.attempts_used += 1;
        self.last_tool = Some(tool);

        if outcome == AttemptOutcome::Accepted {
            self.state = RetryState::Accepted {
                tool,
                attempts_used: self.attempts_used,
            };
            return &self.state;
        }

        if self.attempts_used >= self.max_attempts {
            self.state = self.exhausted();
            return &self.state;
        }

        let next_attempt = self.attempts_used + 1;
        self.state = match outcome {
            AttemptOutcome::RejectFixable {
                corrected_description,
            } => RetryState::Attempting {
                tool,
                attempt: next_attempt,
                engine_attempt: engine_attempt + 1,
                description: corrected_description,
                previous_artifact: Some(source_artifact.to_string())
                    .filter(|a| !a.trim().is_empty()),
            },
            _ => match self.next_engine(tool) {
                Some(next) => {
                    if !self.tried.contains(&next) {
                        self.tried.push(next);
                    }
                    RetryState::Attempting {
                        tool: next,
                        attempt: next_attempt,
                        engine_attempt: 1,
                        description: self.base_description.clone(),
                        previous_artifact: None,
                    }
                }
                None => self.exhausted(),
            },
        };
        &self.state
    }

    fn exhausted(&self) -> RetryState {
        RetryState::Exhausted {
            attempts_used: self.attempts_used,
            last_tool: self.last_tool,
        }
    }

    /// First untried engine in order; once all are tried, the next engine
    /// after `current` that differs from it.
    fn next_engine(&self, current: ToolName) -> Option<ToolName> {
        if let Some(untried) = self
            .order
            .iter()
            .copied()
            .find(|t| *t != current && !self.tried.contains(t))
        {
            return Some(untried);
        }

        let start = self
            .order
            .iter()
            .position(|t| *t == current)
            .map(|i| i + 1)
            .unwrap_or(0);
        (0..self.order.len())
            .map(|offset| self.order[(start + offset) % self.order.len()])
            .find(|t| *t != current)
    }
}
