//! Context window management: fitting a prompt under the token budget.
//!
//! Trimming drops the oldest history first and always keeps the system turn
//! and the newest user turn. When that still overflows, the response budget
//! shrinks to whatever the model window has left.

use parley_constant::defaults;
use thiserror::Error;
use tracing::{info, warn};

use crate::tokens::TokenCounter;
use crate::turn::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Prompt size that triggers trimming.
    pub input_ceiling: usize,
    /// Model context window shared by prompt and response.
    pub total_ceiling: usize,
    /// Response tokens requested when the prompt fits.
    pub max_response_tokens: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            input_ceiling: defaults::INPUT_TOKEN_CEILING,
            total_ceiling: defaults::TOTAL_TOKEN_CEILING,
            max_response_tokens: defaults::MAX_RESPONSE_TOKENS,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("prompt needs {prompt_tokens} tokens, leaving no room in a {total_ceiling}-token window")]
    BudgetExhausted {
        prompt_tokens: usize,
        total_ceiling: usize,
    },
}

/// A prompt ready to send.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub messages: Vec<Turn>,
    pub prompt_tokens: usize,
    pub max_response_tokens: usize,
    /// History turns dropped to fit.
    pub trimmed: usize,
}

#[derive(Debug, Clone)]
pub struct ContextWindow {
    counter: TokenCounter,
    budget: TokenBudget,
}

impl ContextWindow {
    pub fn new(counter: TokenCounter, budget: TokenBudget) -> Self {
        Self { counter, budget }
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Assemble `system + history + new_turn` and fit it under the budget.
    pub fn prepare(
        &self,
        system: Turn,
        history: &[Turn],
        new_turn: Turn,
    ) -> Result<PreparedPrompt, WindowError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(system);
        messages.extend_from_slice(history);
        messages.push(new_turn);

        let initial = self.counter.count(&messages);
        if initial <= self.budget.input_ceiling {
            return Ok(PreparedPrompt {
                messages,
                prompt_tokens: initial,
                max_response_tokens: self.budget.max_response_tokens,
                trimmed: 0,
            });
        }

        info!(
            tokens = initial,
            ceiling = self.budget.input_ceiling,
            "Prompt too long, trimming history"
        );

        let mut count = initial;
        let mut trimmed = 0;
        while count > self.budget.input_ceiling && messages.len() > 2 {
            messages.remove(1);
            trimmed += 1;
            count = self.counter.count(&messages);
        }

        info!(old_tokens = initial, new_tokens = count, trimmed, "History trimmed");

        let mut max_response_tokens = self.budget.max_response_tokens;
        if count > self.budget.input_ceiling {
            let remaining = self.budget.total_ceiling.saturating_sub(count);
            if remaining == 0 {
                return Err(WindowError::BudgetExhausted {
                    prompt_tokens: count,
                    total_ceiling: self.budget.total_ceiling,
                });
            }
            max_response_tokens = max_response_tokens.min(remaining);
            warn!(max_response_tokens, "Reduced response length to fit the model window");
        }

        Ok(PreparedPrompt {
            messages,
            prompt_tokens: count,
            max_response_tokens,
            trimmed,
        })
    }
}
