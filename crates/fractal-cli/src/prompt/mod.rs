//! Interactive questions asked during login.

use inquire::{Confirm, InquireError, Password, PasswordDisplayMode};
use thiserror::Error;

/// Errors raised while asking the user a question.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The user dismissed the prompt.
    #[error("prompt cancelled")]
    Cancelled,
    /// The terminal could not be used for prompting.
    #[error("failed to prompt for input: {0}")]
    Terminal(#[source] InquireError),
}

impl From<InquireError> for PromptError {
    fn from(error: InquireError) -> Self {
        match error {
            InquireError::OperationCanceled | InquireError::OperationInterrupted => Self::Cancelled,
            other => Self::Terminal(other),
        }
    }
}

/// Source of interactive answers.
pub trait Prompt {
    /// Asks for a secret without echoing it.
    fn password(&self, message: &str) -> Result<String, PromptError>;

    /// Asks a yes/no question; anything but an explicit yes is `false`.
    fn confirm(&self, message: &str) -> Result<bool, PromptError>;
}

/// Prompts on the controlling terminal via `inquire`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn password(&self, message: &str) -> Result<String, PromptError> {
        Password::new(message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .map_err(PromptError::from)
    }

    fn confirm(&self, message: &str) -> Result<bool, PromptError> {
        Confirm::new(message)
            .with_default(false)
            .prompt()
            .map_err(PromptError::from)
    }
}
