//! Status feedback derived from the `deposit` slice.

use std::{fmt, sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    error_labels::{label_errors, render_messages, LabelTable, Rendered},
    store::{ActionState, DepositState},
};

pub const LABEL_RESET_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Pending,
    Positive,
    Warning,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub tone: Tone,
    pub headline: String,
    pub details: Vec<(String, Rendered)>,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline)?;
        for (label, rendered) in &self.details {
            match rendered {
                Rendered::Inline(message) => write!(f, "\n{label}: {message}")?,
                Rendered::List(_) => write!(f, "\n{label}:\n{rendered}")?,
            }
        }
        Ok(())
    }
}

const FORM_ERRORS_HEADLINE: &str =
    "Oops, something went wrong! The form has errors. Please fix them and try again.";

fn headline_for(action_state: ActionState) -> Option<(Tone, &'static str)> {
    let message = match action_state {
        ActionState::Idle => return None,
        ActionState::DraftSaveStarted => (Tone::Pending, "Saving draft..."),
        ActionState::DraftPublishStarted => (Tone::Pending, "Publishing draft..."),
        ActionState::DraftSubmitReviewStarted => (Tone::Pending, "Submitting for review..."),
        ActionState::DraftPreviewStarted => (Tone::Pending, "Preparing preview..."),
        ActionState::DraftDeleteStarted => (Tone::Pending, "Deleting draft..."),
        ActionState::ReservePidStarted => (Tone::Pending, "Reserving identifier..."),
        ActionState::DiscardPidStarted => (Tone::Pending, "Discarding identifier..."),
        ActionState::DraftSaveSucceeded => (Tone::Positive, "Record successfully saved."),
        ActionState::ReservePidSucceeded => (Tone::Positive, "Identifier reserved."),
        ActionState::DiscardPidSucceeded => (Tone::Positive, "Identifier discarded."),
        ActionState::DraftHasValidationErrors => {
            (Tone::Warning, "Record saved with validation feedback in:")
        }
        ActionState::DraftSaveFailed
        | ActionState::DraftPublishFailed
        | ActionState::DraftSubmitReviewFailed
        | ActionState::DraftPreviewFailed => (Tone::Negative, FORM_ERRORS_HEADLINE),
        ActionState::DraftDeleteFailed => (Tone::Negative, "Draft deletion failed."),
        ActionState::ReservePidFailed => (Tone::Negative, "Identifier reservation failed."),
        ActionState::DiscardPidFailed => (Tone::Negative, "Identifier could not be discarded."),
    };
    Some(message)
}

/// `None` while no operation has run; otherwise always some feedback.
pub fn present(state: &DepositState, labels: &LabelTable) -> Option<Feedback> {
    let (tone, headline) = headline_for(state.action_state)?;
    let details = if state.action_state.is_started() {
        Vec::new()
    } else {
        label_errors(&state.errors, labels)
            .iter()
            .map(|(label, messages)| (label.to_string(), render_messages(messages)))
            .collect()
    };

    Some(Feedback {
        tone,
        headline: headline.to_string(),
        details,
    })
}

/// A button caption that shows a confirmation briefly and then reverts.
///
/// A newer flash cancels the pending revert. Dropping the label cancels it
/// too, so a discarded view is never written to.
pub struct TransientLabel {
    resting: String,
    delay: Duration,
    text: Arc<watch::Sender<String>>,
    reset: Option<JoinHandle<()>>,
}

impl TransientLabel {
    pub fn new(resting: impl Into<String>) -> Self {
        Self::with_delay(resting, LABEL_RESET_DELAY)
    }

    pub fn with_delay(resting: impl Into<String>, delay: Duration) -> Self {
        let resting = resting.into();
        let (text, _) = watch::channel(resting.clone());
        Self {
            resting,
            delay,
            text: Arc::new(text),
            reset: None,
        }
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.text.subscribe()
    }

    /// Must be called from within a tokio runtime.
    pub fn flash(&mut self, message: impl Into<String>) {
        self.cancel();
        self.text.send_replace(message.into());

        let text = Arc::clone(&self.text);
        let resting = self.resting.clone();
        let delay = self.delay;
        self.reset = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            text.send_replace(resting);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(reset) = self.reset.take() {
            reset.abort();
        }
    }
}

impl Drop for TransientLabel {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/feedback_tests.rs"]
mod tests;
