// Report notifications. Delivery is best effort: a failed email never fails a report.

use std::sync::Mutex;

use log::{info, warn};

use crate::error::BoundaryError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: Option<String>,
    pub text_body: Option<String>,
}

pub trait EmailSender: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), BoundaryError>;
}

/// Writes the message to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl EmailSender for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), BoundaryError> {
        info!(
            "email from {} to {}: {}",
            message.from,
            message.to.join(", "),
            message.subject
        );
        Ok(())
    }
}

/// Keeps sent messages in memory. Can be told to fail every delivery.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl EmailSender for MemoryOutbox {
    fn send(&self, message: &EmailMessage) -> Result<(), BoundaryError> {
        if self.fail {
            return Err(BoundaryError::Delivery("outbox rejected message".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }
}

/// Send and log the outcome. Returns whether delivery succeeded.
pub fn send_best_effort(sender: &dyn EmailSender, message: &EmailMessage) -> bool {
    if message.to.is_empty() {
        return false;
    }
    match sender.send(message) {
        Ok(()) => true,
        Err(e) => {
            warn!("notification '{}' not delivered: {}", message.subject, e);
            false
        }
    }
}
