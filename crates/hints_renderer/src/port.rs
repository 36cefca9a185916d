//! Outbound connection to the background coordinator.

use core::fmt;
use std::error::Error;

use tokio::sync::mpsc::UnboundedSender;

use crate::messages::ToBackground;

/// Why a message could not be handed to the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// The background side went away.
    Disconnected,
    /// Nothing is listening yet; the background was not ready for us.
    NotReady,
}

impl fmt::Display for PortError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(formatter, "background port disconnected"),
            Self::NotReady => write!(formatter, "background is not listening yet"),
        }
    }
}

impl Error for PortError {}

/// Sink for renderer reports.
pub trait BackgroundPort {
    /// Hand `message` to the background.
    ///
    /// # Errors
    ///
    /// Returns [`PortError`] if the message could not be delivered.
    fn send(&mut self, message: ToBackground) -> Result<(), PortError>;
}

impl BackgroundPort for UnboundedSender<ToBackground> {
    fn send(&mut self, message: ToBackground) -> Result<(), PortError> {
        UnboundedSender::send(self, message).map_err(|_| PortError::Disconnected)
    }
}
