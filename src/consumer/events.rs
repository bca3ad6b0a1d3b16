//! Notifications emitted by a running [`crate::consumer::Consumer`].
//!
//! Every failure after the consumer has been built is reported here rather
//! than returned. A consumer with no sink configured uses [`LoggingSink`], so
//! an unobserved consumer still logs what happens to each message.

use log::{debug, error, info, trace, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::client::Message;
use crate::errors::ConsumerError;

#[derive(Debug)]
pub enum ConsumerEvent {
    /// A queue service call failed. `message` is set when the failure was a
    /// delete for that message, and `None` for fetch failures.
    Error {
        error: ConsumerError,
        message: Option<Message>,
    },
    /// The handler failed for `message`; it was not deleted.
    ProcessingError {
        error: ConsumerError,
        message: Message,
    },
    MessageReceived(Message),
    /// The handler succeeded and the message was deleted.
    MessageProcessed(Message),
    /// Every message of a fetched batch has been resolved.
    ResponseProcessed,
    /// The poll loop observed `stop()` and halted.
    Stopped,
}

/// Receives consumer events.
///
/// `emit` is called from the poll loop and from message tasks, so it should
/// return quickly.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ConsumerEvent);
}

/// Writes every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl EventSink for LoggingSink {
    fn emit(&self, event: ConsumerEvent) {
        match event {
            ConsumerEvent::Error {
                error,
                message: Some(message),
            } => error!("Error for message {}: {}", message.message_id, error),
            ConsumerEvent::Error {
                error,
                message: None,
            } => error!("Consumer error: {}", error),
            ConsumerEvent::ProcessingError { error, message } => {
                warn!("Error processing message {}: {}", message.message_id, error)
            }
            ConsumerEvent::MessageReceived(message) => {
                debug!("Received message {}", message.message_id)
            }
            ConsumerEvent::MessageProcessed(message) => {
                debug!("Processed message {}", message.message_id)
            }
            ConsumerEvent::ResponseProcessed => trace!("Batch processed"),
            ConsumerEvent::Stopped => info!("Consumer stopped"),
        }
    }
}

/// Forwards events into an unbounded tokio channel.
///
/// Once the receiver is dropped, events go to [`LoggingSink`] instead.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<ConsumerEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<ConsumerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelSink { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ConsumerEvent) {
        if let Err(mpsc::error::SendError(event)) = self.sender.send(event) {
            LoggingSink.emit(event);
        }
    }
}
