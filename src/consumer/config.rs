use std::sync::Arc;
use std::time::Duration;

use crate::client::QueueClient;
use crate::consumer::Consumer;
use crate::consumer::events::EventSink;
use crate::consumer::handler::MessageHandler;
use crate::errors::ConsumerError;

/// SQS will not return more than this many messages per receive call.
pub const MAX_BATCH_SIZE: i32 = 10;

/// Batch and timing settings for a [`Consumer`].
///
/// # Fields
/// - `batch_size`: The maximum number of messages fetched per poll (1-10).
/// - `poll_delay`: Delay before polling again after an empty or failed fetch.
/// - `maximum_execution_time`: Upper bound on a single fetch.
/// - `authentication_error_timeout`: Delay before polling again after a credentials failure.
/// - `visibility_timeout`: Visibility timeout requested for fetched messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub batch_size: i32,
    pub poll_delay: Duration,
    pub maximum_execution_time: Duration,
    pub authentication_error_timeout: Duration,
    pub visibility_timeout: Option<Duration>,

    /// System attributes to request with each message (e.g. `SentTimestamp`).
    pub attribute_names: Vec<String>,

    /// Custom message attributes to request with each message.
    pub message_attribute_names: Vec<String>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            batch_size: 1,
            poll_delay: Duration::from_secs(1),
            maximum_execution_time: Duration::from_secs(10),
            authentication_error_timeout: Duration::from_secs(10),
            visibility_timeout: None,
            attribute_names: Vec::new(),
            message_attribute_names: Vec::new(),
        }
    }
}

impl ConsumerConfig {
    pub(crate) fn validate(&self) -> Result<(), ConsumerError> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(ConsumerError::ConfigurationError(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.maximum_execution_time.is_zero() {
            return Err(ConsumerError::ConfigurationError(
                "maximum_execution_time must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for building a [`Consumer`].
///
/// `queue_name`, a handler and a queue client are required.
///
/// ```rust,no_run
/// use rs_sqs_consumer::client::create_sqs_client_from_env;
/// use rs_sqs_consumer::consumer::{ConsumerOptions, handler_fn};
/// use rs_sqs_consumer::client::Message;
///
/// # async fn example() -> Result<(), rs_sqs_consumer::errors::ConsumerError> {
/// let consumer = ConsumerOptions::new()
///     .queue_name("orders")
///     .client(create_sqs_client_from_env().await)
///     .handler(handler_fn(|message: Message| async move {
///         println!("{:?}", message.body);
///         Ok(())
///     }))
///     .batch_size(10)
///     .build()?;
/// consumer.start();
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ConsumerOptions {
    pub(crate) queue_name: Option<String>,
    pub(crate) handler: Option<Arc<dyn MessageHandler>>,
    pub(crate) client: Option<Arc<dyn QueueClient>>,
    pub(crate) event_sink: Option<Arc<dyn EventSink>>,
    pub(crate) config: ConsumerConfig,
}

impl ConsumerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = Some(queue_name.into());
        self
    }

    pub fn handler(mut self, handler: impl MessageHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets the queue client, taking ownership of it.
    pub fn client(mut self, client: impl QueueClient + 'static) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Sets a queue client that is shared with other owners.
    pub fn shared_client(mut self, client: Arc<dyn QueueClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets where consumer events are delivered. Defaults to [`crate::consumer::events::LoggingSink`].
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Replaces all batch and timing settings at once.
    pub fn config(mut self, config: ConsumerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn batch_size(mut self, batch_size: i32) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn poll_delay_seconds(mut self, seconds: u64) -> Self {
        self.config.poll_delay = Duration::from_secs(seconds);
        self
    }

    pub fn maximum_execution_time_seconds(mut self, seconds: u64) -> Self {
        self.config.maximum_execution_time = Duration::from_secs(seconds);
        self
    }

    pub fn authentication_error_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.authentication_error_timeout = Duration::from_secs(seconds);
        self
    }

    pub fn visibility_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.visibility_timeout = Some(Duration::from_secs(seconds));
        self
    }

    pub fn attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn message_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.message_attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the options and builds the consumer. Same as [`Consumer::new`].
    pub fn build(self) -> Result<Consumer, ConsumerError> {
        Consumer::new(self)
    }

    pub(crate) fn validate(&self) -> Result<(), ConsumerError> {
        if self.queue_name.as_deref().is_none_or(str::is_empty) {
            return Err(missing_option("queue_name"));
        }
        if self.handler.is_none() {
            return Err(missing_option("handler"));
        }
        if self.client.is_none() {
            return Err(missing_option("client"));
        }
        self.config.validate()
    }
}

fn missing_option(name: &str) -> ConsumerError {
    ConsumerError::ConfigurationError(format!("missing consumer option [{name}]"))
}
