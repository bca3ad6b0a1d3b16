use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use log::{debug, error, info, trace};

use crate::client::{FetchOptions, FetchResponse, Message, QueueClient};
use crate::errors::{ConsumerError, GenericError};

pub mod config;
pub mod events;
mod handler;

pub use config::{ConsumerConfig, ConsumerOptions};
pub use events::{ChannelSink, ConsumerEvent, EventSink, LoggingSink};
pub use handler::{FnHandler, HandlerFn, MessageHandler, handler_fn};

/// Polls a queue, hands each message to a [`MessageHandler`] and deletes the
/// messages that were handled successfully.
///
/// After a batch with messages the next fetch is issued immediately. After an
/// empty or failed fetch the loop waits `poll_delay`, or
/// `authentication_error_timeout` when the service rejected the credentials.
///
/// Cloning a `Consumer` gives another handle to the same poll loop.
#[derive(Clone)]
pub struct Consumer {
    inner: Arc<Inner>,
}

struct Inner {
    queue_name: String,
    config: ConsumerConfig,
    handler: Arc<dyn MessageHandler>,
    client: Arc<dyn QueueClient>,
    sink: Arc<dyn EventSink>,
    state: Mutex<LoopState>,
}

/// `stopped` is what `start`/`stop` toggle. `active` is true while a poll
/// loop task exists; it is cleared by that task under the same lock, when it
/// observes `stopped`.
#[derive(Debug)]
struct LoopState {
    stopped: bool,
    active: bool,
}

impl Consumer {
    /// Validates `options` and builds a stopped consumer.
    pub fn new(options: ConsumerOptions) -> Result<Self, ConsumerError> {
        options.validate()?;

        let ConsumerOptions {
            queue_name: Some(queue_name),
            handler: Some(handler),
            client: Some(client),
            event_sink,
            config,
        } = options
        else {
            return Err(ConsumerError::ConfigurationError(
                "incomplete consumer options".to_string(),
            ));
        };

        Ok(Consumer {
            inner: Arc::new(Inner {
                queue_name,
                config,
                handler,
                client,
                sink: event_sink.unwrap_or_else(|| Arc::new(LoggingSink)),
                state: Mutex::new(LoopState {
                    stopped: true,
                    active: false,
                }),
            }),
        })
    }

    pub fn queue_name(&self) -> &str {
        &self.inner.queue_name
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.inner.config
    }

    pub fn is_running(&self) -> bool {
        !self.inner.lock_state().stopped
    }

    /// Starts polling. Does nothing if the consumer is already running.
    ///
    /// If a previous poll loop has not yet observed an earlier `stop()`, that
    /// loop simply keeps going and no second loop is spawned.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start(&self) {
        let mut state = self.inner.lock_state();
        if !state.stopped {
            return;
        }
        state.stopped = false;

        if state.active {
            debug!("Resuming poll loop for {}", self.inner.queue_name);
            return;
        }
        state.active = true;
        drop(state);

        info!("Starting consumer for {}", self.inner.queue_name);
        tokio::spawn(poll(self.inner.clone()));
    }

    /// Stops polling before the next fetch.
    ///
    /// An in-flight fetch and the batch being processed are left to finish;
    /// [`ConsumerEvent::Stopped`] is emitted once the loop halts.
    pub fn stop(&self) {
        let mut state = self.inner.lock_state();
        if !state.stopped {
            info!("Stopping consumer for {}", self.inner.queue_name);
            state.stopped = true;
        }
    }
}

async fn poll(inner: Arc<Inner>) {
    loop {
        if inner.observe_stop() {
            inner.sink.emit(ConsumerEvent::Stopped);
            return;
        }

        trace!("Polling {}", inner.queue_name);
        let response = inner
            .client
            .fetch_messages(&inner.queue_name, &inner.fetch_options())
            .await;

        let delay = inner.clone().handle_response(response).await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` when the loop should halt, marking it inactive.
    fn observe_stop(&self) -> bool {
        let mut state = self.lock_state();
        if state.stopped {
            state.active = false;
        }
        state.stopped
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            count: self.config.batch_size,
            max_execution_time: self.config.maximum_execution_time,
            visibility_timeout: self.config.visibility_timeout,
            attribute_names: self.config.attribute_names.clone(),
            message_attribute_names: self.config.message_attribute_names.clone(),
        }
    }

    /// Dispatches the fetched messages, if any, and returns how long to wait
    /// before the next fetch.
    async fn handle_response(self: Arc<Self>, response: FetchResponse) -> Duration {
        let FetchResponse { messages, error } = response;

        let authentication_failed = error
            .as_ref()
            .is_some_and(|e| e.is_authentication_error());
        if let Some(error) = error {
            self.sink.emit(ConsumerEvent::Error {
                error: ConsumerError::QueueService(error),
                message: None,
            });
        }

        if !messages.is_empty() {
            self.clone().dispatch(messages).await;
            self.sink.emit(ConsumerEvent::ResponseProcessed);
            return Duration::ZERO;
        }

        if authentication_failed {
            debug!(
                "Authentication error, pausing {:?} before polling {}",
                self.config.authentication_error_timeout, self.queue_name
            );
            self.config.authentication_error_timeout
        } else {
            debug!(
                "No messages, pausing {:?} before polling {}",
                self.config.poll_delay, self.queue_name
            );
            self.config.poll_delay
        }
    }

    /// Processes every message concurrently and waits for all of them.
    async fn dispatch(self: Arc<Self>, messages: Vec<Message>) {
        let tasks = messages.into_iter().map(|message| {
            let inner = self.clone();
            tokio::spawn(async move { inner.process_message(message).await })
        });

        for result in join_all(tasks).await {
            if let Err(e) = result {
                error!("Message task for {} failed: {}", self.queue_name, e);
            }
        }
    }

    async fn process_message(&self, message: Message) {
        self.sink.emit(ConsumerEvent::MessageReceived(message.clone()));

        let event = match self.handle_and_delete(&message).await {
            Ok(()) => ConsumerEvent::MessageProcessed(message),
            Err(error) if error.is_queue_service_error() => ConsumerEvent::Error {
                error,
                message: Some(message),
            },
            Err(error) => ConsumerEvent::ProcessingError { error, message },
        };
        self.sink.emit(event);
    }

    async fn handle_and_delete(&self, message: &Message) -> Result<(), ConsumerError> {
        match AssertUnwindSafe(self.handler.handle_message(message))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ConsumerError::ProcessingError(e)),
            Err(panic) => {
                return Err(ConsumerError::ProcessingError(Box::new(
                    GenericError::from_panic(panic),
                )));
            }
        }

        self.client
            .delete_message(&self.queue_name, &message.message_id, &message.receipt_handle)
            .await?;
        Ok(())
    }
}
