use crate::client::Message;
use crate::errors::HandlerError;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

/// Trait for implementing SQS message handlers.
///
/// A handler that returns `Ok(())` gets its message deleted from the queue.
/// A handler that returns an error or panics leaves the message in place, so
/// it becomes visible again once its visibility timeout runs out.
///
/// Handlers for the messages of one batch run concurrently.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes a single message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message fetched from the queue
    async fn handle_message(&self, message: &Message) -> Result<(), HandlerError>;
}

/// Wraps a closure taking only the message as a [`MessageHandler`].
///
/// ```rust
/// use rs_sqs_consumer::client::Message;
/// use rs_sqs_consumer::consumer::handler_fn;
///
/// let handler = handler_fn(|message: Message| async move {
///     println!("got {}", message.message_id);
///     Ok(())
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    FnHandler { f }
}

/// See [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle_message(&self, message: &Message) -> Result<(), HandlerError> {
        (self.f)(message.clone()).await
    }
}

/// [`MessageHandler`] that passes a clone of a shared resource to the
/// wrapped function alongside every message.
///
/// # Type Parameters
///
/// * `RFn` - The message handler function type
/// * `Fut` - The future returned by the handler function
/// * `TShared` - The type of shared resources passed to the handler
pub struct HandlerFn<RFn, Fut, TShared>
where
    RFn: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    rv_fn: RFn,
    shared_resources: TShared,
    _fut: PhantomData<fn() -> Fut>,
}

impl<RFn, Fut, TShared> HandlerFn<RFn, Fut, TShared>
where
    RFn: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    /// Creates a new handler.
    ///
    /// # Arguments
    ///
    /// * `rv_fn` - The message handler function
    /// * `shared_resources` - Resources shared between message processing calls
    pub fn new(rv_fn: RFn, shared_resources: TShared) -> Self {
        HandlerFn {
            rv_fn,
            shared_resources,
            _fut: PhantomData,
        }
    }
}

#[async_trait]
impl<RFn, Fut, TShared> MessageHandler for HandlerFn<RFn, Fut, TShared>
where
    RFn: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    async fn handle_message(&self, message: &Message) -> Result<(), HandlerError> {
        (self.rv_fn)(message.clone(), self.shared_resources.clone()).await
    }
}
