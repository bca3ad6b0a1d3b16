use std::any::Any;
use std::fmt::{self, Write};

use aws_sdk_sqs::error::{ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Boxed error returned by user message handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Service error codes that indicate the request was rejected because of
/// missing, invalid or expired credentials.
const AUTHENTICATION_ERROR_CODES: &[&str] = &[
    "CredentialsError",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
    "AccessDenied",
    "AccessDeniedException",
    "ExpiredToken",
];

/// Error types for the SQS consumer.
///
/// Configuration errors are returned synchronously when a consumer is built.
/// Everything else happens after the poll loop is running and is reported
/// through [`crate::consumer::events::ConsumerEvent`] instead of being returned.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// A required option is missing or an option is out of range.
    #[error("invalid consumer configuration: {0}")]
    ConfigurationError(String),

    /// A fetch or delete call against the queue service failed.
    #[error(transparent)]
    QueueService(#[from] QueueServiceError),

    /// The message handler returned an error or panicked.
    #[error("failed to process message: {0}")]
    ProcessingError(#[source] HandlerError),
}

impl ConsumerError {
    /// Returns `true` for failures of the queue service itself, as opposed
    /// to failures raised by the message handler.
    pub fn is_queue_service_error(&self) -> bool {
        matches!(self, ConsumerError::QueueService(_))
    }

    /// Returns `true` when this is a queue service error caused by bad credentials.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            ConsumerError::QueueService(e) => e.is_authentication_error(),
            _ => false,
        }
    }
}

/// The queue service call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOperation {
    ResolveQueueUrl,
    Receive,
    Delete,
}

impl fmt::Display for QueueOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueOperation::ResolveQueueUrl => write!(f, "get queue url"),
            QueueOperation::Receive => write!(f, "receive message"),
            QueueOperation::Delete => write!(f, "delete message"),
        }
    }
}

/// A failed call against the queue service.
#[derive(Debug, Clone, Error)]
#[error("SQS {operation} failed: {message}")]
pub struct QueueServiceError {
    operation: QueueOperation,
    status: Option<u16>,
    code: Option<String>,
    message: String,
}

impl QueueServiceError {
    pub fn new(operation: QueueOperation, message: impl Into<String>) -> Self {
        QueueServiceError {
            operation,
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// Sets the HTTP status code returned by the service.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the service error code (e.g. `InvalidClientTokenId`).
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Builds a `QueueServiceError` from an AWS SDK error, keeping the HTTP
    /// status and the service error code when the request reached the service.
    pub fn from_sdk<E>(operation: QueueOperation, err: SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let status = err.raw_response().map(|response| response.status().as_u16());
        let code = err.code().map(str::to_owned);

        let mut message = String::new();
        if write_err(&mut message, &err).is_err() {
            message = err.to_string();
        }

        QueueServiceError {
            operation,
            status,
            code,
            message,
        }
    }

    pub fn operation(&self) -> QueueOperation {
        self.operation
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the service rejected the request with HTTP 403 or
    /// with one of the known credentials error codes.
    pub fn is_authentication_error(&self) -> bool {
        self.status == Some(403)
            || self
                .code
                .as_deref()
                .is_some_and(|code| AUTHENTICATION_ERROR_CODES.contains(&code))
    }
}

fn write_err(s: &mut String, err: &dyn std::error::Error) -> fmt::Result {
    write!(s, "{err}")?;
    if let Some(source) = err.source() {
        write!(s, ": ")?;
        write_err(s, source)?;
    }

    Ok(())
}

/// Generic error type for handling unexpected errors.
#[derive(Debug, Error)]
pub struct GenericError(String);

impl GenericError {
    /// Creates a new `GenericError` with the provided message.
    pub fn new(message: String) -> Self {
        GenericError(message)
    }

    /// Converts a caught panic payload into an error, keeping the panic
    /// message when it is a string.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        GenericError::new(format!("message handler panicked: {detail}"))
    }
}

impl fmt::Display for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
