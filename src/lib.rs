//! # AWS SQS Consumer
//!
//! A polling consumer for AWS SQS. It repeatedly fetches a batch of messages,
//! hands each one to a user-supplied handler, deletes the messages that were
//! handled successfully and polls again, until it is stopped.
//!
//! ## Features
//!
//! - Concurrent processing of every message in a batch, with the next fetch
//!   issued only once the whole batch is resolved
//! - Automatic message deletion on successful processing
//! - Separate backoff for empty polls and for authentication failures
//! - Handler failures (including panics) and queue service failures reported
//!   as distinct [`consumer::ConsumerEvent`]s; the loop itself never fails
//! - Queue client behind the [`client::QueueClient`] trait, so tests can use a fake
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rs_sqs_consumer::client::{create_sqs_client_from_env, Message};
//! use rs_sqs_consumer::consumer::{handler_fn, ConsumerOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let consumer = ConsumerOptions::new()
//!         .queue_name("orders")
//!         .client(create_sqs_client_from_env().await)
//!         .handler(handler_fn(|message: Message| async move {
//!             println!("Processing message: {:?}", message.body);
//!             Ok(())
//!         }))
//!         .batch_size(10)
//!         .build()?;
//!
//!     consumer.start();
//!     tokio::signal::ctrl_c().await?;
//!     consumer.stop();
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod consumer;
pub mod errors;
