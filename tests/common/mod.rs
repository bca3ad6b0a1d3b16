#![allow(dead_code)]

use async_trait::async_trait;
use rs_sqs_consumer::client::{FetchOptions, FetchResponse, Message, QueueClient};
use rs_sqs_consumer::consumer::ConsumerEvent;
use rs_sqs_consumer::errors::{QueueOperation, QueueServiceError};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, timeout};

pub const QUEUE_NAME: &str = "test-queue";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn message(id: &str) -> Message {
    Message::new(id, format!("receipt-{id}")).with_body(format!("body of {id}"))
}

/// Queue client that replays scripted fetch responses and records every call.
/// Once the script runs out every fetch returns an empty batch.
#[derive(Default)]
pub struct FakeQueueClient {
    responses: Mutex<VecDeque<FetchResponse>>,
    fetches: Mutex<Vec<(Instant, FetchOptions)>>,
    deletes: Mutex<Vec<(String, String)>>,
    failing_deletes: HashSet<String>,
}

impl FakeQueueClient {
    pub fn new(responses: Vec<FetchResponse>) -> Self {
        FakeQueueClient {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn failing_deletes_for(mut self, message_id: &str) -> Self {
        self.failing_deletes.insert(message_id.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetch_instants(&self) -> Vec<Instant> {
        self.fetches.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub fn fetch_options(&self) -> Vec<FetchOptions> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }

    /// Ids of deleted messages, sorted.
    pub fn deleted_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .deletes
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.deletes.lock().unwrap().clone()
    }

    /// Waits (in virtual time when the clock is paused) until at least `n`
    /// fetches have been issued.
    pub async fn wait_for_fetches(&self, n: usize) {
        timeout(Duration::from_secs(600), async {
            while self.fetch_count() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {n} fetches, saw {}", self.fetch_count()));
    }

    /// Time between fetch `i` and fetch `i + 1`.
    pub fn gap_after(&self, i: usize) -> Duration {
        let instants = self.fetch_instants();
        instants[i + 1] - instants[i]
    }
}

#[async_trait]
impl QueueClient for FakeQueueClient {
    async fn fetch_messages(&self, queue_name: &str, options: &FetchOptions) -> FetchResponse {
        assert_eq!(queue_name, QUEUE_NAME);
        self.fetches
            .lock()
            .unwrap()
            .push((Instant::now(), options.clone()));
        self.responses.lock().unwrap().pop_front().unwrap_or_default()
    }

    async fn delete_message(
        &self,
        queue_name: &str,
        message_id: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueServiceError> {
        assert_eq!(queue_name, QUEUE_NAME);
        if self.failing_deletes.contains(message_id) {
            return Err(QueueServiceError::new(
                QueueOperation::Delete,
                "ReceiptHandleIsInvalid",
            )
            .with_status(400));
        }
        self.deletes
            .lock()
            .unwrap()
            .push((message_id.to_string(), receipt_handle.to_string()));
        Ok(())
    }
}

pub async fn next_event(rx: &mut UnboundedReceiver<ConsumerEvent>) -> ConsumerEvent {
    timeout(Duration::from_secs(600), rx.recv())
        .await
        .expect("timed out waiting for consumer event")
        .expect("event channel closed")
}

/// Collects events up to and including the next `ResponseProcessed`.
pub async fn events_until_batch_done(
    rx: &mut UnboundedReceiver<ConsumerEvent>,
) -> Vec<ConsumerEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = matches!(event, ConsumerEvent::ResponseProcessed);
        events.push(event);
        if done {
            return events;
        }
    }
}
