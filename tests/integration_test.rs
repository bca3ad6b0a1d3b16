use rs_sqs_consumer::client::{self, Message};
use rs_sqs_consumer::consumer::{ChannelSink, ConsumerEvent, ConsumerOptions, HandlerFn};
use rs_sqs_consumer::errors::HandlerError;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

#[derive(Clone)]
struct SharedCounter {
    count: Arc<Mutex<i32>>,
}

impl SharedCounter {
    fn new() -> Self {
        Self {
            count: Arc::new(Mutex::new(0)),
        }
    }

    async fn increment(&self) {
        let mut count = self.count.lock().await;
        *count += 1;
    }

    async fn get_count(&self) -> i32 {
        *self.count.lock().await
    }
}

async fn test_handler(message: Message, shared: SharedCounter) -> Result<(), HandlerError> {
    println!("Received message: {:?}", message.body);
    shared.increment().await;
    Ok(())
}

#[tokio::test]
#[ignore = "requires TEST_SQS_QUEUE_URL and AWS credentials"]
async fn test_sqs_consumer_processes_and_deletes() {
    dotenvy::dotenv().ok();

    let queue_url = env::var("TEST_SQS_QUEUE_URL").expect("TEST_SQS_QUEUE_URL must be set");

    let sqs_client = client::create_sqs_client_from_env().await;

    for i in 1..=2 {
        sqs_client
            .sqs_client()
            .send_message()
            .queue_url(&queue_url)
            .message_body(format!("Test message {i}"))
            .send()
            .await
            .expect("Failed to send test message");
    }

    let shared_counter = SharedCounter::new();
    let (sink, mut events) = ChannelSink::new();

    let consumer = ConsumerOptions::new()
        .queue_name(queue_url.as_str())
        .client(sqs_client)
        .handler(HandlerFn::new(test_handler, shared_counter.clone()))
        .batch_size(10)
        .event_sink(Arc::new(sink))
        .build()
        .expect("Failed to build consumer");

    consumer.start();

    let timeout_result = timeout(Duration::from_secs(30), async {
        while shared_counter.get_count().await < 2 {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    })
    .await;

    consumer.stop();

    let final_count = shared_counter.get_count().await;
    assert!(
        timeout_result.is_ok(),
        "Test timed out. Only processed {} messages",
        final_count
    );

    let stopped = timeout(Duration::from_secs(30), async {
        while let Some(event) = events.recv().await {
            match event {
                ConsumerEvent::Stopped => return true,
                ConsumerEvent::Error { error, .. } => panic!("Unexpected error: {error}"),
                _ => {}
            }
        }
        false
    })
    .await;
    assert_eq!(stopped.ok(), Some(true), "consumer did not report stopped");
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_sqs_consumer_resolves_queue_name() {
    dotenvy::dotenv().ok();

    let queue_name = "test-queue-consumer-by-name";

    let sqs_client = client::create_sqs_client_from_env().await;

    let queue_url = sqs_client
        .sqs_client()
        .create_queue()
        .queue_name(queue_name)
        .send()
        .await
        .expect("Failed to create queue")
        .queue_url()
        .expect("Queue url missing")
        .to_string();

    sqs_client
        .sqs_client()
        .send_message()
        .queue_url(&queue_url)
        .message_body("Queue name test message")
        .send()
        .await
        .expect("Failed to send test message");

    let shared_counter = SharedCounter::new();

    let consumer = ConsumerOptions::new()
        .queue_name(queue_name)
        .client(sqs_client.clone())
        .handler(HandlerFn::new(test_handler, shared_counter.clone()))
        .build()
        .expect("Failed to build consumer");

    consumer.start();

    let timeout_result = timeout(Duration::from_secs(30), async {
        while shared_counter.get_count().await < 1 {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    })
    .await;

    consumer.stop();

    let purge_result = sqs_client
        .sqs_client()
        .purge_queue()
        .queue_url(&queue_url)
        .send()
        .await;

    if let Err(e) = purge_result {
        println!("Warning: Failed to purge queue: {}", e);
    }

    assert!(
        timeout_result.is_ok(),
        "Queue name test timed out. Only processed {} messages",
        shared_counter.get_count().await
    );
}
