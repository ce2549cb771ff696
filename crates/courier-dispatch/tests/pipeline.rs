// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler driving a real batch processor end to end.

use std::sync::Arc;
use std::time::Duration;

use courier_core::{MessageStatus, MessageStore, NoopCache};
use courier_dispatch::{BatchProcessor, Scheduler, SchedulerOptions};
use courier_storage::MemoryMessageStore;
use courier_test_utils::{StubSender, pending_message};

#[tokio::test(start_paused = true)]
async fn scheduler_drains_pending_messages_in_batches() {
    let store = Arc::new(MemoryMessageStore::new());
    for i in 0..5 {
        store
            .create(&pending_message(&format!("+{i}"), "hello").unwrap())
            .await
            .unwrap();
    }

    let sender = Arc::new(StubSender::new());
    let processor = Arc::new(BatchProcessor::new(
        store.clone(),
        sender.clone(),
        Arc::new(NoopCache),
    ));

    let scheduler = Scheduler::new(SchedulerOptions {
        interval: Duration::from_millis(10),
        batch_size: 2,
        max_retries: 3,
        retry_delay: Duration::from_millis(1),
    });
    scheduler.set_processor(processor);
    scheduler.start().await.unwrap();

    // Two ticks: four messages sent, one still pending.
    tokio::time::sleep(Duration::from_millis(25)).await;
    assert_eq!(sender.call_count().await, 4);
    assert_eq!(store.list_pending(10).await.unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(10)).await;
    scheduler.stop().await.unwrap();

    assert_eq!(store.count_sent().await.unwrap(), 5);
    assert!(
        store
            .all()
            .await
            .iter()
            .all(|m| m.status == MessageStatus::Sent)
    );
}

#[tokio::test(start_paused = true)]
async fn slow_batches_never_overlap() {
    let store = Arc::new(MemoryMessageStore::new());
    for i in 0..6 {
        store
            .create(&pending_message(&format!("+{i}"), "hello").unwrap())
            .await
            .unwrap();
    }

    // Each send takes longer than the interval.
    let sender = Arc::new(StubSender::with_delay(Duration::from_millis(30)));
    let processor = Arc::new(BatchProcessor::new(
        store.clone(),
        sender.clone(),
        Arc::new(NoopCache),
    ));

    let scheduler = Scheduler::new(SchedulerOptions {
        interval: Duration::from_millis(10),
        batch_size: 2,
        max_retries: 1,
        retry_delay: Duration::from_millis(1),
    });
    scheduler.set_processor(processor);
    scheduler.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    scheduler.stop().await.unwrap();

    // Overlapping batches would have sent some message twice.
    let calls = sender.calls().await;
    let mut recipients: Vec<_> = calls.iter().map(|c| c.to.clone()).collect();
    recipients.sort();
    recipients.dedup();
    assert_eq!(recipients.len(), calls.len());
    assert_eq!(calls.len(), 6);
}
