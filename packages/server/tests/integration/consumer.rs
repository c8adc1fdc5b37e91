use std::time::Duration;

use server::consumers::consume_updates;

use crate::common::{MIB, TestApp, command_event, document, file_event};

#[tokio::test]
async fn polled_events_are_dispatched() {
    let app = TestApp::spawn().await;
    app.ids.push("a1b2c3d4e5");
    app.transport.queue_batch(vec![
        file_event(10, 42, document("doc-10", Some("report.pdf"), MIB)),
        command_event(11, 7, "/start"),
    ]);

    let consumer = tokio::spawn(consume_updates(
        app.transport.clone(),
        app.state.dispatcher.clone(),
        Duration::from_secs(1),
        2,
    ));

    let stored = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let listed = app.store.list_by_owner(42, 10).collect().await.unwrap();
            if !listed.is_empty() && app.transport.last_message_to(7).is_some() {
                break listed;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("consumer should process the batch");
    consumer.abort();

    assert_eq!(stored[0].identifier.as_str(), "a1b2c3d4e5");
    assert!(app.transport.last_message_to(7).unwrap().contains("Hello Ada"));
    assert_eq!(app.transport.webhook_deletes(), 1);

    let offsets = app.transport.offsets_polled();
    assert_eq!(offsets[0], None);
    assert!(offsets[1..].iter().all(|offset| *offset == Some(12)));
}
