use common::Identifier;

use crate::common::{TestApp, command_event};

async fn send(app: &TestApp, owner_id: i64, text: &str) -> String {
    app.state
        .dispatcher
        .dispatch(command_event(1, owner_id, text))
        .await;
    app.transport
        .last_message_to(owner_id)
        .expect("bot should reply")
}

#[tokio::test]
async fn start_greets_and_names_limit() {
    let app = TestApp::spawn().await;

    let reply = send(&app, 42, "/start").await;

    assert!(reply.contains("Hello Ada"));
    assert!(reply.contains("20.00 MB"));
    assert_eq!(send(&app, 42, "/help@filelink_bot").await, reply);
}

#[tokio::test]
async fn files_lists_only_own_uploads() {
    let app = TestApp::spawn().await;
    app.seed_record("a1b2c3d4e5", 42, "mine.pdf").await;
    app.seed_record("b2c3d4e5f6", 7, "theirs.pdf").await;

    let reply = send(&app, 42, "/files").await;

    assert!(reply.contains("mine.pdf"));
    assert!(reply.contains("https://files.example.com/get?id=a1b2c3d4e5"));
    assert!(!reply.contains("theirs.pdf"));
}

#[tokio::test]
async fn files_without_uploads() {
    let app = TestApp::spawn().await;

    let reply = send(&app, 42, "/files").await;
    assert!(reply.contains("not uploaded any files"));
}

#[tokio::test]
async fn owner_can_delete_own_file() {
    let app = TestApp::spawn().await;
    app.seed_record("a1b2c3d4e5", 42, "mine.pdf").await;

    let reply = send(&app, 42, "/delete a1b2c3d4e5").await;

    assert!(reply.contains("Deleted a1b2c3d4e5"));
    let id = Identifier::parse("a1b2c3d4e5").unwrap();
    assert!(app.store.find_by_identifier(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_foreign_file_leaves_it_intact() {
    let app = TestApp::spawn().await;
    let theirs = app.seed_record("b2c3d4e5f6", 7, "theirs.pdf").await;

    let reply = send(&app, 42, "/delete b2c3d4e5f6").await;

    assert!(reply.contains("No file with ID b2c3d4e5f6"));
    assert_eq!(
        app.store.find_by_identifier(&theirs.identifier).await.unwrap(),
        Some(theirs)
    );
    assert!(app.faults.reports().is_empty());
}

#[tokio::test]
async fn delete_argument_handling() {
    let app = TestApp::spawn().await;

    assert!(send(&app, 42, "/delete").await.starts_with("Usage"));
    assert!(send(&app, 42, "/delete NOT-AN-ID").await.contains("No file with ID"));
}

#[tokio::test]
async fn other_text_gets_hints() {
    let app = TestApp::spawn().await;

    assert!(send(&app, 42, "hello bot").await.contains("Send me a document"));
    assert!(send(&app, 42, "/frobnicate").await.contains("Unknown command"));
}
