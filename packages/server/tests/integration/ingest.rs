use std::sync::Arc;
use std::time::Duration;

use common::{ContentKind, Identifier};
use server::faults::FaultOrigin;
use server::ingest::{GENERIC_FAILURE, UploadOutcome, UploadStage, ValidationError};
use transport::FileUpload;

use crate::common::{
    FakeTransport, MAX_BYTES, MIB, PanickingIds, TestApp, TestOptions, document, routes,
};

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn uploaded_document_is_resolvable_over_http() {
        let app = TestApp::spawn().await;
        app.ids.push("a1b2c3d4e5");

        let outcome = app
            .ingestor()
            .ingest(42, 42, document("doc-1", Some("report.pdf"), MIB))
            .await;

        let UploadOutcome::Stored { record, link } = outcome else {
            panic!("expected Stored, got {outcome:?}");
        };
        assert_eq!(record.identifier.as_str(), "a1b2c3d4e5");
        assert_eq!(record.owner_id, 42);
        assert_eq!(record.size_bytes, MIB);
        assert_eq!(link, "https://files.example.com/get?id=a1b2c3d4e5");

        let reply = app.transport.last_message_to(42).unwrap();
        assert!(reply.contains("a1b2c3d4e5"));
        assert!(reply.contains(&link));
        assert!(reply.contains("report.pdf"));
        assert!(reply.contains("1.00 MB"));

        let page = app.get(&routes::page("a1b2c3d4e5")).await;
        assert_eq!(page.status, 200);
        assert!(page.text.contains("report.pdf"));
        assert!(page.text.contains("1.00 MB"));

        let api = app.get(&routes::api_file("a1b2c3d4e5")).await;
        assert_eq!(api.status, 200);
        assert_eq!(api.body["identifier"], "a1b2c3d4e5");
        assert_eq!(api.body["display_name"], "report.pdf");
        assert_eq!(api.body["size_bytes"], MIB);
        assert_eq!(
            api.body["source_ref"],
            FakeTransport::source_ref_for("doc-1")
        );

        assert!(app.faults.reports().is_empty());
    }

    #[tokio::test]
    async fn every_upload_gets_its_own_identifier() {
        let app = TestApp::spawn().await;
        let ingestor = app.ingestor();

        let mut handles = Vec::new();
        for i in 0..10 {
            let ingestor = ingestor.clone();
            handles.push(tokio::spawn(async move {
                ingestor
                    .ingest(42, 42, document(&format!("doc-{i}"), Some("same.pdf"), 100))
                    .await
            }));
        }

        let mut identifiers = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                UploadOutcome::Stored { record, .. } => identifiers.push(record.identifier),
                other => panic!("expected Stored, got {other:?}"),
            }
        }
        identifiers.sort();
        identifiers.dedup();
        assert_eq!(identifiers.len(), 10);

        let listed = app.store.list_by_owner(42, 100).collect().await.unwrap();
        assert_eq!(listed.len(), 10);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn size_equal_to_limit_is_accepted() {
        let app = TestApp::spawn().await;

        let outcome = app
            .ingestor()
            .ingest(42, 42, document("doc-1", Some("big.zip"), MAX_BYTES))
            .await;

        assert!(matches!(outcome, UploadOutcome::Stored { .. }));
    }

    #[tokio::test]
    async fn one_byte_over_is_rejected_without_transport_calls() {
        let app = TestApp::spawn().await;

        let outcome = app
            .ingestor()
            .ingest(42, 42, document("doc-1", Some("huge.zip"), MAX_BYTES + 1))
            .await;

        assert_eq!(
            outcome,
            UploadOutcome::Rejected(ValidationError::TooLarge {
                size: MAX_BYTES + 1,
                max: MAX_BYTES,
            })
        );
        assert_eq!(app.transport.resolve_calls(), 0);
        assert!(app.store.list_by_owner(42, 10).collect().await.unwrap().is_empty());
        assert!(app.transport.last_message_to(42).unwrap().contains("20.00 MB"));
        assert!(app.faults.reports().is_empty());
    }

    #[tokio::test]
    async fn unsupported_kind_is_rejected() {
        let app = TestApp::spawn().await;
        let upload = FileUpload {
            kind: ContentKind::Other("sticker".into()),
            content_ref: "stk-1".into(),
            size_bytes: Some(10),
            file_name: None,
        };

        let outcome = app.ingestor().ingest(42, 42, upload).await;

        assert!(matches!(
            outcome,
            UploadOutcome::Rejected(ValidationError::UnsupportedType(ContentKind::Other(ref k))) if k == "sticker"
        ));
        assert_eq!(app.transport.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn missing_size_and_name_fall_back() {
        let app = TestApp::spawn().await;
        let upload = FileUpload {
            kind: ContentKind::Video,
            content_ref: "vid-9".into(),
            size_bytes: None,
            file_name: None,
        };

        let outcome = app.ingestor().ingest(42, 42, upload).await;

        let UploadOutcome::Stored { record, .. } = outcome else {
            panic!("expected Stored, got {outcome:?}");
        };
        assert_eq!(record.size_bytes, 0);
        assert_eq!(record.display_name, "vid-9.bin");
    }
}

mod identifier_collisions {
    use super::*;

    #[tokio::test]
    async fn collision_regenerates_once() {
        let app = TestApp::spawn().await;
        app.seed_record("a1b2c3d4e5", 7, "existing.pdf").await;
        app.ids.push("a1b2c3d4e5");
        app.ids.push("b2c3d4e5f6");

        let outcome = app
            .ingestor()
            .ingest(42, 42, document("doc-1", Some("report.pdf"), MIB))
            .await;

        let UploadOutcome::Stored { record, .. } = outcome else {
            panic!("expected Stored, got {outcome:?}");
        };
        assert_eq!(record.identifier.as_str(), "b2c3d4e5f6");
        assert_eq!(app.ids.generated(), 2);
        assert!(app.faults.reports().is_empty());

        let existing = app
            .store
            .find_by_identifier(&common::Identifier::parse("a1b2c3d4e5").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(existing.owner_id, 7);
    }

    #[tokio::test]
    async fn bound_reached_reports_storage_exhausted() {
        let app = TestApp::spawn_with(TestOptions {
            max_identifier_attempts: 3,
            ..Default::default()
        })
        .await;
        app.seed_record("a1b2c3d4e5", 7, "existing.pdf").await;
        for _ in 0..3 {
            app.ids.push("a1b2c3d4e5");
        }

        let outcome = app
            .ingestor()
            .ingest(42, 42, document("doc-1", Some("report.pdf"), MIB))
            .await;

        assert_eq!(
            outcome,
            UploadOutcome::Failed {
                stage: UploadStage::ReferenceResolved
            }
        );
        assert_eq!(app.ids.generated(), 3);

        let reports = app.faults.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, FaultOrigin::Ingestion);
        assert!(reports[0].2.contains("after 3 attempts"));
        assert_eq!(app.transport.last_message_to(42).unwrap(), GENERIC_FAILURE);
    }
}

mod transport_failures {
    use super::*;

    #[tokio::test]
    async fn single_failure_is_retried() {
        let app = TestApp::spawn().await;
        app.transport.fail_next_resolves(1);

        let outcome = app
            .ingestor()
            .ingest(42, 42, document("doc-1", Some("report.pdf"), MIB))
            .await;

        assert!(matches!(outcome, UploadOutcome::Stored { .. }));
        assert_eq!(app.transport.resolve_calls(), 2);
        assert!(app.faults.reports().is_empty());
    }

    #[tokio::test]
    async fn repeated_failure_is_reported_with_generic_reply() {
        let app = TestApp::spawn().await;
        app.transport.fail_next_resolves(5);

        let outcome = app
            .ingestor()
            .ingest(42, 42, document("doc-1", Some("report.pdf"), MIB))
            .await;

        assert_eq!(
            outcome,
            UploadOutcome::Failed {
                stage: UploadStage::Validated
            }
        );
        assert_eq!(app.transport.resolve_calls(), 2);

        let reports = app.faults.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, FaultOrigin::Ingestion);
        assert_eq!(reports[0].1, "resolve_reference");

        let reply = app.transport.last_message_to(42).unwrap();
        assert_eq!(reply, GENERIC_FAILURE);
        assert!(!reply.contains("timed out"));
        assert!(app.store.list_by_owner(42, 10).collect().await.unwrap().is_empty());
    }
}

mod detached_persistence {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dropping_the_caller_does_not_cancel_persistence() {
        let app = TestApp::spawn().await;
        app.ids.push("a1b2c3d4e5");
        app.transport.hold_replies();

        let ingestor = app.ingestor();
        let caller = tokio::spawn(async move {
            ingestor
                .ingest(42, 42, document("doc-1", Some("report.pdf"), MIB))
                .await
        });

        tokio::time::timeout(Duration::from_secs(5), app.transport.reply_waiting())
            .await
            .expect("acknowledgement never started");
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        app.transport.release_replies();

        let reply = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(reply) = app.transport.last_message_to(42) {
                    return reply;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("acknowledgement was cancelled with the caller");
        assert!(reply.contains("a1b2c3d4e5"));

        let stored = app
            .store
            .find_by_identifier(&Identifier::parse("a1b2c3d4e5").unwrap())
            .await
            .unwrap()
            .expect("record missing after the caller was dropped");
        assert_eq!(stored.display_name, "report.pdf");
        assert!(app.faults.reports().is_empty());
    }

    #[tokio::test]
    async fn panicking_upload_task_is_reported() {
        let app = TestApp::spawn().await;

        let outcome = app
            .ingestor_with_ids(Arc::new(PanickingIds))
            .ingest(42, 42, document("doc-1", Some("report.pdf"), MIB))
            .await;

        assert_eq!(
            outcome,
            UploadOutcome::Failed {
                stage: UploadStage::ReferenceResolved
            }
        );

        let reports = app.faults.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, FaultOrigin::Ingestion);
        assert_eq!(reports[0].1, "persist");
        assert!(reports[0].2.contains("did not finish"));
        assert_eq!(app.transport.last_message_to(42).unwrap(), GENERIC_FAILURE);
        assert!(app.store.list_by_owner(42, 10).collect().await.unwrap().is_empty());
    }
}
