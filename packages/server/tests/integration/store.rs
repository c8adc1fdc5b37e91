use chrono::Duration as ChronoDuration;
use chrono::SubsecRound;
use common::Identifier;
use server::store::{DeleteOutcome, StoreError};

use crate::common::{MIB, TestApp, record};

mod insert_and_find {
    use super::*;

    #[tokio::test]
    async fn inserted_record_reads_back_unchanged() {
        let app = TestApp::spawn().await;
        let original = record("a1b2c3d4e5", 42, "report.pdf", MIB);

        app.store.insert_new(&original).await.unwrap();
        let found = app
            .store
            .find_by_identifier(&original.identifier)
            .await
            .unwrap()
            .expect("record should exist");

        assert_eq!(found, original);
    }

    #[tokio::test]
    async fn unknown_identifier_is_absent() {
        let app = TestApp::spawn().await;
        let id = Identifier::parse("zzzzzzzzzz").unwrap();

        assert!(app.store.find_by_identifier(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_identifier_is_a_collision() {
        let app = TestApp::spawn().await;
        app.seed_record("a1b2c3d4e5", 42, "first.pdf").await;

        let err = app
            .store
            .insert_new(&record("a1b2c3d4e5", 7, "second.pdf", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IdentifierCollision(ref id) if id.as_str() == "a1b2c3d4e5"));

        let kept = app
            .store
            .find_by_identifier(&Identifier::parse("a1b2c3d4e5").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.owner_id, 42);
        assert_eq!(kept.display_name, "first.pdf");
    }
}

mod upsert {
    use super::*;

    #[tokio::test]
    async fn replaces_everything_but_creation_time() {
        let app = TestApp::spawn().await;
        let first = app.seed_record("a1b2c3d4e5", 42, "draft.pdf").await;

        let mut replacement = record("a1b2c3d4e5", 42, "final.pdf", 2 * MIB);
        replacement.created_at = first.created_at + ChronoDuration::hours(1);
        app.store
            .upsert_by_identifier(&first.identifier, &replacement)
            .await
            .unwrap();

        let found = app
            .store
            .find_by_identifier(&first.identifier)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.display_name, "final.pdf");
        assert_eq!(found.size_bytes, 2 * MIB);
        assert_eq!(found.source_ref, "documents/final.pdf");
        assert_eq!(found.created_at, first.created_at);
    }

    #[tokio::test]
    async fn creates_missing_record() {
        let app = TestApp::spawn().await;
        let new = record("q9w8e7r6t5", 5, "new.mp4", 300);

        app.store
            .upsert_by_identifier(&new.identifier, &new)
            .await
            .unwrap();

        let found = app.store.find_by_identifier(&new.identifier).await.unwrap();
        assert_eq!(found, Some(new));
    }
}

mod listing {
    use super::*;

    async fn seed_history(app: &TestApp, owner_id: i64, count: usize) -> Vec<String> {
        let base = (chrono::Utc::now() - ChronoDuration::days(1)).trunc_subsecs(6);
        let mut ids = Vec::new();
        for i in 0..count {
            let id = format!("own{owner_id:02}f{i:04}");
            let mut r = record(&id, owner_id, &format!("file{i}.txt"), 100 + i as u64);
            r.created_at = base + ChronoDuration::minutes(i as i64);
            app.store.insert_new(&r).await.unwrap();
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn newest_first_and_capped_at_limit() {
        let app = TestApp::spawn().await;
        let ids = seed_history(&app, 42, 5).await;
        seed_history(&app, 7, 2).await;

        let listed = app.store.list_by_owner(42, 3).collect().await.unwrap();

        let listed_ids: Vec<&str> = listed.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(listed_ids, vec![&ids[4][..], &ids[3][..], &ids[2][..]]);
        assert!(listed.iter().all(|r| r.owner_id == 42));
    }

    #[tokio::test]
    async fn pages_lazily_and_restarts() {
        let app = TestApp::spawn().await;
        seed_history(&app, 42, 5).await;

        let mut listing = app.store.list_by_owner(42, 10).with_page_size(2);
        let mut sizes = Vec::new();
        while let Some(batch) = listing.next_batch().await.unwrap() {
            sizes.push(batch.len());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(listing.next_batch().await.unwrap().is_none());

        listing.restart();
        let again = listing.next_batch().await.unwrap().unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].display_name, "file4.txt");
    }

    #[tokio::test]
    async fn owner_without_files_lists_nothing() {
        let app = TestApp::spawn().await;

        let listed = app.store.list_by_owner(99, 10).collect().await.unwrap();
        assert!(listed.is_empty());
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn owner_can_delete() {
        let app = TestApp::spawn().await;
        let r = app.seed_record("a1b2c3d4e5", 42, "report.pdf").await;

        let outcome = app
            .store
            .delete_by_identifier_and_owner(&r.identifier, 42)
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(app.store.find_by_identifier(&r.identifier).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn foreign_owner_gets_not_found_and_record_survives() {
        let app = TestApp::spawn().await;
        let r = app.seed_record("a1b2c3d4e5", 42, "report.pdf").await;

        let outcome = app
            .store
            .delete_by_identifier_and_owner(&r.identifier, 7)
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::NotFound);
        assert_eq!(
            app.store.find_by_identifier(&r.identifier).await.unwrap(),
            Some(r)
        );
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let app = TestApp::spawn().await;
        let id = Identifier::parse("0000000000").unwrap();

        let outcome = app.store.delete_by_identifier_and_owner(&id, 42).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);
    }
}
