//! Creation saga scenarios against a real artifact store

use stencil_artifacts::StoreError;
use stencil_artworks::{ArtworkPersistence, CreationState};
use stencil_common::Error;
use stencil_render::mock::SAMPLE_WEBP;

use crate::common::TestApp;

fn split(path: &str) -> (&str, &str) {
    path.split_once('/').expect("composite path")
}

mod test_create {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_three_sub_prompts_make_three_stored_stencils() {
        let app = TestApp::new().unwrap();

        let (state, result) = app
            .orchestrator
            .create_traced("Lighthouse", "a lighthouse in a storm")
            .await;
        let artwork = result.unwrap();

        assert_eq!(state, CreationState::Committed);
        assert_eq!(artwork.stencils.len(), 3);
        for stencil in &artwork.stencils {
            assert!(!stencil.images.is_empty());
            for image in &stencil.images {
                let (bucket, name) = split(&image.path);
                assert_eq!(bucket, "stencil");
                assert!(name.ends_with(".webp"));

                let bytes = app.store.read_artifact(bucket, name).await.unwrap();
                assert_eq!(bytes, SAMPLE_WEBP);
            }
        }

        let stored = app.repo.find(artwork.id).await.unwrap().unwrap();
        assert_eq!(stored, artwork);
        assert_eq!(app.bucket_file_count(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_sub_prompts_are_generated_concurrently_and_all_recorded() {
        let app = TestApp::new().unwrap();
        app.generator.behavior().set_delay_ms(200);

        let started = std::time::Instant::now();
        app.orchestrator
            .create("Lighthouse", "a lighthouse in a storm")
            .await
            .unwrap();
        let elapsed = started.elapsed();

        // Three sequential calls would take at least 600ms
        assert!(
            elapsed < std::time::Duration::from_millis(600),
            "generation took {:?}",
            elapsed
        );

        let mut prompts = app.generator.recorded_prompts();
        prompts.sort();
        assert_eq!(
            prompts,
            vec![
                "figure 1 - standing still",
                "figure 2 - standing still",
                "figure 3 - standing still",
            ]
        );
        assert_eq!(app.fetcher.recorded_urls().len(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_staging_area_is_empty_after_success() {
        let app = TestApp::new().unwrap();
        app.orchestrator.create("Dunes", "sand dunes").await.unwrap();

        let staged = std::fs::read_dir(app.root.path().join("temp")).unwrap().count();
        assert_eq!(staged, 0);

        let first = app.store.garbage_collect().await.unwrap();
        let second = app.store.garbage_collect().await.unwrap();
        assert_eq!(first.deleted, 0);
        assert_eq!(second.deleted, 0);
        assert_eq!(app.bucket_file_count(), 3);
    }
}

mod test_rollback {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_failed_insert_makes_every_image_unreachable() {
        let app = TestApp::new().unwrap();
        app.generator.behavior().set_images_per_prompt(2);
        app.repo.set_fail_inserts(true);

        let (state, result) = app
            .orchestrator
            .create_traced("Lighthouse", "a lighthouse in a storm")
            .await;

        assert_eq!(state, CreationState::RolledBack);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(err.to_string(), Error::internal().to_string());

        let saved = app.storage.saved();
        assert_eq!(saved.len(), 6);
        assert_eq!(app.storage.delete_calls(), 6);
        for path in &saved {
            let (bucket, name) = split(path);
            let err = app.store.fetch_artifact(bucket, name).await.unwrap_err();
            assert!(matches!(err, StoreError::NotFound(_)), "{} still reachable", path);
        }
        assert_eq!(app.bucket_file_count(), 0);
        assert!(app.repo.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_one_failed_compensation_does_not_block_the_rest() {
        let app = TestApp::new().unwrap();
        app.repo.set_fail_inserts(true);
        app.storage.fail_first_delete();

        let (state, result) = app
            .orchestrator
            .create_traced("Lighthouse", "a lighthouse in a storm")
            .await;

        assert_eq!(state, CreationState::RolledBack);
        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(app.storage.saved().len(), 3);
        assert_eq!(app.storage.delete_calls(), 3);

        let failed = app.storage.failed_deletes();
        assert_eq!(failed.len(), 1);
        assert_eq!(app.bucket_file_count(), 1);

        for path in app.storage.saved() {
            let (bucket, name) = split(&path);
            let fetched = app.store.fetch_artifact(bucket, name).await;
            assert_eq!(fetched.is_ok(), failed.contains(&path), "{}", path);
        }
    }
}

mod test_failure {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_decomposition_failure_stores_nothing() {
        let app = TestApp::new().unwrap();
        app.llm.set_fallback(stencil_llm::mock::MockReply::Fail(
            "model overloaded".to_string(),
        ));

        let (state, result) = app
            .orchestrator
            .create_traced("Lighthouse", "a lighthouse in a storm")
            .await;

        assert_eq!(state, CreationState::Failed);
        assert!(matches!(result, Err(Error::Internal(_))));
        assert!(app.generator.recorded_prompts().is_empty());
        assert_eq!(app.bucket_file_count(), 0);
        assert_eq!(app.repo.insert_attempts(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_wrong_sub_prompt_count_is_failed() {
        let app = TestApp::new().unwrap();
        app.llm.set_fallback(stencil_llm::mock::MockReply::Text(
            r#"{"prompts":[{"subject":"gull","action":"gliding"}]}"#.to_string(),
        ));

        let (state, _) = app.orchestrator.create_traced("Sea", "the sea").await;

        assert_eq!(state, CreationState::Failed);
        assert!(app.generator.recorded_prompts().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_generation_failure_keeps_sibling_images_and_skips_persistence() {
        let app = TestApp::new().unwrap();
        app.generator
            .behavior()
            .fail_prompt("figure 1 - standing still");

        let (state, result) = app
            .orchestrator
            .create_traced("Lighthouse", "a lighthouse in a storm")
            .await;

        assert_eq!(state, CreationState::Failed);
        assert!(matches!(result, Err(Error::Internal(_))));
        // Every sibling ran to completion; nothing was compensated
        assert_eq!(app.generator.recorded_prompts().len(), 3);
        assert_eq!(app.storage.saved().len(), 2);
        assert_eq!(app.storage.delete_calls(), 0);
        assert_eq!(app.bucket_file_count(), 2);
        assert_eq!(app.repo.insert_attempts(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_download_with_unknown_signature_is_rejected_by_store() {
        let app = TestApp::new().unwrap();
        app.fetcher.set_bytes(b"GIF89a\x01\x00\x01\x00\x00\x00".to_vec());

        let (state, _) = app
            .orchestrator
            .create_traced("Lighthouse", "a lighthouse in a storm")
            .await;

        assert_eq!(state, CreationState::Failed);
        assert!(app.storage.saved().is_empty());
        assert_eq!(app.bucket_file_count(), 0);
        let staged = std::fs::read_dir(app.root.path().join("temp")).unwrap().count();
        assert_eq!(staged, 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_download_is_failed() {
        let app = TestApp::new().unwrap();
        app.fetcher
            .fail_url("mock://stencil/figure-2-standing-still/0.webp");

        let (state, _) = app
            .orchestrator
            .create_traced("Lighthouse", "a lighthouse in a storm")
            .await;

        assert_eq!(state, CreationState::Failed);
        assert_eq!(app.fetcher.recorded_urls().len(), 3);
        assert_eq!(app.storage.saved().len(), 2);
    }
}

mod test_delete {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_delete_removes_record_then_images() {
        let app = TestApp::new().unwrap();
        let artwork = app
            .orchestrator
            .create("Lighthouse", "a lighthouse in a storm")
            .await
            .unwrap();

        app.orchestrator.delete(artwork.id).await.unwrap();

        assert!(app.repo.find(artwork.id).await.unwrap().is_none());
        assert_eq!(app.storage.delete_calls(), 3);
        assert_eq!(app.bucket_file_count(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_record_delete_leaves_images_intact() {
        let app = TestApp::new().unwrap();
        let artwork = app
            .orchestrator
            .create("Lighthouse", "a lighthouse in a storm")
            .await
            .unwrap();
        app.repo.set_fail_deletes(true);

        let err = app.orchestrator.delete(artwork.id).await.unwrap_err();

        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(app.storage.delete_calls(), 0);
        for path in artwork.image_paths() {
            let (bucket, name) = split(&path);
            assert!(app.store.read_artifact(bucket, name).await.is_ok());
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_with_failing_artifact_still_succeeds() {
        let app = TestApp::new().unwrap();
        let artwork = app
            .orchestrator
            .create("Lighthouse", "a lighthouse in a storm")
            .await
            .unwrap();
        app.storage.fail_first_delete();

        app.orchestrator.delete(artwork.id).await.unwrap();

        assert_eq!(app.storage.delete_calls(), 3);
        assert_eq!(app.bucket_file_count(), 1);
    }
}
