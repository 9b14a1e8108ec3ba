//! Common test utilities and fixtures for integration tests
//!
//! This module provides shared infrastructure for all integration tests:
//! - An artifact store rooted in a fresh temp directory
//! - Mock decomposition and render collaborators
//! - The in-memory artwork repository
//! - A storage wrapper that records and can fail delete calls
//! - Request/response helpers for driving the router

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;

use stencil_artifacts::{
    ArtifactPath, ArtifactStorage, ArtifactStore, ArtifactsState, StoreConfig, StoreError,
};
use stencil_artworks::{
    ArtworksState, CreationConfig, CreationOrchestrator, InMemoryArtworkRepository,
};
use stencil_llm::mock::MockLlmService;
use stencil_llm::LlmPromptDecomposer;
use stencil_render::mock::{MockImageFetcher, MockStencilGenerator};

/// Passes through to the real store, recording every call
pub struct CountingStorage {
    inner: Arc<ArtifactStore>,
    saved: Mutex<Vec<String>>,
    delete_calls: AtomicUsize,
    fail_first_delete: AtomicBool,
    failing_deletes: Mutex<HashSet<String>>,
}

impl CountingStorage {
    pub fn new(inner: Arc<ArtifactStore>) -> Self {
        Self {
            inner,
            saved: Mutex::new(Vec::new()),
            delete_calls: AtomicUsize::new(0),
            fail_first_delete: AtomicBool::new(false),
            failing_deletes: Mutex::new(HashSet::new()),
        }
    }

    /// Paths saved so far, in completion order
    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// The next delete call fails without touching disk
    pub fn fail_first_delete(&self) {
        self.fail_first_delete.store(true, Ordering::SeqCst);
    }

    /// Names of deletes that failed
    pub fn failed_deletes(&self) -> HashSet<String> {
        self.failing_deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStorage for CountingStorage {
    async fn save(
        &self,
        bytes: &[u8],
        bucket: &str,
        file_name: &str,
    ) -> std::result::Result<ArtifactPath, StoreError> {
        let path = self.inner.save_artifact(bytes, bucket, file_name).await?;
        self.saved.lock().unwrap().push(path.to_string());
        Ok(path)
    }

    async fn delete(&self, composite_path: &str) -> std::result::Result<(), StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_first_delete.swap(false, Ordering::SeqCst) {
            self.failing_deletes
                .lock()
                .unwrap()
                .insert(composite_path.to_string());
            return Err(StoreError::DeleteFailure {
                path: composite_path.to_string(),
                source: std::io::Error::other("injected delete failure"),
            });
        }

        self.inner.delete_artifact(composite_path).await
    }
}

/// Test application: every collaborator is in-process and inspectable
pub struct TestApp {
    pub root: TempDir,
    pub store: Arc<ArtifactStore>,
    pub storage: Arc<CountingStorage>,
    pub llm: Arc<MockLlmService>,
    pub generator: Arc<MockStencilGenerator>,
    pub fetcher: Arc<MockImageFetcher>,
    pub repo: Arc<InMemoryArtworkRepository>,
    pub orchestrator: Arc<CreationOrchestrator>,
}

impl TestApp {
    /// Fresh store root, one image per sub-prompt, three sub-prompts
    pub fn new() -> Result<Self> {
        Self::with_config(CreationConfig::default())
    }

    pub fn with_config(config: CreationConfig) -> Result<Self> {
        let root = TempDir::new()?;
        let store = Arc::new(ArtifactStore::initialize(&StoreConfig::new(root.path()))?);
        let storage = Arc::new(CountingStorage::new(store.clone()));

        let llm = Arc::new(MockLlmService::new());
        let generator = Arc::new(MockStencilGenerator::new(1));
        let fetcher = Arc::new(MockImageFetcher::new(&config.expected_content_type));
        let repo = Arc::new(InMemoryArtworkRepository::new());

        let orchestrator = Arc::new(CreationOrchestrator::new(
            Arc::new(LlmPromptDecomposer::new(llm.clone())),
            generator.clone(),
            fetcher.clone(),
            storage.clone(),
            repo.clone(),
            config,
        ));

        Ok(Self {
            root,
            store,
            storage,
            llm,
            generator,
            fetcher,
            repo,
            orchestrator,
        })
    }

    /// Router wired exactly like the application, minus background tasks
    pub fn test_router(&self) -> Router {
        stencil_app::router(
            ArtifactsState::new(self.store.clone()),
            ArtworksState::new(self.orchestrator.clone(), self.repo.clone()),
        )
    }

    pub fn bucket_dir(&self) -> PathBuf {
        self.root.path().join("stencil")
    }

    /// Number of files currently in the stencil bucket
    pub fn bucket_file_count(&self) -> usize {
        std::fs::read_dir(self.bucket_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Helper: build a request, JSON-encoding `body` when present
pub fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(b) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    }
}

/// Helper: parse response body as JSON Value
pub async fn parse_body(response: axum::http::Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Helper: raw response bytes
pub async fn body_bytes(response: axum::http::Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
