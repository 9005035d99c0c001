//! Test harness wiring the workflow against in-memory collaborators.
//!
//! Every test gets a fresh world: an empty record store, an empty object
//! store, a call-capturing notification sink, and a credential verifier that
//! accepts [`fixtures::VALID_CREDENTIAL`].

use std::sync::Arc;
use std::time::Duration;

use test_context::AsyncTestContext;

use registrar_core::kernel::test_dependencies::{
    MemoryRecordStore, MockCredentialVerifier, MockNotificationSink, MockObjectStore,
};
use registrar_core::kernel::ServerDeps;

use super::fixtures::VALID_CREDENTIAL;

/// Test harness holding both the trait-object deps and the concrete doubles
/// (for seeding and assertions; the handles share state with the deps).
pub struct TestHarness {
    pub deps: ServerDeps,
    pub store: MemoryRecordStore,
    pub objects: MockObjectStore,
    pub notifier: MockNotificationSink,
}

impl TestHarness {
    pub fn new() -> Self {
        // Respect RUST_LOG when running tests with --nocapture.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = MemoryRecordStore::new();
        let objects = MockObjectStore::new();
        let notifier = MockNotificationSink::new();
        let verifier = MockCredentialVerifier::accepting(VALID_CREDENTIAL);

        let deps = ServerDeps::new(
            Arc::new(store.clone()),
            Arc::new(objects.clone()),
            Arc::new(notifier.clone()),
            Arc::new(verifier),
            Duration::from_millis(200),
        );

        Self {
            deps,
            store,
            objects,
            notifier,
        }
    }
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }
}
