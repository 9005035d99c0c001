//! Server dependencies for workflow code (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! actions and effects. All external collaborators sit behind trait
//! abstractions so tests can inject in-memory doubles.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::Config;
use crate::kernel::pg_store::{PgNotificationSink, PgStore};
use crate::kernel::{
    BaseCredentialVerifier, BaseNotificationSink, BaseObjectStore, BaseRecordStore,
};

/// Dependencies accessible to workflow actions and effects.
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseRecordStore>,
    pub object_store: Arc<dyn BaseObjectStore>,
    pub notifier: Arc<dyn BaseNotificationSink>,
    pub credential_verifier: Arc<dyn BaseCredentialVerifier>,
    /// Per-call timeout for object store operations.
    pub object_op_timeout: Duration,
}

impl ServerDeps {
    /// Create new ServerDeps with the given collaborators
    pub fn new(
        store: Arc<dyn BaseRecordStore>,
        object_store: Arc<dyn BaseObjectStore>,
        notifier: Arc<dyn BaseNotificationSink>,
        credential_verifier: Arc<dyn BaseCredentialVerifier>,
        object_op_timeout: Duration,
    ) -> Self {
        Self {
            store,
            object_store,
            notifier,
            credential_verifier,
            object_op_timeout,
        }
    }

    /// Production wiring: Postgres-backed record store and notification sink.
    ///
    /// The object store and credential verifier are environment-specific
    /// (bucket client, identity provider), so the caller supplies them.
    pub fn postgres(
        pool: PgPool,
        config: &Config,
        object_store: Arc<dyn BaseObjectStore>,
        credential_verifier: Arc<dyn BaseCredentialVerifier>,
    ) -> Self {
        Self {
            store: Arc::new(PgStore::new(pool.clone())),
            notifier: Arc::new(PgNotificationSink::new(pool)),
            object_store,
            credential_verifier,
            object_op_timeout: Duration::from_millis(config.object_op_timeout_ms),
        }
    }
}
