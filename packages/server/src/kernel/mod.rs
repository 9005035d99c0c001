// Infrastructure kernel: collaborator traits, dependency container, and the
// Postgres + in-memory implementations.

pub mod deps;
pub mod pg_store;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use pg_store::{run_migrations, PgNotificationSink, PgStore};
pub use traits::{
    BaseCredentialVerifier, BaseNotificationSink, BaseObjectStore, BaseRecordStore,
    PetitionBundle, PetitionInsert,
};
