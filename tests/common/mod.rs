//! Integration test common infrastructure.
//!
//! Builds an engine over a SQLite database (in-memory by default) with a recording
//! adapter double, a mutation-counting store wrapper and a manual clock.

pub mod adapter;
pub mod store;

#[allow(unused_imports)]
pub use adapter::RecordingAdapter;
#[allow(unused_imports)]
pub use store::CountingStore;

use restrictd::db::Database;
use restrictd::restriction::{Engine, ManualClock, Timestamp};
use std::sync::Arc;
use std::time::Duration;

/// Fixed starting time for deterministic expiry boundaries.
pub const NOW: Timestamp = 1_700_000_000;

pub struct Harness {
    pub engine: Arc<Engine>,
    pub store: Arc<CountingStore>,
    pub adapter: Arc<RecordingAdapter>,
    pub clock: Arc<ManualClock>,
    #[allow(dead_code)]
    pub db: Database,
}

impl Harness {
    pub async fn new() -> Self {
        let db = Database::new(":memory:")
            .await
            .expect("in-memory database");
        Self::with_database(db)
    }

    /// Harness over a SQLite file with the full multi-connection pool.
    #[allow(dead_code)]
    pub async fn on_disk() -> (Self, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("restrictd.db");
        let db = Database::new(path.to_str().expect("utf-8 path"))
            .await
            .expect("file database");
        (Self::with_database(db), dir)
    }

    fn with_database(db: Database) -> Self {
        let store = Arc::new(CountingStore::new(Arc::new(db.clone())));
        let adapter = Arc::new(RecordingAdapter::default());
        let clock = Arc::new(ManualClock::new(NOW));

        let engine = Arc::new(
            Engine::new(store.clone(), adapter.clone(), clock.clone())
                .with_adapter_timeout(Duration::from_secs(2)),
        );

        Self {
            engine,
            store,
            adapter,
            clock,
            db,
        }
    }
}
