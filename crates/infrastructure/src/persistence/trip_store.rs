//! Trip snapshot stores
//!
//! One serialized snapshot under a fixed namespace key. The SQLite store
//! keeps the schema version in its own column so unreadable snapshots can
//! be discarded without deserializing the payload; the in-memory store
//! backs tests and ephemeral runs.

use std::path::Path;

use application::error::ApplicationError;
use application::ports::TripStorePort;
use async_trait::async_trait;
use domain::entities::TripSnapshot;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, instrument, warn};

/// Fixed namespace key for the single tracked trip
pub const TRIP_NAMESPACE: &str = "waypulse.trip";

/// SQLite-backed snapshot store
#[derive(Debug)]
pub struct SqliteTripStore {
    conn: Mutex<Connection>,
}

impl SqliteTripStore {
    /// Open (and initialize) the store at `path`
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the database cannot be opened or
    /// the schema cannot be created.
    pub fn open(path: &Path) -> Result<Self, ApplicationError> {
        let conn = Connection::open(path)
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;
        Self::init(conn)
    }

    /// Open an in-process, in-memory database (useful in tests)
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the database cannot be opened.
    pub fn open_in_memory() -> Result<Self, ApplicationError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, ApplicationError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trip_snapshot (
                namespace      TEXT PRIMARY KEY,
                schema_version INTEGER NOT NULL,
                payload        TEXT NOT NULL,
                saved_at       TEXT NOT NULL
            );",
        )
        .map_err(|e| ApplicationError::Persistence(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl TripStorePort for SqliteTripStore {
    #[instrument(skip(self, snapshot))]
    async fn save(&self, snapshot: &TripSnapshot) -> Result<(), ApplicationError> {
        let payload = serde_json::to_string(snapshot)
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO trip_snapshot (namespace, schema_version, payload, saved_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                TRIP_NAMESPACE,
                snapshot.schema_version,
                payload,
                snapshot.saved_at.to_rfc3339(),
            ],
        )
        .map_err(|e| ApplicationError::Persistence(e.to_string()))?;
        debug!("Trip snapshot saved");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load(&self) -> Result<Option<TripSnapshot>, ApplicationError> {
        let conn = self.conn.lock();
        let row: Option<(u32, String)> = conn
            .query_row(
                "SELECT schema_version, payload FROM trip_snapshot WHERE namespace = ?1",
                params![TRIP_NAMESPACE],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;

        let Some((schema_version, payload)) = row else {
            return Ok(None);
        };

        match serde_json::from_str::<TripSnapshot>(&payload) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(
                    schema_version,
                    error = %err,
                    "Discarding unreadable trip snapshot"
                );
                conn.execute(
                    "DELETE FROM trip_snapshot WHERE namespace = ?1",
                    params![TRIP_NAMESPACE],
                )
                .map_err(|e| ApplicationError::Persistence(e.to_string()))?;
                Ok(None)
            },
        }
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), ApplicationError> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM trip_snapshot WHERE namespace = ?1",
            params![TRIP_NAMESPACE],
        )
        .map_err(|e| ApplicationError::Persistence(e.to_string()))?;
        debug!("Trip snapshot cleared");
        Ok(())
    }
}

/// In-memory snapshot store for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct InMemoryTripStore {
    snapshot: Mutex<Option<TripSnapshot>>,
}

impl InMemoryTripStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TripStorePort for InMemoryTripStore {
    async fn save(&self, snapshot: &TripSnapshot) -> Result<(), ApplicationError> {
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<TripSnapshot>, ApplicationError> {
        Ok(self.snapshot.lock().clone())
    }

    async fn clear(&self) -> Result<(), ApplicationError> {
        *self.snapshot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::entities::Trip;
    use domain::value_objects::{GeoLocation, GeocodedPlace, GeocodingSource, RouteEstimate};

    fn sample_snapshot() -> TripSnapshot {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid ts");
        let trip = Trip::new(
            GeoLocation::new_unchecked(52.0, 5.0),
            GeocodedPlace::new(
                GeoLocation::new_unchecked(52.5, 5.0),
                "Destination",
                GeocodingSource::Nominatim,
            ),
            RouteEstimate::routed(55.6, 42.0, None, now),
            now,
        );
        TripSnapshot::new(trip, now)
    }

    #[tokio::test]
    async fn sqlite_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteTripStore::open(&dir.path().join("trip.db")).expect("open");

        assert!(store.load().await.expect("load").is_none());

        let snapshot = sample_snapshot();
        store.save(&snapshot).await.expect("save");
        let loaded = store.load().await.expect("load").expect("snapshot present");
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn sqlite_save_replaces_previous() {
        let store = SqliteTripStore::open_in_memory().expect("open");

        let first = sample_snapshot();
        store.save(&first).await.expect("save");

        let mut second = sample_snapshot();
        second.trip.distance_traveled_km = 12.0;
        store.save(&second).await.expect("save");

        let loaded = store.load().await.expect("load").expect("snapshot present");
        assert!((loaded.trip.distance_traveled_km - 12.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn sqlite_clear_removes_snapshot() {
        let store = SqliteTripStore::open_in_memory().expect("open");
        store.save(&sample_snapshot()).await.expect("save");
        store.clear().await.expect("clear");
        assert!(store.load().await.expect("load").is_none());
        // Clearing twice is fine
        store.clear().await.expect("clear again");
    }

    #[tokio::test]
    async fn sqlite_discards_unreadable_payload() {
        let store = SqliteTripStore::open_in_memory().expect("open");
        {
            let conn = store.conn.lock();
            conn.execute(
                "INSERT INTO trip_snapshot (namespace, schema_version, payload, saved_at)
                 VALUES (?1, 999, '{not a snapshot', '2026-01-01T00:00:00Z')",
                params![TRIP_NAMESPACE],
            )
            .expect("insert");
        }

        assert!(store.load().await.expect("load").is_none());
        // The bad row is gone afterwards
        let conn = store.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM trip_snapshot", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn sqlite_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("trip.db");
        {
            let store = SqliteTripStore::open(&path).expect("open");
            store.save(&sample_snapshot()).await.expect("save");
        }
        let store = SqliteTripStore::open(&path).expect("reopen");
        assert!(store.load().await.expect("load").is_some());
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = InMemoryTripStore::new();
        assert!(store.load().await.expect("load").is_none());
        store.save(&sample_snapshot()).await.expect("save");
        assert!(store.load().await.expect("load").is_some());
        store.clear().await.expect("clear");
        assert!(store.load().await.expect("load").is_none());
    }
}
