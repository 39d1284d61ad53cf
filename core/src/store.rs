//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Engines never see it — the host moves SaveSnapshots and events
//! between the session and this store.

use rusqlite::{params, Connection, OptionalExtension};
use crate::{
    error::{PetError, PetResult},
    event::EventLogEntry,
    types::EpochMillis,
};

pub struct PetStore {
    conn: Connection,
}

impl PetStore {
    /// Open (or create) the save database at `path`.
    pub fn open(path: &str) -> PetResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PetResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PetResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    /// Register a session. Re-registering an existing id is a no-op.
    pub fn insert_session(
        &self,
        session_id: &str,
        seed: u64,
        version: &str,
        started_at: EpochMillis,
    ) -> PetResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO session (session_id, seed, version, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            // SQLite integers are signed; the seed round-trips bit-for-bit.
            params![session_id, seed as i64, version, started_at],
        )?;
        Ok(())
    }

    pub fn session_seed(&self, session_id: &str) -> PetResult<u64> {
        self.conn
            .query_row(
                "SELECT seed FROM session WHERE session_id = ?1",
                params![session_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|seed| seed as u64)
            .ok_or_else(|| PetError::SessionNotFound { session_id: session_id.to_string() })
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> PetResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, at_ms, subsystem, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.session_id,
                entry.at_ms,
                entry.subsystem,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_of_type(&self, session_id: &str, event_type: &str) -> PetResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, at_ms, subsystem, event_type, payload
             FROM event_log WHERE session_id = ?1 AND event_type = ?2
             ORDER BY id ASC"
        )?;
        let entries = stmt.query_map(params![session_id, event_type], |row| {
            Ok(EventLogEntry {
                id:         Some(row.get(0)?),
                session_id: row.get(1)?,
                at_ms:      row.get(2)?,
                subsystem:  row.get(3)?,
                event_type: row.get(4)?,
                payload:    row.get(5)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Save slot ──────────────────────────────────────────────

    pub fn write_save(&self, session_id: &str, saved_at: EpochMillis, state_json: &str) -> PetResult<()> {
        self.conn.execute(
            "INSERT INTO save_slot (session_id, saved_at_ms, state_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET
                 saved_at_ms = excluded.saved_at_ms,
                 state_json  = excluded.state_json",
            params![session_id, saved_at, state_json],
        )?;
        log::debug!("store: save written for {session_id} at {saved_at}");
        Ok(())
    }

    pub fn read_save(&self, session_id: &str) -> PetResult<Option<String>> {
        let json = self.conn
            .query_row(
                "SELECT state_json FROM save_slot WHERE session_id = ?1",
                params![session_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(json)
    }
}
