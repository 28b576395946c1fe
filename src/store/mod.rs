use crate::error::StoreError;
use crate::profile::{DimensionScore, Profile};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, types::Type, Connection, Error as SqlError, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

// ── Ledger types ──────────────────────────────────────────────────

/// The three side-effecting actions the bot can take on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Like,
    Reply,
    Repost,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Reply => "reply",
            InteractionKind::Repost => "repost",
        }
    }

    fn from_str(value: &str, column_index: usize) -> rusqlite::Result<Self> {
        match value {
            "like" => Ok(InteractionKind::Like),
            "reply" => Ok(InteractionKind::Reply),
            "repost" => Ok(InteractionKind::Repost),
            _ => Err(SqlError::FromSqlConversionFailure(
                column_index,
                Type::Text,
                format!("unknown interaction kind: {value}").into(),
            )),
        }
    }
}

/// One attempted action, as recorded in the append-only interaction log.
#[derive(Debug, Clone)]
pub struct InteractionRecord {
    pub id: String,
    pub post_id: String,
    pub kind: InteractionKind,
    pub timestamp: DateTime<Utc>,
    pub reasoning: String,
    pub response_text: Option<String>,
    pub success: bool,
}

/// Source class of a corpus row gathered for personality analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusKind {
    Post,
    Like,
}

impl CorpusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CorpusKind::Post => "post",
            CorpusKind::Like => "like",
        }
    }
}

/// Raw material for personality analysis: one of the account's own posts or
/// liked posts.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub post_id: String,
    pub content: String,
    pub kind: CorpusKind,
    pub timestamp: DateTime<Utc>,
    pub metadata: Value,
}

// ── Store contract ────────────────────────────────────────────────

/// Persistence contract: personality profile, processed markers, interaction
/// ledger, and the analysis corpus. Single writer; one SQLite database.
pub trait EngagementStore: Send + Sync {
    /// Replace-all semantics: the stored profile is deleted and rewritten.
    fn save_profile(&self, profile: &Profile) -> Result<()>;
    fn load_profile(&self) -> Result<Option<Profile>>;

    fn is_processed(&self, post_id: &str) -> Result<bool>;
    fn mark_processed(&self, post_id: &str) -> Result<()>;

    fn log_interaction(
        &self,
        kind: InteractionKind,
        post_id: &str,
        reasoning: &str,
        response_text: Option<&str>,
        success: bool,
    ) -> Result<()>;

    /// Count of attempted actions of `kind` within the trailing window.
    /// This is the rate-limit counting source.
    fn count_recent(&self, kind: InteractionKind, within: Duration) -> Result<u32>;

    fn recent_interactions(&self, within: Duration) -> Result<Vec<InteractionRecord>>;

    fn save_corpus(&self, entries: &[CorpusEntry]) -> Result<()>;
    fn corpus_texts(&self, kind: CorpusKind, limit: u32) -> Result<Vec<String>>;

    /// Storage hygiene: prune processed markers, log rows, and cached
    /// analysis older than the cutoff. Stale IDs cannot recur from a live
    /// feed, so this never reopens dedup.
    fn cleanup_older_than(&self, days: u32) -> Result<()>;
}

// ── SQLite implementation ─────────────────────────────────────────

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;

             CREATE TABLE IF NOT EXISTS personality_profile (
                 dimension  TEXT PRIMARY KEY,
                 score      REAL NOT NULL,
                 confidence REAL NOT NULL,
                 updated_at TEXT NOT NULL
             );

             CREATE TABLE IF NOT EXISTS processed_posts (
                 post_id      TEXT PRIMARY KEY,
                 processed_at TEXT NOT NULL
             );

             CREATE TABLE IF NOT EXISTS interaction_log (
                 id            TEXT PRIMARY KEY,
                 post_id       TEXT NOT NULL,
                 kind          TEXT NOT NULL,
                 timestamp     TEXT NOT NULL,
                 reasoning     TEXT NOT NULL,
                 response_text TEXT,
                 success       INTEGER NOT NULL DEFAULT 1
             );
             CREATE INDEX IF NOT EXISTS idx_interaction_log_kind_time
                 ON interaction_log(kind, timestamp);

             CREATE TABLE IF NOT EXISTS corpus (
                 id        TEXT PRIMARY KEY,
                 post_id   TEXT UNIQUE NOT NULL,
                 content   TEXT NOT NULL,
                 kind      TEXT NOT NULL,
                 timestamp TEXT NOT NULL,
                 metadata  TEXT
             );

             -- Optional per-post analysis cache; unused by current logic.
             CREATE TABLE IF NOT EXISTS content_analysis (
                 post_id         TEXT PRIMARY KEY,
                 relevance_score REAL,
                 quality_score   REAL,
                 sentiment_score REAL,
                 topics          TEXT,
                 analysis_data   TEXT,
                 created_at      TEXT NOT NULL
             );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|error| anyhow::Error::new(StoreError::Lock(error.to_string())))
    }

    fn map_interaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InteractionRecord> {
        let kind_raw: String = row.get(2)?;
        let timestamp_raw: String = row.get(3)?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_raw)
            .map_err(|error| SqlError::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?
            .with_timezone(&Utc);

        Ok(InteractionRecord {
            id: row.get(0)?,
            post_id: row.get(1)?,
            kind: InteractionKind::from_str(&kind_raw, 2)?,
            timestamp,
            reasoning: row.get(4)?,
            response_text: row.get(5)?,
            success: row.get::<_, i64>(6)? != 0,
        })
    }
}

impl EngagementStore for SqliteStore {
    fn save_profile(&self, profile: &Profile) -> Result<()> {
        let mut conn = self.lock_connection()?;
        let timestamp = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM personality_profile", [])?;
        for (dimension, value) in profile.dimensions() {
            tx.execute(
                "INSERT INTO personality_profile (dimension, score, confidence, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![dimension, value.score, value.confidence, timestamp],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_profile(&self) -> Result<Option<Profile>> {
        let conn = self.lock_connection()?;
        let mut stmt =
            conn.prepare("SELECT dimension, score, confidence FROM personality_profile")?;

        let mut profile = Profile::default();
        let mut row_count = 0usize;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;
        for row in rows {
            let (dimension, score, confidence) = row?;
            profile.set_dimension(&dimension, DimensionScore::new(score, confidence));
            row_count += 1;
        }

        if row_count == 0 {
            Ok(None)
        } else {
            Ok(Some(profile))
        }
    }

    fn is_processed(&self, post_id: &str) -> Result<bool> {
        let conn = self.lock_connection()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM processed_posts WHERE post_id = ?1",
                params![post_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn mark_processed(&self, post_id: &str) -> Result<()> {
        let conn = self.lock_connection()?;
        conn.execute(
            "INSERT OR IGNORE INTO processed_posts (post_id, processed_at) VALUES (?1, ?2)",
            params![post_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn log_interaction(
        &self,
        kind: InteractionKind,
        post_id: &str,
        reasoning: &str,
        response_text: Option<&str>,
        success: bool,
    ) -> Result<()> {
        let conn = self.lock_connection()?;
        conn.execute(
            "INSERT INTO interaction_log (id, post_id, kind, timestamp, reasoning, response_text, success)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                Uuid::new_v4().to_string(),
                post_id,
                kind.as_str(),
                Utc::now().to_rfc3339(),
                reasoning,
                response_text,
                i64::from(success)
            ],
        )?;
        Ok(())
    }

    fn count_recent(&self, kind: InteractionKind, within: Duration) -> Result<u32> {
        let conn = self.lock_connection()?;
        let since = (Utc::now() - within).to_rfc3339();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM interaction_log WHERE kind = ?1 AND timestamp > ?2",
            params![kind.as_str(), since],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(count)?)
    }

    fn recent_interactions(&self, within: Duration) -> Result<Vec<InteractionRecord>> {
        let conn = self.lock_connection()?;
        let since = (Utc::now() - within).to_rfc3339();
        let mut stmt = conn.prepare(
            "SELECT id, post_id, kind, timestamp, reasoning, response_text, success
             FROM interaction_log
             WHERE timestamp > ?1
             ORDER BY timestamp DESC",
        )?;

        let mut records = Vec::new();
        let rows = stmt.query_map(params![since], Self::map_interaction_row)?;
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn save_corpus(&self, entries: &[CorpusEntry]) -> Result<()> {
        let mut conn = self.lock_connection()?;
        let tx = conn.transaction()?;
        for entry in entries {
            tx.execute(
                "INSERT OR REPLACE INTO corpus (id, post_id, content, kind, timestamp, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    entry.post_id,
                    entry.content,
                    entry.kind.as_str(),
                    entry.timestamp.to_rfc3339(),
                    entry.metadata.to_string()
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn corpus_texts(&self, kind: CorpusKind, limit: u32) -> Result<Vec<String>> {
        let conn = self.lock_connection()?;
        let mut stmt = conn.prepare(
            "SELECT content FROM corpus
             WHERE kind = ?1
             ORDER BY timestamp DESC
             LIMIT ?2",
        )?;

        let mut texts = Vec::new();
        let rows = stmt.query_map(params![kind.as_str(), i64::from(limit)], |row| {
            row.get::<_, String>(0)
        })?;
        for row in rows {
            texts.push(row?);
        }
        Ok(texts)
    }

    fn cleanup_older_than(&self, days: u32) -> Result<()> {
        let conn = self.lock_connection()?;
        let cutoff = (Utc::now() - Duration::days(i64::from(days))).to_rfc3339();

        conn.execute(
            "DELETE FROM processed_posts WHERE processed_at < ?1",
            params![cutoff],
        )?;
        conn.execute(
            "DELETE FROM interaction_log WHERE timestamp < ?1",
            params![cutoff],
        )?;
        conn.execute(
            "DELETE FROM content_analysis WHERE created_at < ?1",
            params![cutoff],
        )?;

        tracing::debug!(days, "pruned data older than retention window");
        Ok(())
    }
}
