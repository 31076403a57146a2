use crate::app_dirs::AppDirs;
use crate::game::{Game, RoundRecord};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("round history (de)serialization failed: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no result with id {0}")]
    NotFound(i64),
}

/// One persisted play-through. The review side only ever rewrites `rounds`
/// and `verified_score`; everything else is frozen at game end.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub id: i64,
    pub name: String,
    pub student_id: String,
    /// Sum of all round points, frozen when the session ended.
    pub auto_score: f64,
    pub rounds_completed: u32,
    pub rounds: Vec<RoundRecord>,
    /// `None` until a round of this record has been reviewed or
    /// batch-matched at least once.
    pub verified_score: Option<f64>,
    pub created_at: DateTime<Local>,
}

impl ResultRecord {
    /// Snapshot of a finished session, ready for `create`.
    pub fn from_game(game: &Game) -> Self {
        debug_assert!(
            (game.auto_score - game.score_from_history()).abs() < 1e-9,
            "incremental score diverged from history"
        );
        Self {
            id: 0,
            name: game.participant.name.clone(),
            student_id: game.participant.student_id.clone(),
            auto_score: game.auto_score,
            rounds_completed: game.rounds.len() as u32,
            rounds: game.rounds.clone(),
            verified_score: None,
            created_at: Local::now(),
        }
    }
}

/// The three persistence operations the core depends on, plus the derived
/// high score shown on the score line.
pub trait ResultsGateway {
    fn create(&self, record: &ResultRecord) -> Result<i64, StoreError>;
    /// All records, newest first.
    fn list_all(&self) -> Result<Vec<ResultRecord>, StoreError>;
    /// Partial update: replaces a record's round history and verified score.
    fn update_verification(
        &self,
        id: i64,
        rounds: &[RoundRecord],
        verified_score: f64,
    ) -> Result<(), StoreError>;
    fn high_score(&self) -> Result<Option<f64>, StoreError>;
}

/// Sqlite-backed results store.
#[derive(Debug)]
pub struct SqliteResults {
    conn: Connection,
}

impl SqliteResults {
    /// Opens the store at the default state path, creating it if needed.
    pub fn open_default() -> Result<Self, StoreError> {
        let db_path = Self::db_path().unwrap_or_else(|| PathBuf::from("techarade_results.db"));
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn db_path() -> Option<PathBuf> {
        AppDirs::db_path()
    }

    fn init(conn: &Connection) -> Result<(), StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                student_id TEXT NOT NULL DEFAULT '',
                total_score REAL NOT NULL,
                rounds_completed INTEGER NOT NULL,
                rounds TEXT NOT NULL,
                verified_score REAL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_created_at ON results(created_at)",
            [],
        )?;
        Ok(())
    }
}

impl ResultsGateway for SqliteResults {
    fn create(&self, record: &ResultRecord) -> Result<i64, StoreError> {
        let rounds_json = serde_json::to_string(&record.rounds)?;
        self.conn.execute(
            r#"
            INSERT INTO results
            (name, student_id, total_score, rounds_completed, rounds, verified_score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.name,
                record.student_id,
                record.auto_score,
                record.rounds_completed,
                rounds_json,
                record.verified_score,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_all(&self) -> Result<Vec<ResultRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, student_id, total_score, rounds_completed, rounds,
                   verified_score, created_at
            FROM results
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let rounds_json: String = row.get(5)?;
            let rounds: Vec<RoundRecord> = serde_json::from_str(&rounds_json).map_err(|_| {
                rusqlite::Error::InvalidColumnType(5, "rounds".to_string(), rusqlite::types::Type::Text)
            })?;
            let created_str: String = row.get(7)?;
            let created_at = DateTime::parse_from_rfc3339(&created_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        7,
                        "created_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(ResultRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                student_id: row.get(2)?,
                auto_score: row.get(3)?,
                rounds_completed: row.get(4)?,
                rounds,
                verified_score: row.get(6)?,
                created_at,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn update_verification(
        &self,
        id: i64,
        rounds: &[RoundRecord],
        verified_score: f64,
    ) -> Result<(), StoreError> {
        let rounds_json = serde_json::to_string(rounds)?;
        let changed = self.conn.execute(
            "UPDATE results SET rounds = ?1, verified_score = ?2 WHERE id = ?3",
            params![rounds_json, verified_score, id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn high_score(&self) -> Result<Option<f64>, StoreError> {
        let max: Option<f64> = self
            .conn
            .query_row("SELECT MAX(total_score) FROM results", [], |row| row.get(0))?;
        Ok(max)
    }
}
