//! SQLite note store.
//!
//! Schema (created if absent):
//!
//! ```sql
//! notes(id INTEGER PRIMARY KEY, body TEXT, date TEXT, due TEXT)
//! topics(id INTEGER PRIMARY KEY, topic TEXT, note INTEGER -> notes.id)
//! keywords(id INTEGER PRIMARY KEY, keyword TEXT, note INTEGER -> notes.id)
//! ```
//!
//! Timestamps are RFC 3339 strings in local time; due dates are `YYYY-MM-DD`.
//! Notes are returned in creation (id) order with topics attached in the order
//! they were given. Note bodies are never logged, only their lengths.

pub mod keywords;

pub use keywords::KeywordExtractor;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use core_model::DisplayItem;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY,
    body TEXT NOT NULL,
    date TEXT NOT NULL,
    due TEXT
);
CREATE TABLE IF NOT EXISTS topics (
    id INTEGER PRIMARY KEY,
    topic TEXT NOT NULL,
    note INTEGER NOT NULL REFERENCES notes(id)
);
CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY,
    keyword TEXT NOT NULL,
    note INTEGER NOT NULL REFERENCES notes(id)
);
CREATE INDEX IF NOT EXISTS topics_topic ON topics(topic);
CREATE INDEX IF NOT EXISTS keywords_keyword ON keywords(keyword);
";

const DUE_FORMAT: &str = "%Y-%m-%d";

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: i64,
    pub body: String,
    pub created: DateTime<Local>,
    pub due: Option<NaiveDate>,
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
}

impl NoteRecord {
    pub fn to_display_item(&self) -> DisplayItem {
        DisplayItem::new(self.body.clone(), self.created)
            .with_topics(self.topics.iter().cloned())
            .with_due(self.due)
    }
}

pub struct NoteStore {
    conn: Connection,
    extractor: KeywordExtractor,
}

impl NoteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("could not open database {}", path.display()))?;
        info!(target: "store", path = %path.display(), "open");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("could not create schema")?;
        Ok(Self {
            conn,
            extractor: KeywordExtractor::new()?,
        })
    }

    /// Store a note created now.
    pub fn add_note(
        &mut self,
        body: &str,
        topics: &[String],
        due: Option<NaiveDate>,
    ) -> Result<NoteRecord> {
        self.add_note_at(body, topics, due, Local::now())
    }

    /// Store a note with an explicit creation time.
    pub fn add_note_at(
        &mut self,
        body: &str,
        topics: &[String],
        due: Option<NaiveDate>,
        created: DateTime<Local>,
    ) -> Result<NoteRecord> {
        let known = self.keywords()?;
        let keywords = self.extractor.extract(body, &known);
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO notes (body, date, due) VALUES (?1, ?2, ?3)",
            params![
                body,
                created.to_rfc3339(),
                due.map(|d| d.format(DUE_FORMAT).to_string())
            ],
        )?;
        let id = tx.last_insert_rowid();
        for topic in topics {
            tx.execute(
                "INSERT INTO topics (topic, note) VALUES (?1, ?2)",
                params![topic, id],
            )?;
        }
        for keyword in &keywords {
            tx.execute(
                "INSERT INTO keywords (keyword, note) VALUES (?1, ?2)",
                params![keyword, id],
            )?;
        }
        tx.commit()?;
        debug!(
            target: "store",
            id,
            body_len = body.len(),
            topics = topics.len(),
            keywords = keywords.len(),
            "add_note"
        );
        Ok(NoteRecord {
            id,
            body: body.to_string(),
            created,
            due,
            topics: topics.to_vec(),
            keywords: keywords.into_iter().collect(),
        })
    }

    /// Every note in creation order.
    pub fn notes(&self) -> Result<Vec<NoteRecord>> {
        self.notes_after(0)
    }

    /// Notes with an id greater than `id`, in creation order.
    pub fn notes_after(&self, id: i64) -> Result<Vec<NoteRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body, date, due FROM notes WHERE id > ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut topics = self.attached("topics", "topic", id)?;
        let mut keywords = self.attached("keywords", "keyword", id)?;
        let mut out = Vec::with_capacity(rows.len());
        for (note_id, body, date, due) in rows {
            let created = DateTime::parse_from_rfc3339(&date)
                .with_context(|| format!("note {note_id} has an invalid date"))?
                .with_timezone(&Local);
            let due = due
                .map(|d| NaiveDate::parse_from_str(&d, DUE_FORMAT))
                .transpose()
                .with_context(|| format!("note {note_id} has an invalid due date"))?;
            out.push(NoteRecord {
                id: note_id,
                body,
                created,
                due,
                topics: topics.remove(&note_id).unwrap_or_default(),
                keywords: keywords.remove(&note_id).unwrap_or_default(),
            });
        }
        debug!(target: "store", after = id, count = out.len(), "notes_after");
        Ok(out)
    }

    /// Rows of a per-note side table, grouped by note id.
    fn attached(&self, table: &str, column: &str, after: i64) -> Result<HashMap<i64, Vec<String>>> {
        let sql = format!("SELECT note, {column} FROM {table} WHERE note > ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut out: HashMap<i64, Vec<String>> = HashMap::new();
        let rows = stmt.query_map(params![after], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (note, value) = row?;
            out.entry(note).or_default().push(value);
        }
        Ok(out)
    }

    /// Every distinct keyword.
    pub fn keywords(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT keyword FROM keywords")?;
        let words = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(words)
    }

    /// Highest note id, or 0 for an empty store.
    pub fn last_id(&self) -> Result<i64> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM notes", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(id.unwrap_or(0))
    }

    /// Delete the note matching `item` by body and creation time, along with
    /// its topics and keywords. Returns whether a note was removed.
    pub fn delete_matching(&mut self, item: &DisplayItem) -> Result<bool> {
        let candidates = {
            let mut stmt = self
                .conn
                .prepare("SELECT id, date FROM notes WHERE body = ?1 ORDER BY id")?;
            stmt.query_map(params![item.body()], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let Some(id) = candidates.into_iter().find_map(|(id, date)| {
            DateTime::parse_from_rfc3339(&date)
                .ok()
                .filter(|d| *d == item.created())
                .map(|_| id)
        }) else {
            debug!(target: "store", body_len = item.body().len(), "delete_no_match");
            return Ok(false);
        };
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM topics WHERE note = ?1", params![id])?;
        tx.execute("DELETE FROM keywords WHERE note = ?1", params![id])?;
        tx.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        tx.commit()?;
        info!(target: "store", id, "delete");
        Ok(true)
    }
}
