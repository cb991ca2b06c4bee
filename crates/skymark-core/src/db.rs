//! SQLite persistence for messages, conversation summaries, settings and job records.

use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use skymark_types::{ConversationSummary, FineTuneJobRecord, Message, Origin, Setting};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// SQLite-based chat store.
pub struct ChatStore {
    conn: Mutex<Connection>,
}

impl ChatStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-applied statement behind.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                content TEXT NOT NULL,
                origin TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_owner_time ON messages(owner_id, timestamp);

            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL UNIQUE,
                last_message TEXT NOT NULL,
                last_response TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fine_tuning_jobs (
                job_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                model TEXT NOT NULL,
                created_at TEXT NOT NULL,
                fine_tuned_model TEXT
            );
            "#,
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------------

    /// Insert a message.
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO messages (id, owner_id, content, origin, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.id.to_string(),
                message.owner_id,
                message.content,
                message.origin.as_str(),
                format_ts(&message.timestamp),
            ],
        )?;
        Ok(())
    }

    /// The newest `limit` messages for an owner, returned oldest first.
    pub fn recent_messages(&self, owner_id: &str, limit: usize) -> Result<Vec<Message>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM messages
            WHERE owner_id = ?1
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;
        let mut messages = stmt
            .query_map(params![owner_id, limit as i64], |row| Self::row_to_message(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    /// All messages for an owner, oldest first.
    pub fn messages_for_owner(&self, owner_id: &str) -> Result<Vec<Message>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE owner_id = ?1 ORDER BY timestamp ASC, rowid ASC",
        )?;
        let messages = stmt
            .query_map(params![owner_id], |row| Self::row_to_message(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Every stored message in insertion order.
    pub fn all_messages(&self) -> Result<Vec<Message>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM messages ORDER BY rowid ASC")?;
        let messages = stmt
            .query_map([], |row| Self::row_to_message(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    pub fn count_messages(&self) -> Result<u64> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete every message and conversation summary of an owner.
    ///
    /// Returns the number of (messages, summaries) removed.
    pub fn delete_owner_history(&self, owner_id: &str) -> Result<(usize, usize)> {
        let conn = self.conn();
        let messages = conn.execute("DELETE FROM messages WHERE owner_id = ?1", params![owner_id])?;
        let conversations =
            conn.execute("DELETE FROM conversations WHERE owner_id = ?1", params![owner_id])?;
        debug!(
            target: "skymark::db",
            "Deleted {} messages and {} conversations for {}",
            messages,
            conversations,
            owner_id
        );
        Ok((messages, conversations))
    }

    // ------------------------------------------------------------------------
    // Conversation summaries
    // ------------------------------------------------------------------------

    /// Insert the owner's summary or overwrite its latest-exchange fields.
    ///
    /// `id` and `created_at` are only written on first insert.
    pub fn upsert_conversation(
        &self,
        owner_id: &str,
        last_message: &str,
        last_response: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn();
        let ts = format_ts(&now);
        conn.execute(
            r#"
            INSERT INTO conversations (
                id, owner_id, last_message, last_response, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(owner_id) DO UPDATE SET
                last_message = excluded.last_message,
                last_response = excluded.last_response,
                updated_at = excluded.updated_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                owner_id,
                last_message,
                last_response,
                ts
            ],
        )?;
        Ok(())
    }

    /// Conversation summaries for an owner, most recently updated first.
    pub fn conversations_for_owner(&self, owner_id: &str) -> Result<Vec<ConversationSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM conversations WHERE owner_id = ?1 ORDER BY updated_at DESC",
        )?;
        let summaries = stmt
            .query_map(params![owner_id], |row| Self::row_to_conversation(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn get_setting(&self, key: &str) -> Result<Option<Setting>> {
        let conn = self.conn();
        let setting = conn
            .query_row(
                "SELECT key, value, updated_at FROM settings WHERE key = ?1",
                params![key],
                |row| {
                    let updated_at: String = row.get("updated_at")?;
                    Ok(Setting {
                        key: row.get("key")?,
                        value: row.get("value")?,
                        updated_at: parse_ts(&updated_at),
                    })
                },
            )
            .optional()?;
        Ok(setting)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, format_ts(&Utc::now())],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Fine-tuning job records
    // ------------------------------------------------------------------------

    pub fn insert_job_record(&self, record: &FineTuneJobRecord) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO fine_tuning_jobs (job_id, status, model, created_at, fine_tuned_model)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.job_id,
                record.status,
                record.model,
                format_ts(&record.created_at),
                record.fine_tuned_model,
            ],
        )?;
        Ok(())
    }

    /// Local job records, newest first.
    #[cfg(test)]
    pub(crate) fn list_job_records(&self) -> Result<Vec<FineTuneJobRecord>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT * FROM fine_tuning_jobs ORDER BY created_at DESC, rowid DESC")?;
        let records = stmt
            .query_map([], |row| {
                let created_at: String = row.get("created_at")?;
                Ok(FineTuneJobRecord {
                    job_id: row.get("job_id")?,
                    status: row.get("status")?,
                    model: row.get("model")?,
                    created_at: parse_ts(&created_at),
                    fine_tuned_model: row.get("fine_tuned_model")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
        let id: String = row.get("id")?;
        let origin: String = row.get("origin")?;
        let timestamp: String = row.get("timestamp")?;

        Ok(Message {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            owner_id: row.get("owner_id")?,
            content: row.get("content")?,
            origin: Origin::parse(&origin).unwrap_or(Origin::User),
            timestamp: parse_ts(&timestamp),
        })
    }

    fn row_to_conversation(row: &rusqlite::Row) -> rusqlite::Result<ConversationSummary> {
        let id: String = row.get("id")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(ConversationSummary {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            owner_id: row.get("owner_id")?,
            last_message: row.get("last_message")?,
            last_response: row.get("last_response")?,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    }
}

/// Fixed-width UTC timestamp so that text order matches time order.
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_store() -> (ChatStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ChatStore::open(&temp_dir.path().join("nested").join("test.db")).unwrap();
        (store, temp_dir)
    }

    fn message_at(owner: &str, content: &str, origin: Origin, secs: i64) -> Message {
        let base = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Message {
            timestamp: base + Duration::seconds(secs),
            ..Message::new(owner, content, origin)
        }
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let (_store, temp_dir) = create_test_store();
        assert!(temp_dir.path().join("nested").join("test.db").exists());
    }

    #[test]
    fn test_messages_for_owner_sorted_by_timestamp() {
        let (store, _dir) = create_test_store();
        // Inserted out of time order on purpose
        store.insert_message(&message_at("u1", "third", Origin::User, 30)).unwrap();
        store.insert_message(&message_at("u1", "first", Origin::User, 10)).unwrap();
        store.insert_message(&message_at("u2", "other", Origin::User, 15)).unwrap();
        store.insert_message(&message_at("u1", "second", Origin::Assistant, 20)).unwrap();

        let messages = store.messages_for_owner("u1").unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(messages[1].origin, Origin::Assistant);
    }

    #[test]
    fn test_recent_messages_returns_newest_window_oldest_first() {
        let (store, _dir) = create_test_store();
        for i in 0..8 {
            let origin = if i % 2 == 0 { Origin::User } else { Origin::Assistant };
            store
                .insert_message(&message_at("u1", &format!("m{i}"), origin, i))
                .unwrap();
        }

        let recent = store.recent_messages("u1", 5).unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4", "m5", "m6", "m7"]);
    }

    #[test]
    fn test_recent_messages_with_fewer_than_limit() {
        let (store, _dir) = create_test_store();
        store.insert_message(&message_at("u1", "only", Origin::User, 0)).unwrap();

        let recent = store.recent_messages("u1", 5).unwrap();
        assert_eq!(recent.len(), 1);
        assert!(store.recent_messages("nobody", 5).unwrap().is_empty());
    }

    #[test]
    fn test_identical_timestamps_keep_insertion_order() {
        let (store, _dir) = create_test_store();
        store.insert_message(&message_at("u1", "q", Origin::User, 5)).unwrap();
        store.insert_message(&message_at("u1", "a", Origin::Assistant, 5)).unwrap();

        let recent = store.recent_messages("u1", 5).unwrap();
        assert_eq!(recent[0].content, "q");
        assert_eq!(recent[1].content, "a");
    }

    #[test]
    fn test_all_messages_in_insertion_order() {
        let (store, _dir) = create_test_store();
        store.insert_message(&message_at("u2", "late", Origin::User, 50)).unwrap();
        store.insert_message(&message_at("u1", "early", Origin::User, 1)).unwrap();

        let all = store.all_messages().unwrap();
        assert_eq!(all[0].content, "late");
        assert_eq!(all[1].content, "early");
        assert_eq!(store.count_messages().unwrap(), 2);
    }

    #[test]
    fn test_upsert_conversation_keeps_created_at() {
        let (store, _dir) = create_test_store();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(60);

        store.upsert_conversation("u1", "hi", "hello", t0).unwrap();
        let first = store.conversations_for_owner("u1").unwrap().remove(0);

        store.upsert_conversation("u1", "bye", "goodbye", t1).unwrap();
        let summaries = store.conversations_for_owner("u1").unwrap();
        assert_eq!(summaries.len(), 1);

        let second = &summaries[0];
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.last_message, "bye");
        assert_eq!(second.last_response, "goodbye");
        assert!(second.updated_at > first.updated_at);
    }

    #[test]
    fn test_upsert_conversation_idempotent() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();
        store.upsert_conversation("u1", "hi", "hello", now).unwrap();
        store.upsert_conversation("u1", "hi", "hello", now).unwrap();

        let summaries = store.conversations_for_owner("u1").unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].last_message, "hi");
        assert_eq!(summaries[0].last_response, "hello");
    }

    #[test]
    fn test_delete_owner_history() {
        let (store, _dir) = create_test_store();
        store.insert_message(&message_at("u1", "a", Origin::User, 1)).unwrap();
        store.insert_message(&message_at("u1", "b", Origin::Assistant, 2)).unwrap();
        store.insert_message(&message_at("u2", "c", Origin::User, 3)).unwrap();
        store.upsert_conversation("u1", "a", "b", Utc::now()).unwrap();
        store.upsert_conversation("u2", "c", "d", Utc::now()).unwrap();

        let (messages, conversations) = store.delete_owner_history("u1").unwrap();
        assert_eq!(messages, 2);
        assert_eq!(conversations, 1);
        assert!(store.messages_for_owner("u1").unwrap().is_empty());
        assert!(store.conversations_for_owner("u1").unwrap().is_empty());
        assert_eq!(store.messages_for_owner("u2").unwrap().len(), 1);
        assert_eq!(store.conversations_for_owner("u2").unwrap().len(), 1);
    }

    #[test]
    fn test_settings_upsert() {
        let store = ChatStore::open_in_memory().unwrap();
        assert!(store.get_setting("openaiModel").unwrap().is_none());

        store.set_setting("openaiModel", "ft:gpt-3.5-turbo:one").unwrap();
        store.set_setting("openaiModel", "ft:gpt-3.5-turbo:two").unwrap();

        let setting = store.get_setting("openaiModel").unwrap().unwrap();
        assert_eq!(setting.value, "ft:gpt-3.5-turbo:two");
    }

    #[test]
    fn test_job_records_round_trip() {
        let store = ChatStore::open_in_memory().unwrap();
        let record = FineTuneJobRecord {
            job_id: "ftjob-abc".to_string(),
            status: "validating_files".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            created_at: Utc::now(),
            fine_tuned_model: None,
        };
        store.insert_job_record(&record).unwrap();

        let records = store.list_job_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_id, "ftjob-abc");
        assert_eq!(records[0].fine_tuned_model, None);
        assert!(store.insert_job_record(&record).is_err());
    }
}
