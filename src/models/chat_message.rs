//! Chat message model
//!
//! Transcript of the nutrition assistant conversation, one row per message.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Sender::User),
            "ai" => Some(Sender::Ai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: String,
    pub sender: Sender,
    pub content: String,
    pub created_at: String,
}

impl ChatMessage {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let sender: String = row.get("sender")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            sender: Sender::from_str(&sender).unwrap_or(Sender::Ai),
            content: row.get("content")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn create(conn: &Connection, user_id: &str, sender: Sender, content: &str) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO chat_messages (user_id, sender, content) VALUES (?1, ?2, ?3)",
            params![user_id, sender.as_str(), content],
        )?;

        let id = conn.last_insert_rowid();
        let mut stmt = conn.prepare("SELECT * FROM chat_messages WHERE id = ?1")?;
        match stmt.query_row([id], Self::from_row) {
            Ok(message) => Ok(message),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(DbError::NotFound(format!("Chat message {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The most recent `limit` messages, oldest first
    pub fn list_for_user(conn: &Connection, user_id: &str, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM (
                SELECT * FROM chat_messages WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2
            ) ORDER BY id ASC
            "#,
        )?;
        let messages = stmt
            .query_map(params![user_id, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Returns the number of messages removed
    pub fn clear_for_user(conn: &Connection, user_id: &str) -> DbResult<usize> {
        Ok(conn.execute("DELETE FROM chat_messages WHERE user_id = ?1", [user_id])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::UserProfile;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        UserProfile::create(&conn, "u1", "Ada", "ada@example.com").unwrap();
        conn
    }

    #[test]
    fn test_transcript_order_and_limit() {
        let conn = test_conn();
        for i in 0..5 {
            let sender = if i % 2 == 0 { Sender::User } else { Sender::Ai };
            ChatMessage::create(&conn, "u1", sender, &format!("message {}", i)).unwrap();
        }

        let recent = ChatMessage::list_for_user(&conn, "u1", 3).unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["message 2", "message 3", "message 4"]);
        assert_eq!(recent[0].sender, Sender::User);
        assert_eq!(recent[1].sender, Sender::Ai);
    }

    #[test]
    fn test_clear_for_user() {
        let conn = test_conn();
        ChatMessage::create(&conn, "u1", Sender::User, "hello").unwrap();
        ChatMessage::create(&conn, "u1", Sender::Ai, "hi").unwrap();
        assert_eq!(ChatMessage::clear_for_user(&conn, "u1").unwrap(), 2);
        assert!(ChatMessage::list_for_user(&conn, "u1", 10).unwrap().is_empty());
    }
}
