//! Forum thread record consumed by the sync, and the inbound payload it is assembled from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// A file attached to a thread message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    fn has_content_type(&self, prefixes: &[&str]) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| prefixes.iter().any(|p| ct.starts_with(p)))
    }

    pub fn is_image(&self) -> bool {
        self.has_content_type(&["image/"])
    }
}

/// A message posted in a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub author: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable snapshot of one thread, built fresh for every observed change.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadRecord {
    pub id: u64,
    pub url: String,
    pub title: String,
    /// Display name of whoever opened the thread, if known.
    pub poster: Option<String>,
    pub create_date: DateTime<Utc>,
    /// Absent until the thread has any message.
    pub last_post_date: Option<DateTime<Utc>>,
    pub messages: Vec<Message>,
    pub tags: Vec<String>,
    pub media: Vec<Attachment>,
    pub save_files: Vec<Attachment>,
    pub log_files: Vec<Attachment>,
}

impl ThreadRecord {
    /// First image attachment in arrival order.
    pub fn main_image(&self) -> Option<&Attachment> {
        self.media.iter().find(|m| m.is_image())
    }

    pub fn first_message(&self) -> Option<&Message> {
        self.messages.first()
    }
}

impl std::fmt::Display for ThreadRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "thread {} ({:?})", self.id, self.title)
    }
}

/// Thread as posted by the chat-platform bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPayload {
    #[serde(deserialize_with = "deserialize_snowflake")]
    pub id: u64,
    pub url: String,
    pub title: String,
    /// Display name of the thread owner, used when there are no messages.
    #[serde(default)]
    pub owner: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub messages: Vec<MessagePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Request body for an initial bulk sync.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkThreadsRequest {
    pub threads: Vec<ThreadPayload>,
}

impl ThreadPayload {
    /// Assemble the immutable record, categorizing attachments across all messages.
    pub fn into_record(self) -> Result<ThreadRecord, AppError> {
        let create_date = parse_utc_timestamp(&self.created_at)?;

        let mut messages = Vec::with_capacity(self.messages.len());
        let mut media = Vec::new();
        let mut save_files = Vec::new();
        let mut log_files = Vec::new();

        for message in self.messages {
            let created_at = parse_utc_timestamp(&message.created_at)?;
            for attachment in message.attachments {
                if attachment.has_content_type(&["video", "image"]) {
                    media.push(attachment);
                } else if attachment.filename.ends_with("json") {
                    save_files.push(attachment);
                } else if attachment.filename.ends_with("log") {
                    log_files.push(attachment);
                }
            }
            messages.push(Message {
                author: message.author,
                content: message.content,
                created_at,
            });
        }

        let last_post_date = messages.last().map(|m| m.created_at);
        let poster = match messages.first() {
            Some(first) => first.author.clone(),
            None => self.owner,
        };

        Ok(ThreadRecord {
            id: self.id,
            url: self.url,
            title: self.title,
            poster,
            create_date,
            last_post_date,
            messages,
            tags: self.tags,
            media,
            save_files,
            log_files,
        })
    }
}

/// Parse an RFC 3339 timestamp. Timestamps without an explicit offset are rejected.
pub fn parse_utc_timestamp(s: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            AppError::Validation(format!(
                "Timestamp {:?} must be RFC 3339 with a UTC offset: {}",
                s, e
            ))
        })
}

/// Accept 64-bit ids either as JSON numbers or as decimal strings.
fn deserialize_snowflake<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Snowflake {
        Number(u64),
        Text(String),
    }

    match Snowflake::deserialize(deserializer)? {
        Snowflake::Number(n) => Ok(n),
        Snowflake::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
