//! # Evidence and Comments
//!
//! Attachments owned by a dispute. Both collections are append-only from the
//! aggregate's perspective: entries are created by `add_evidence` and
//! `add_comment` and never edited or removed.

use serde::{Deserialize, Serialize};

use dispute_core::{CommentId, EvidenceId, Timestamp, UserId};

/// An evidence file attached to a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeEvidence {
    /// Unique evidence identifier.
    pub id: EvidenceId,
    /// Name of the uploaded file.
    pub file_name: String,
    /// What the file shows.
    pub description: String,
    /// Who uploaded it.
    pub uploaded_by: UserId,
    /// When it was uploaded.
    pub uploaded_at: Timestamp,
}

/// Caller-supplied fields for a new evidence attachment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewEvidence {
    /// Name of the uploaded file. Required.
    pub file_name: String,
    /// What the file shows. May be empty.
    pub description: String,
}

impl NewEvidence {
    /// Evidence with a file name and description.
    pub fn new(file_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            description: description.into(),
        }
    }
}

/// A comment on a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeComment {
    /// Unique comment identifier.
    pub id: CommentId,
    /// Who wrote it.
    pub user_id: UserId,
    /// Display name of who wrote it.
    pub user_name: String,
    /// Full comment text.
    pub comment: String,
    /// Visible to reviewers only, not to the filer.
    pub is_internal: bool,
    /// When it was posted.
    pub created_at: Timestamp,
}

/// The first `max_chars` characters of `text`.
///
/// Counts `char`s, so multi-byte text is never split mid-character.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
