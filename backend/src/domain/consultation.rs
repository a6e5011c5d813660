//! Consultation submissions and their review lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AccountId, ConsultationId, PetId, SlotDate, TimeSlot};

/// Fixed consultation fee, in minor currency units.
pub const CONSULTATION_PRICE: i64 = 280_000;

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX: usize = 4_000;

/// Review state of a consultation.
///
/// ```text
/// Pending  -> InReview | Resolved | Cancelled
/// InReview -> Pending  | Resolved | Cancelled
/// Resolved, Cancelled: terminal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    Pending,
    InReview,
    Resolved,
    Cancelled,
}

impl ConsultationStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::InReview, Self::Resolved, Self::Cancelled];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Resolved => "resolved",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }

    /// Whether `self -> next` is permitted. Re-applying the current status is
    /// always accepted.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::Pending => matches!(next, Self::InReview | Self::Resolved | Self::Cancelled),
            Self::InReview => matches!(next, Self::Pending | Self::Resolved | Self::Cancelled),
            Self::Resolved | Self::Cancelled => false,
        }
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or requested status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown consultation status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for ConsultationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(Self::Pending),
            "in_review" | "inreview" | "reviewing" => Ok(Self::InReview),
            "resolved" | "completed" => Ok(Self::Resolved),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

/// Category of an uploaded file, decided by its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Audio,
    Video,
    Document,
}

impl AttachmentKind {
    /// Classify an upload. Images and PDFs are documents; anything outside
    /// the accepted families is rejected with `None`.
    ///
    /// # Examples
    /// ```
    /// use vetconsult::domain::AttachmentKind;
    ///
    /// assert_eq!(AttachmentKind::classify("video/mp4"), Some(AttachmentKind::Video));
    /// assert_eq!(AttachmentKind::classify("image/png"), Some(AttachmentKind::Document));
    /// assert_eq!(AttachmentKind::classify("application/zip"), None);
    /// ```
    pub fn classify(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.split_once('/') {
            Some(("audio", _)) => Some(Self::Audio),
            Some(("video", _)) => Some(Self::Video),
            Some(("image", _)) => Some(Self::Document),
            Some(("application", "pdf")) => Some(Self::Document),
            _ => None,
        }
    }
}

/// Metadata for a stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub kind: AttachmentKind,
    /// Name under the upload directory.
    pub stored_name: String,
    /// Client-supplied file name, if any.
    pub original_name: Option<String>,
    pub content_type: String,
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the content.
    pub sha256: String,
}

/// Requested appointment for a consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appointment {
    pub date: SlotDate,
    pub time: TimeSlot,
}

/// Validation errors for consultation submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultationValidationError {
    EmptyDescription,
    DescriptionTooLong { max: usize },
}

impl fmt::Display for ConsultationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::DescriptionTooLong { max } => {
                write!(f, "description must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for ConsultationValidationError {}

/// Free-text description of the problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(String);

impl Description {
    pub fn new(raw: &str) -> Result<Self, ConsultationValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConsultationValidationError::EmptyDescription);
        }
        if trimmed.chars().count() > DESCRIPTION_MAX {
            return Err(ConsultationValidationError::DescriptionTooLong {
                max: DESCRIPTION_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A consultation as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Consultation {
    pub id: ConsultationId,
    pub account_id: AccountId,
    pub pet_id: Option<PetId>,
    /// Empty for consultations submitted as uploads only.
    pub description: String,
    pub price: i64,
    pub status: ConsultationStatus,
    pub admin_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub appointment: Option<Appointment>,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consultation {
    /// Attachments of one kind, in upload order.
    pub fn attachments_of(&self, kind: AttachmentKind) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(move |a| a.kind == kind)
    }
}

/// New consultation handed to the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConsultation {
    pub id: ConsultationId,
    pub account_id: AccountId,
    pub pet_id: Option<PetId>,
    pub description: Option<Description>,
    pub appointment: Option<Appointment>,
    pub attachments: Vec<Attachment>,
}

/// Admin-driven status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ConsultationStatus,
    /// `None` leaves any existing response untouched.
    pub admin_response: Option<String>,
}
