use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a profile belongs to. Every route and dashboard is gated on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Professor,
    Ngo,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Professor, Role::Ngo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Professor => "professor",
            Self::Ngo => "ngo",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "professor" => Ok(Self::Professor),
            "ngo" => Ok(Self::Ngo),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    Pending,
    Approved,
    Rejected,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Reviews are one-shot: only a pending idea can be approved or rejected.
    pub fn can_transition_to(&self, next: IdeaStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
        )
    }
}

impl fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdeaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown idea status '{}'", other)),
        }
    }
}

/// Application-level user record, distinct from the auth identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub grade: Option<String>,
    pub center: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub grade: String,
    pub video_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Community board post. Ideas may answer a challenge or stand alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub challenge_id: Option<Uuid>,
    pub status: IdeaStatus,
    pub created_at: DateTime<Utc>,
}

/// A time-boxed prompt posted by an NGO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub ngo_id: Uuid,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.deadline
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub student_id: Uuid,
    pub topic: String,
    pub score: u32,
    pub total: u32,
    pub created_at: DateTime<Utc>,
}

impl TestResult {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.total)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningCenter {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One multiple-choice question of a quiz battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
