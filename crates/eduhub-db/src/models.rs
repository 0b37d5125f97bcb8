//! Database row types. These map directly to SQLite rows and are converted
//! into `eduhub-types` models at the edge, so a corrupt column surfaces as an
//! error instead of a half-built record.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use eduhub_types::models::{Challenge, Idea, LearningCenter, Lecture, Profile, TestResult};

pub struct ProfileRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
    pub grade: Option<String>,
    pub center: Option<String>,
    pub created_at: String,
}

pub struct LectureRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub grade: String,
    pub video_url: Option<String>,
    pub author_id: String,
    pub created_at: String,
}

pub struct IdeaRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub author_name: String,
    pub challenge_id: Option<String>,
    pub status: String,
    pub created_at: String,
}

pub struct ChallengeRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub ngo_id: String,
    pub deadline: String,
    pub created_at: String,
}

pub struct TestResultRow {
    pub id: String,
    pub student_id: String,
    pub topic: String,
    pub score: i64,
    pub total: i64,
    pub created_at: String,
}

pub struct CenterRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Timestamps are written as RFC 3339.
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("corrupt id '{}'", raw))
}

impl ProfileRow {
    pub fn into_profile(self) -> Result<Profile> {
        Ok(Profile {
            id: parse_uuid(&self.id)?,
            email: self.email,
            full_name: self.full_name,
            role: self.role.parse().map_err(|e: String| anyhow!(e))?,
            grade: self.grade,
            center: self.center,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl LectureRow {
    pub fn into_lecture(self) -> Result<Lecture> {
        Ok(Lecture {
            id: parse_uuid(&self.id)?,
            title: self.title,
            description: self.description,
            subject: self.subject,
            grade: self.grade,
            video_url: self.video_url,
            author_id: parse_uuid(&self.author_id)?,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl IdeaRow {
    pub fn into_idea(self) -> Result<Idea> {
        Ok(Idea {
            id: parse_uuid(&self.id)?,
            title: self.title,
            description: self.description,
            author_id: parse_uuid(&self.author_id)?,
            author_name: self.author_name,
            challenge_id: self.challenge_id.as_deref().map(parse_uuid).transpose()?,
            status: self.status.parse().map_err(|e: String| anyhow!(e))?,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl ChallengeRow {
    pub fn into_challenge(self) -> Result<Challenge> {
        Ok(Challenge {
            id: parse_uuid(&self.id)?,
            title: self.title,
            description: self.description,
            ngo_id: parse_uuid(&self.ngo_id)?,
            deadline: parse_time(&self.deadline)?,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl TestResultRow {
    pub fn into_result(self) -> Result<TestResult> {
        Ok(TestResult {
            id: parse_uuid(&self.id)?,
            student_id: parse_uuid(&self.student_id)?,
            topic: self.topic,
            score: u32::try_from(self.score).context("negative score")?,
            total: u32::try_from(self.total).context("negative total")?,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl CenterRow {
    pub fn into_center(self) -> Result<LearningCenter> {
        Ok(LearningCenter {
            id: parse_uuid(&self.id)?,
            name: self.name,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupt one.
pub fn convert_all<R, T>(rows: Vec<R>, f: impl Fn(R) -> Result<T>) -> Result<Vec<T>> {
    rows.into_iter().map(f).collect()
}
