use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use eduhub_types::models::{Challenge, Idea, IdeaStatus, Lecture, Profile, TestResult};

use crate::Database;
use crate::models::{
    CenterRow, ChallengeRow, IdeaRow, LectureRow, ProfileRow, TestResultRow, format_time,
};

/// Equality filters for the community board. `None` means "any".
#[derive(Debug, Default, Clone)]
pub struct IdeaFilter {
    pub status: Option<IdeaStatus>,
    pub challenge_id: Option<String>,
    pub author_id: Option<String>,
}

const IDEA_COLUMNS: &str = "i.id, i.title, i.description, i.author_id, p.full_name, \
    i.challenge_id, i.status, i.created_at";

impl Database {
    // -- Profiles --

    /// Returns `false` when the email is already registered.
    pub fn create_profile(&self, profile: &Profile, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO profiles
                    (id, email, password, full_name, role, grade, center, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(email) DO NOTHING",
                rusqlite::params![
                    profile.id.to_string(),
                    profile.email,
                    password_hash,
                    profile.full_name,
                    profile.role.as_str(),
                    profile.grade,
                    profile.center,
                    format_time(profile.created_at),
                ],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_profile_by_email(&self, email: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "email", email))
    }

    pub fn get_profile_by_id(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, "id", id))
    }

    // -- Lectures --

    pub fn insert_lecture(&self, lecture: &Lecture) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO lectures
                    (id, title, description, subject, grade, video_url, author_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    lecture.id.to_string(),
                    lecture.title,
                    lecture.description,
                    lecture.subject,
                    lecture.grade,
                    lecture.video_url,
                    lecture.author_id.to_string(),
                    format_time(lecture.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// All lectures in creation order.
    pub fn list_lectures(&self) -> Result<Vec<LectureRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, subject, grade, video_url, author_id, created_at
                 FROM lectures ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([], lecture_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_lectures_by_author(&self, author_id: &str) -> Result<Vec<LectureRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, subject, grade, video_url, author_id, created_at
                 FROM lectures WHERE author_id = ?1 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([author_id], lecture_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_lecture(&self, id: &str) -> Result<Option<LectureRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, description, subject, grade, video_url, author_id, created_at
                     FROM lectures WHERE id = ?1",
                    [id],
                    lecture_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Ideas --

    /// Returns `false` when an idea with this id already exists.
    pub fn insert_idea(&self, idea: &Idea) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO ideas
                    (id, title, description, author_id, challenge_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO NOTHING",
                rusqlite::params![
                    idea.id.to_string(),
                    idea.title,
                    idea.description,
                    idea.author_id.to_string(),
                    idea.challenge_id.map(|c| c.to_string()),
                    idea.status.as_str(),
                    format_time(idea.created_at),
                ],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_idea(&self, id: &str) -> Result<Option<IdeaRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IDEA_COLUMNS} FROM ideas i JOIN profiles p ON i.author_id = p.id
                 WHERE i.id = ?1"
            );
            let row = conn.query_row(&sql, [id], idea_from_row).optional()?;
            Ok(row)
        })
    }

    /// Newest first.
    pub fn list_ideas(&self, filter: &IdeaFilter) -> Result<Vec<IdeaRow>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("i.status = ?");
            values.push(status.as_str().to_string());
        }
        if let Some(challenge_id) = &filter.challenge_id {
            clauses.push("i.challenge_id = ?");
            values.push(challenge_id.clone());
        }
        if let Some(author_id) = &filter.author_id {
            clauses.push("i.author_id = ?");
            values.push(author_id.clone());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IDEA_COLUMNS} FROM ideas i JOIN profiles p ON i.author_id = p.id
                 {where_sql} ORDER BY i.created_at DESC, i.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(values.iter()), idea_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Compare-and-set on the status column. Returns false when the idea is
    /// missing or no longer in `from`.
    pub fn update_idea_status(&self, id: &str, from: IdeaStatus, to: IdeaStatus) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE ideas SET status = ?1 WHERE id = ?2 AND status = ?3",
                (to.as_str(), id, from.as_str()),
            )?;
            Ok(changed == 1)
        })
    }

    // -- Challenges --

    pub fn insert_challenge(&self, challenge: &Challenge) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO challenges (id, title, description, ngo_id, deadline, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    challenge.id.to_string(),
                    challenge.title,
                    challenge.description,
                    challenge.ngo_id.to_string(),
                    format_time(challenge.deadline),
                    format_time(challenge.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Soonest deadline first. `ngo_id` narrows to one NGO's challenges.
    pub fn list_challenges(&self, ngo_id: Option<&str>) -> Result<Vec<ChallengeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, ngo_id, deadline, created_at FROM challenges
                 WHERE ?1 IS NULL OR ngo_id = ?1
                 ORDER BY deadline, rowid",
            )?;
            let rows = stmt
                .query_map([ngo_id], challenge_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_challenge(&self, id: &str) -> Result<Option<ChallengeRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, description, ngo_id, deadline, created_at
                     FROM challenges WHERE id = ?1",
                    [id],
                    challenge_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Test results --

    pub fn insert_result(&self, result: &TestResult) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO test_results (id, student_id, topic, score, total, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    result.id.to_string(),
                    result.student_id.to_string(),
                    result.topic,
                    i64::from(result.score),
                    i64::from(result.total),
                    format_time(result.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Oldest first. `student_id` narrows to one learner.
    pub fn list_results(&self, student_id: Option<&str>) -> Result<Vec<TestResultRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, student_id, topic, score, total, created_at FROM test_results
                 WHERE ?1 IS NULL OR student_id = ?1
                 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([student_id], |row| {
                    Ok(TestResultRow {
                        id: row.get(0)?,
                        student_id: row.get(1)?,
                        topic: row.get(2)?,
                        score: row.get(3)?,
                        total: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Learning centers --

    pub fn list_centers(&self) -> Result<Vec<CenterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, address, latitude, longitude FROM learning_centers ORDER BY name",
            )?;
            let rows = stmt
                .query_map([], center_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_center(&self, id: &str) -> Result<Option<CenterRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, address, latitude, longitude
                     FROM learning_centers WHERE id = ?1",
                    [id],
                    center_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }
}

fn query_profile(conn: &Connection, column: &str, value: &str) -> Result<Option<ProfileRow>> {
    let sql = format!(
        "SELECT id, email, password, full_name, role, grade, center, created_at
         FROM profiles WHERE {column} = ?1"
    );
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(ProfileRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                full_name: row.get(3)?,
                role: row.get(4)?,
                grade: row.get(5)?,
                center: row.get(6)?,
                created_at: row.get(7)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn lecture_from_row(row: &Row<'_>) -> rusqlite::Result<LectureRow> {
    Ok(LectureRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        subject: row.get(3)?,
        grade: row.get(4)?,
        video_url: row.get(5)?,
        author_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn idea_from_row(row: &Row<'_>) -> rusqlite::Result<IdeaRow> {
    Ok(IdeaRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author_id: row.get(3)?,
        author_name: row.get(4)?,
        challenge_id: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn challenge_from_row(row: &Row<'_>) -> rusqlite::Result<ChallengeRow> {
    Ok(ChallengeRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        ngo_id: row.get(3)?,
        deadline: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn center_from_row(row: &Row<'_>) -> rusqlite::Result<CenterRow> {
    Ok(CenterRow {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
    })
}
