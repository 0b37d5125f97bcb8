use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Challenge, Idea, IdeaStatus, Lecture, LearningCenter, Profile, QuizQuestion, Role, TestResult,
};

// -- JWT Claims --

/// JWT claims shared by the REST middleware and the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub center: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub token: String,
    pub profile: Profile,
}

// -- Lectures --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLectureRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    pub grade: String,
    #[serde(default)]
    pub video_url: Option<String>,
}

// -- Ideas --

/// `draft_id` is the client-side id of an offline draft; the server uses it
/// as the idea id so a replayed draft is not inserted twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateIdeaRequest {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateIdeaStatusRequest {
    pub status: IdeaStatus,
}

// -- Challenges --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChallengeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: DateTime<Utc>,
}

// -- Test results --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordResultRequest {
    pub topic: String,
    pub score: u32,
    pub total: u32,
}

// -- Learning centers --

#[derive(Debug, Serialize)]
pub struct CenterResponse {
    #[serde(flatten)]
    pub center: LearningCenter,
    pub map_url: String,
}

#[derive(Debug, Serialize)]
pub struct MapEmbedResponse {
    pub map_url: String,
}

// -- Dashboards --

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DashboardResponse {
    Student {
        profile: Profile,
        lectures: Vec<Lecture>,
        ideas: Vec<Idea>,
        results: Vec<TestResult>,
        open_challenges: Vec<Challenge>,
    },
    Professor {
        profile: Profile,
        lectures: Vec<Lecture>,
        pending_ideas: Vec<Idea>,
    },
    Ngo {
        profile: Profile,
        challenges: Vec<Challenge>,
        pending_ideas: Vec<Idea>,
    },
}

// -- AI mini-apps --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TutorRequest {
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummarizeRequest {
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoryRequest {
    pub topic: String,
    #[serde(default)]
    pub grade: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizRequest {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BattleRequest {
    pub questions: Vec<QuizQuestion>,
    pub player_one: Vec<usize>,
    pub player_two: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleWinner {
    PlayerOne,
    PlayerTwo,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub player_one_score: u32,
    pub player_two_score: u32,
    pub total: u32,
    pub winner: BattleWinner,
}

/// Output of an AI mini-app. `fallback` is set when the endpoint failed and
/// `value` holds placeholder content instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generated<T> {
    pub value: T,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl<T> Generated<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            fallback: false,
            notice: None,
        }
    }

    pub fn fallback(value: T, notice: impl Into<String>) -> Self {
        Self {
            value,
            fallback: true,
            notice: Some(notice.into()),
        }
    }
}
