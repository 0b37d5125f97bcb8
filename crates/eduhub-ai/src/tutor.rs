use tracing::warn;

use eduhub_types::api::{ChatRole, ChatTurn, Generated};

use crate::client::{ChatBackend, CompletionRequest};
use crate::{fallback_notice, system};

/// Older turns are dropped before the history is sent.
pub const MAX_HISTORY: usize = 20;

pub const FALLBACK_REPLY: &str = "I can't reach my notes right now. Try breaking your \
    question into smaller steps, look at the worked examples in your lecture, and ask me \
    again in a moment.";

fn tutor_prompt(grade: Option<&str>) -> String {
    let level = match grade {
        Some(g) if !g.trim().is_empty() => format!("a grade {} student", g.trim()),
        _ => "a school student".to_string(),
    };
    format!(
        "You are a patient, encouraging tutor for {}. Explain step by step with simple words \
         and short examples. Ask a follow-up question to check understanding. \
         Never just hand over homework answers.",
        level
    )
}

/// Continue a tutoring conversation. Client-supplied system turns are
/// discarded; the tutor persona is always set here.
pub async fn tutor_reply(
    backend: &dyn ChatBackend,
    grade: Option<&str>,
    history: &[ChatTurn],
) -> Generated<String> {
    let mut messages = vec![system(tutor_prompt(grade))];
    let conversation: Vec<&ChatTurn> =
        history.iter().filter(|t| t.role != ChatRole::System).collect();
    let skip = conversation.len().saturating_sub(MAX_HISTORY);
    messages.extend(conversation.into_iter().skip(skip).cloned());

    let request = CompletionRequest {
        messages,
        json_mode: false,
        temperature: Some(0.5),
    };

    match backend.complete(request).await {
        Ok(reply) => Generated::fresh(reply.trim().to_string()),
        Err(e) => {
            warn!("Tutor reply failed, using fallback: {}", e);
            Generated::fallback(FALLBACK_REPLY.to_string(), fallback_notice("tutor"))
        }
    }
}
