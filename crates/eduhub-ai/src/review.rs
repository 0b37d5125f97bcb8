//! Performance review written from a student's quiz history.

use tracing::warn;

use eduhub_types::api::Generated;
use eduhub_types::models::TestResult;

use crate::client::{ChatBackend, CompletionRequest};
use crate::{fallback_notice, system, user};

pub const NO_RESULTS: &str = "No quiz results yet. Take a quiz battle to get your first review!";

pub fn average_percentage(results: &[TestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(TestResult::percentage).sum::<f64>() / results.len() as f64
}

pub async fn performance_review(
    backend: &dyn ChatBackend,
    results: &[TestResult],
) -> Generated<String> {
    if results.is_empty() {
        return Generated::fresh(NO_RESULTS.to_string());
    }

    let lines: Vec<String> = results
        .iter()
        .map(|r| format!("- {}: {}/{}", r.topic, r.score, r.total))
        .collect();

    let request = CompletionRequest {
        messages: vec![
            system(
                "You are a supportive teacher. Write a short performance review \
                 (under 150 words) for a student from their quiz scores: one strength, \
                 one area to improve, one next step.",
            ),
            user(format!("Quiz results:\n{}", lines.join("\n"))),
        ],
        json_mode: false,
        temperature: Some(0.4),
    };

    match backend.complete(request).await {
        Ok(review) => Generated::fresh(review.trim().to_string()),
        Err(e) => {
            warn!("Performance review failed, using fallback: {}", e);
            Generated::fallback(fallback_review(results), fallback_notice("performance review"))
        }
    }
}

pub fn fallback_review(results: &[TestResult]) -> String {
    let average = average_percentage(results);
    let verdict = if average >= 80.0 {
        "Excellent work! You are mastering your topics. Try a harder quiz battle next."
    } else if average >= 50.0 {
        "Good progress. Review the questions you missed and retake those topics."
    } else {
        "Keep practicing. Rewatch the lectures for these topics and ask the tutor for help."
    };
    format!("Average score {:.0}% across {} quizzes. {}", average, results.len(), verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingBackend, ScriptedBackend};
    use chrono::Utc;
    use uuid::Uuid;

    fn result(score: u32, total: u32) -> TestResult {
        TestResult {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            topic: "decimals".into(),
            score,
            total,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn no_results_skips_the_endpoint() {
        let backend = ScriptedBackend::new("unused");
        let review = performance_review(&backend, &[]).await;
        assert_eq!(review.value, NO_RESULTS);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn fallback_reports_the_average() {
        let review = performance_review(&FailingBackend, &[result(4, 5), result(2, 5)]).await;
        assert!(review.fallback);
        assert!(review.value.starts_with("Average score 60% across 2 quizzes."));
        assert!(review.value.contains("Good progress"));
    }

    #[tokio::test]
    async fn scores_are_sent_to_the_endpoint() {
        let backend = ScriptedBackend::new("Great job on decimals.");
        performance_review(&backend, &[result(5, 5)]).await;
        let requests = backend.requests.lock().unwrap();
        let sent = &requests[0].messages;
        assert!(sent[1].content.contains("decimals: 5/5"));
    }
}
