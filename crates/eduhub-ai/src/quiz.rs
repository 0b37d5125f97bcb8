//! Quiz battles: question generation under a strict response contract, and
//! head-to-head scoring.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use eduhub_types::api::{BattleOutcome, BattleWinner, Generated};
use eduhub_types::models::QuizQuestion;

use crate::client::{ChatBackend, CompletionRequest};
use crate::error::{AiError, AiResult};
use crate::{fallback_notice, system, user};

pub const QUIZ_LENGTH: usize = 5;
pub const OPTION_COUNT: usize = 4;

const QUIZ_PROMPT: &str = "You write multiple-choice quizzes for school students. \
    Reply with a JSON object only, shaped exactly like \
    {\"questions\": [{\"question\": string, \"options\": [4 strings], \
    \"answer_index\": 0-3, \"explanation\": string}]} \
    with exactly 5 questions. No other keys, no prose.";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct QuizPayload {
    questions: Vec<QuizQuestion>,
}

fn quiz_schema() -> Value {
    json!({
        "type": "object",
        "required": ["questions"],
        "additionalProperties": false,
        "properties": {
            "questions": {
                "type": "array",
                "minItems": QUIZ_LENGTH,
                "maxItems": QUIZ_LENGTH,
                "items": {
                    "type": "object",
                    "required": ["question", "options", "answer_index"],
                    "additionalProperties": false,
                    "properties": {
                        "question": { "type": "string", "minLength": 1 },
                        "options": {
                            "type": "array",
                            "minItems": OPTION_COUNT,
                            "maxItems": OPTION_COUNT,
                            "items": { "type": "string", "minLength": 1 }
                        },
                        "answer_index": {
                            "type": "integer",
                            "minimum": 0,
                            "maximum": OPTION_COUNT - 1
                        },
                        "explanation": { "type": "string" }
                    }
                }
            }
        }
    })
}

/// Parse and validate the endpoint's reply. Anything that is not exactly the
/// contracted object is rejected; free text is never scraped for JSON.
pub fn parse_quiz(content: &str) -> AiResult<Vec<QuizQuestion>> {
    let value: Value = serde_json::from_str(content.trim())?;

    let validator =
        jsonschema::validator_for(&quiz_schema()).map_err(|e| AiError::Schema(e.to_string()))?;
    if let Err(e) = validator.validate(&value) {
        return Err(AiError::Schema(e.to_string()));
    }

    let payload: QuizPayload = serde_json::from_value(value)?;

    // minLength lets whitespace through
    let blank = payload
        .questions
        .iter()
        .any(|q| q.question.trim().is_empty() || q.options.iter().any(|o| o.trim().is_empty()));
    if blank {
        return Err(AiError::Schema("blank question or option".into()));
    }

    Ok(payload.questions)
}

pub async fn generate_quiz(backend: &dyn ChatBackend, topic: &str) -> Generated<Vec<QuizQuestion>> {
    let request = CompletionRequest {
        messages: vec![system(QUIZ_PROMPT), user(format!("Topic: {}", topic))],
        json_mode: true,
        temperature: Some(0.7),
    };

    let result = match backend.complete(request).await {
        Ok(content) => parse_quiz(&content),
        Err(e) => Err(e),
    };

    match result {
        Ok(questions) => Generated::fresh(questions),
        Err(e) => {
            warn!("Quiz generation for '{}' failed, using fallback: {}", topic, e);
            Generated::fallback(fallback_quiz(topic), fallback_notice("quiz generator"))
        }
    }
}

/// Five study-skill questions that all name the requested topic.
pub fn fallback_quiz(topic: &str) -> Vec<QuizQuestion> {
    let q = |question: String, options: [&str; 4], answer_index: usize, explanation: &str| {
        QuizQuestion {
            question,
            options: options.iter().map(|o| o.to_string()).collect(),
            answer_index,
            explanation: Some(explanation.to_string()),
        }
    };

    vec![
        q(
            format!("What is a good first step when you start learning about {}?", topic),
            [
                "Skim the key words and big ideas",
                "Memorize every detail at once",
                "Skip straight to the test",
                "Ignore the examples",
            ],
            0,
            "Getting the big picture first makes the details easier to place.",
        ),
        q(
            format!("Which habit helps you remember what you learned about {}?", topic),
            [
                "Never reviewing it",
                "Explaining it to a friend in your own words",
                "Reading it only once",
                "Studying only the night before",
            ],
            1,
            "Teaching an idea to someone else shows what you really understand.",
        ),
        q(
            format!("A question about {} feels too hard. What should you try?", topic),
            [
                "Give up on it",
                "Guess without reading it",
                "Break it into smaller parts",
                "Copy a classmate's answer",
            ],
            2,
            "Small steps turn a hard problem into several easy ones.",
        ),
        q(
            format!("Where can you find reliable information about {}?", topic),
            [
                "Rumours from strangers",
                "Unsigned posts online",
                "Made-up stories",
                "Your textbook and your teacher",
            ],
            3,
            "Checked sources are more trustworthy than anonymous ones.",
        ),
        q(
            format!("Why is it useful to connect {} to everyday life?", topic),
            [
                "It makes the ideas easier to understand and remember",
                "It makes the topic more confusing",
                "It is never useful",
                "It replaces the need to practice",
            ],
            0,
            "Real examples give new ideas something familiar to hold on to.",
        ),
    ]
}

/// Score two answer sheets against the same questions. Missing answers count
/// as wrong.
pub fn score_battle(
    questions: &[QuizQuestion],
    player_one: &[usize],
    player_two: &[usize],
) -> BattleOutcome {
    let score = |answers: &[usize]| -> u32 {
        questions
            .iter()
            .zip(answers)
            .filter(|(q, a)| q.answer_index == **a)
            .count() as u32
    };

    let player_one_score = score(player_one);
    let player_two_score = score(player_two);
    let winner = match player_one_score.cmp(&player_two_score) {
        std::cmp::Ordering::Greater => BattleWinner::PlayerOne,
        std::cmp::Ordering::Less => BattleWinner::PlayerTwo,
        std::cmp::Ordering::Equal => BattleWinner::Draw,
    };

    BattleOutcome {
        player_one_score,
        player_two_score,
        total: questions.len() as u32,
        winner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingBackend, ScriptedBackend};

    fn valid_reply() -> String {
        let questions: Vec<Value> = (0..QUIZ_LENGTH)
            .map(|i| {
                json!({
                    "question": format!("Question {}", i),
                    "options": ["a", "b", "c", "d"],
                    "answer_index": i % OPTION_COUNT,
                })
            })
            .collect();
        json!({ "questions": questions }).to_string()
    }

    #[tokio::test]
    async fn failed_call_yields_five_questions_about_the_topic() {
        let quiz = generate_quiz(&FailingBackend, "the water cycle").await;
        assert!(quiz.fallback);
        assert!(quiz.notice.is_some());
        assert_eq!(quiz.value.len(), 5);
        for question in &quiz.value {
            assert!(question.question.contains("the water cycle"), "{}", question.question);
            assert_eq!(question.options.len(), OPTION_COUNT);
            assert!(question.answer_index < OPTION_COUNT);
        }
    }

    #[tokio::test]
    async fn valid_reply_is_used_as_is() {
        let backend = ScriptedBackend::new(valid_reply());
        let quiz = generate_quiz(&backend, "magnets").await;
        assert!(!quiz.fallback);
        assert_eq!(quiz.value[0].question, "Question 0");
        assert_eq!(backend.calls(), 1);
        assert!(backend.requests.lock().unwrap()[0].json_mode);
    }

    #[tokio::test]
    async fn prose_wrapped_json_is_rejected() {
        let reply = format!("Sure! Here is your quiz:\n{}", valid_reply());
        let quiz = generate_quiz(&ScriptedBackend::new(reply), "magnets").await;
        assert!(quiz.fallback);
        assert!(quiz.value.iter().all(|q| q.question.contains("magnets")));
    }

    #[test]
    fn schema_rejects_wrong_shapes() {
        // four questions
        let mut short: Value = serde_json::from_str(&valid_reply()).unwrap();
        short["questions"].as_array_mut().unwrap().pop();
        assert!(matches!(parse_quiz(&short.to_string()), Err(AiError::Schema(_))));

        // answer out of range
        let mut bad_answer: Value = serde_json::from_str(&valid_reply()).unwrap();
        bad_answer["questions"][2]["answer_index"] = json!(4);
        assert!(matches!(parse_quiz(&bad_answer.to_string()), Err(AiError::Schema(_))));

        // extra key
        let mut extra: Value = serde_json::from_str(&valid_reply()).unwrap();
        extra["questions"][0]["hint"] = json!("look up");
        assert!(matches!(parse_quiz(&extra.to_string()), Err(AiError::Schema(_))));

        // whitespace option
        let mut blank: Value = serde_json::from_str(&valid_reply()).unwrap();
        blank["questions"][1]["options"][0] = json!("  ");
        assert!(matches!(parse_quiz(&blank.to_string()), Err(AiError::Schema(_))));

        assert!(matches!(parse_quiz("not json"), Err(AiError::Json(_))));
    }

    #[test]
    fn battle_scoring_picks_a_winner() {
        let questions = fallback_quiz("plants");
        let correct: Vec<usize> = questions.iter().map(|q| q.answer_index).collect();

        let outcome = score_battle(&questions, &correct, &[0, 0]);
        assert_eq!(outcome.player_one_score, 5);
        assert_eq!(outcome.player_two_score, 1);
        assert_eq!(outcome.total, 5);
        assert_eq!(outcome.winner, BattleWinner::PlayerOne);

        let draw = score_battle(&questions, &[], &[]);
        assert_eq!(draw.winner, BattleWinner::Draw);
    }
}
