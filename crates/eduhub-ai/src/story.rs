use tracing::warn;

use eduhub_types::api::Generated;

use crate::client::{ChatBackend, CompletionRequest};
use crate::{fallback_notice, system, user};

pub async fn generate_story(
    backend: &dyn ChatBackend,
    topic: &str,
    grade: Option<&str>,
) -> Generated<String> {
    let audience = grade
        .filter(|g| !g.trim().is_empty())
        .map(|g| format!("grade {} students", g.trim()))
        .unwrap_or_else(|| "young students".to_string());

    let request = CompletionRequest {
        messages: vec![
            system(format!(
                "You write short, kind educational stories for {}. \
                 Keep it under 300 words, give it a title, and end with one sentence \
                 naming what was learned.",
                audience
            )),
            user(format!("Write a story that teaches: {}", topic)),
        ],
        json_mode: false,
        temperature: Some(0.9),
    };

    match backend.complete(request).await {
        Ok(story) => Generated::fresh(story.trim().to_string()),
        Err(e) => {
            warn!("Story generation for '{}' failed, using fallback: {}", topic, e);
            Generated::fallback(fallback_story(topic), fallback_notice("story generator"))
        }
    }
}

pub fn fallback_story(topic: &str) -> String {
    format!(
        "The Curious Explorer\n\n\
         Mira found an old notebook in the school library. On its first page someone \
         had written one word in big letters: {topic}. Every page after that was a \
         question. Mira read them with her friends, and for each question they searched \
         their books, asked their teacher, and tried small experiments of their own. By \
         the end of the week the notebook was full of answers in their handwriting.\n\n\
         What we learned: asking good questions is the first step to understanding \
         {topic}."
    )
}
