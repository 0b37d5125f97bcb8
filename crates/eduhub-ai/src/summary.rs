//! Voice summarizer: condenses a spoken-lecture transcript.

use tracing::warn;

use eduhub_types::api::Generated;

use crate::client::{ChatBackend, CompletionRequest};
use crate::{fallback_notice, system, user};

pub const EMPTY_TRANSCRIPT: &str = "Nothing to summarize.";

const SUMMARY_SENTENCES: usize = 3;

pub async fn summarize(backend: &dyn ChatBackend, transcript: &str) -> Generated<String> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Generated::fresh(EMPTY_TRANSCRIPT.to_string());
    }

    let request = CompletionRequest {
        messages: vec![
            system(
                "Summarize this lecture transcript for a student in at most five short \
                 bullet points. Keep key terms, drop filler words.",
            ),
            user(transcript),
        ],
        json_mode: false,
        temperature: Some(0.3),
    };

    match backend.complete(request).await {
        Ok(summary) => Generated::fresh(summary.trim().to_string()),
        Err(e) => {
            warn!("Summary failed, using extractive fallback: {}", e);
            Generated::fallback(extractive_summary(transcript), fallback_notice("summarizer"))
        }
    }
}

/// First three sentences of the transcript.
pub fn extractive_summary(transcript: &str) -> String {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, ch) in transcript.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let end = i + ch.len_utf8();
            let sentence = transcript[start..end].trim();
            if has_words(sentence) {
                sentences.push(sentence);
            }
            start = end;
            if sentences.len() == SUMMARY_SENTENCES {
                break;
            }
        }
    }

    if sentences.len() < SUMMARY_SENTENCES {
        let rest = transcript[start..].trim();
        if has_words(rest) {
            sentences.push(rest);
        }
    }

    if sentences.is_empty() {
        EMPTY_TRANSCRIPT.to_string()
    } else {
        sentences.join(" ")
    }
}

fn has_words(s: &str) -> bool {
    s.chars().any(char::is_alphanumeric)
}
