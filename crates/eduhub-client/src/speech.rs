//! Read-aloud playback over a platform speech engine.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47 tag, e.g. `en-US`.
    pub lang: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Any,
    Female,
    Male,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
}

/// The platform text-to-speech engine. One utterance plays at a time.
pub trait SpeechEngine {
    fn voices(&self) -> Vec<Voice>;
    fn speak(&mut self, utterance: Utterance);
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
    /// True while an utterance is loaded, paused or not.
    fn is_speaking(&self) -> bool;
    fn is_paused(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

const FEMALE_HINTS: &[&str] = &[
    "samantha", "zira", "victoria", "karen", "susan", "hazel", "female",
];
const MALE_HINTS: &[&str] = &["david", "daniel", "alex", "fred", "mark", "george", "male"];

fn matches_gender(voice: &Voice, gender: VoiceGender) -> bool {
    let name = voice.name.to_lowercase();
    match gender {
        VoiceGender::Any => true,
        // "female" contains "male", so rule it out first
        VoiceGender::Male => {
            !FEMALE_HINTS.iter().any(|h| name.contains(h))
                && MALE_HINTS.iter().any(|h| name.contains(h))
        }
        VoiceGender::Female => FEMALE_HINTS.iter().any(|h| name.contains(h)),
    }
}

/// Pick a voice for `lang`. A bare language (`en`) matches any region
/// (`en-GB`). Falls back to the first voice in the language, then to the
/// first voice at all.
pub fn select_voice<'a>(voices: &'a [Voice], lang: &str, gender: VoiceGender) -> Option<&'a Voice> {
    let lang = lang.to_lowercase();
    let in_lang: Vec<&Voice> = voices
        .iter()
        .filter(|v| v.lang.to_lowercase().starts_with(&lang))
        .collect();

    in_lang
        .iter()
        .find(|v| matches_gender(v, gender))
        .or_else(|| in_lang.first())
        .copied()
        .or_else(|| voices.first())
}

pub struct SpeechPlayer<E: SpeechEngine> {
    engine: E,
    state: PlaybackState,
    pub lang: String,
    pub gender: VoiceGender,
    pub rate: f32,
    pub pitch: f32,
}

impl<E: SpeechEngine> SpeechPlayer<E> {
    pub fn new(engine: E, lang: &str) -> Self {
        Self {
            engine,
            state: PlaybackState::Idle,
            lang: lang.to_string(),
            gender: VoiceGender::Any,
            rate: 1.0,
            pitch: 1.0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Play/pause button. A paused utterance resumes where it stopped; a
    /// playing one pauses; otherwise `text` starts from the top.
    pub fn toggle(&mut self, text: &str) -> PlaybackState {
        if self.engine.is_paused() {
            self.engine.resume();
            self.state = PlaybackState::Speaking;
        } else if self.engine.is_speaking() {
            self.engine.pause();
            self.state = PlaybackState::Paused;
        } else {
            self.start(text);
        }
        self.state
    }

    pub fn stop(&mut self) {
        self.engine.cancel();
        self.state = PlaybackState::Idle;
    }

    /// Engine end-of-utterance callback.
    pub fn finished(&mut self) {
        self.state = PlaybackState::Idle;
    }

    fn start(&mut self, text: &str) {
        // Clear anything stale left in the engine
        self.engine.cancel();

        let text = text.trim();
        if text.is_empty() {
            self.state = PlaybackState::Idle;
            return;
        }

        let voices = self.engine.voices();
        let voice = select_voice(&voices, &self.lang, self.gender).cloned();
        debug!("Speaking {} chars with voice {:?}", text.len(), voice.as_ref().map(|v| &v.name));

        self.engine.speak(Utterance {
            text: text.to_string(),
            lang: self.lang.clone(),
            voice,
            rate: self.rate,
            pitch: self.pitch,
        });
        self.state = PlaybackState::Speaking;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingEngine {
        calls: Vec<&'static str>,
        spoken: Vec<Utterance>,
        speaking: bool,
        paused: bool,
        voices: Vec<Voice>,
    }

    impl SpeechEngine for RecordingEngine {
        fn voices(&self) -> Vec<Voice> {
            self.voices.clone()
        }

        fn speak(&mut self, utterance: Utterance) {
            self.calls.push("speak");
            self.spoken.push(utterance);
            self.speaking = true;
            self.paused = false;
        }

        fn pause(&mut self) {
            self.calls.push("pause");
            self.paused = true;
        }

        fn resume(&mut self) {
            self.calls.push("resume");
            self.paused = false;
        }

        fn cancel(&mut self) {
            self.calls.push("cancel");
            self.speaking = false;
            self.paused = false;
        }

        fn is_speaking(&self) -> bool {
            self.speaking
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    }

    fn voice(name: &str, lang: &str) -> Voice {
        Voice {
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }

    #[test]
    fn toggle_pauses_and_resumes_without_resynthesis() {
        let mut player = SpeechPlayer::new(RecordingEngine::default(), "en");

        assert_eq!(player.toggle("Plants make food from light."), PlaybackState::Speaking);
        assert_eq!(player.engine().calls, vec!["cancel", "speak"]);

        assert_eq!(player.toggle("Plants make food from light."), PlaybackState::Paused);
        assert_eq!(player.engine().calls.last(), Some(&"pause"));

        assert_eq!(player.toggle("Plants make food from light."), PlaybackState::Speaking);
        assert_eq!(player.engine().calls, vec!["cancel", "speak", "pause", "resume"]);
        assert_eq!(player.engine().spoken.len(), 1);
    }

    #[test]
    fn toggle_after_finish_starts_fresh() {
        let mut player = SpeechPlayer::new(RecordingEngine::default(), "en");
        player.toggle("First");
        player.engine.speaking = false;
        player.finished();
        assert_eq!(player.state(), PlaybackState::Idle);

        player.toggle("Second");
        assert_eq!(player.engine().spoken.len(), 2);
        assert_eq!(player.engine().spoken[1].text, "Second");
    }

    #[test]
    fn stop_cancels_and_idles() {
        let mut player = SpeechPlayer::new(RecordingEngine::default(), "en");
        player.toggle("Hello");
        player.stop();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.engine().calls.last(), Some(&"cancel"));
        assert!(!player.engine().is_speaking());
    }

    #[test]
    fn blank_text_does_not_speak() {
        let mut player = SpeechPlayer::new(RecordingEngine::default(), "en");
        assert_eq!(player.toggle("   "), PlaybackState::Idle);
        assert!(player.engine().spoken.is_empty());
    }

    #[test]
    fn voice_selection_prefers_language_then_gender() {
        let voices = vec![
            voice("Google Deutsch", "de-DE"),
            voice("Microsoft David", "en-US"),
            voice("Samantha", "en-US"),
            voice("Thomas", "fr-FR"),
        ];

        assert_eq!(select_voice(&voices, "en", VoiceGender::Female).unwrap().name, "Samantha");
        let male = select_voice(&voices, "en-us", VoiceGender::Male).unwrap();
        assert_eq!(male.name, "Microsoft David");
        assert_eq!(select_voice(&voices, "fr", VoiceGender::Female).unwrap().name, "Thomas");
        assert_eq!(select_voice(&voices, "sw", VoiceGender::Any).unwrap().name, "Google Deutsch");
        assert!(select_voice(&[], "en", VoiceGender::Any).is_none());
    }

    #[test]
    fn female_voice_is_not_taken_for_male() {
        let voices = vec![voice("English Female", "en-GB"), voice("English Male", "en-GB")];
        assert_eq!(select_voice(&voices, "en", VoiceGender::Male).unwrap().name, "English Male");
    }

    #[test]
    fn utterance_carries_player_settings() {
        let engine = RecordingEngine {
            voices: vec![voice("Karen", "en-AU")],
            ..Default::default()
        };
        let mut player = SpeechPlayer::new(engine, "en");
        player.rate = 0.9;
        player.gender = VoiceGender::Female;
        player.toggle("G'day");
        let utterance = &player.engine().spoken[0];
        assert_eq!(utterance.voice.as_ref().unwrap().name, "Karen");
        assert_eq!(utterance.rate, 0.9);
        assert_eq!(utterance.lang, "en");
    }
}
