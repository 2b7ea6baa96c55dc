//! Emotion Parser (§4.6).
//!
//! `gglib-voice` has no emotion concept of its own. Grounded directly on
//! `jarvis/tts/emotion.py`: eight named presets, `[tag]`-delimited
//! segments, and a punctuation-based fallback for text that carries no
//! explicit tag.

use regex::Regex;
use std::sync::OnceLock;

use vocora_core::TtsParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Neutre,
    Joyeux,
    Triste,
    Surpris,
    Taquin,
    Serieux,
    Doux,
    Excite,
}

impl Emotion {
    const ALL: [Self; 8] = [
        Self::Neutre,
        Self::Joyeux,
        Self::Triste,
        Self::Surpris,
        Self::Taquin,
        Self::Serieux,
        Self::Doux,
        Self::Excite,
    ];

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Neutre => "neutre",
            Self::Joyeux => "joyeux",
            Self::Triste => "triste",
            Self::Surpris => "surpris",
            Self::Taquin => "taquin",
            Self::Serieux => "serieux",
            Self::Doux => "doux",
            Self::Excite => "excite",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.tag().eq_ignore_ascii_case(tag))
    }

    /// Generation parameters for this emotion, exactly matching the
    /// `EMOTION_PRESETS` table in the original.
    #[must_use]
    pub fn preset(self) -> TtsParams {
        let (exaggeration, cfg_weight, temperature) = match self {
            Self::Neutre => (0.45, 0.50, 0.80),
            Self::Joyeux => (0.85, 0.30, 0.90),
            Self::Triste => (0.35, 0.60, 0.70),
            Self::Surpris => (0.90, 0.25, 0.95),
            Self::Taquin => (0.75, 0.35, 0.90),
            Self::Serieux => (0.30, 0.65, 0.70),
            Self::Doux => (0.40, 0.45, 0.75),
            Self::Excite => (0.95, 0.20, 1.00),
        };
        TtsParams {
            exaggeration,
            cfg_weight,
            temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionSegment {
    pub text: String,
    pub emotion: Emotion,
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = Emotion::ALL.iter().map(|e| e.tag()).collect::<Vec<_>>().join("|");
        Regex::new(&format!(r"(?i)\[({alternation})\]")).expect("static pattern is valid")
    })
}

/// Split `text` into emotion-tagged segments. Text with no tags at all
/// becomes one segment whose emotion is guessed from punctuation.
#[must_use]
pub fn parse_emotion_tags(text: &str) -> Vec<EmotionSegment> {
    let re = tag_regex();
    let matches: Vec<_> = re.captures_iter(text).collect();

    if matches.is_empty() {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![EmotionSegment {
            text: trimmed.to_string(),
            emotion: detect_punctuation_emotion(trimmed),
        }];
    }

    let mut segments = Vec::new();
    let first_match = matches[0].get(0).expect("group 0 always present");
    let prefix = text[..first_match.start()].trim();
    if !prefix.is_empty() {
        segments.push(EmotionSegment {
            text: prefix.to_string(),
            emotion: detect_punctuation_emotion(prefix),
        });
    }

    for (i, m) in matches.iter().enumerate() {
        let whole = m.get(0).expect("group 0 always present");
        let emotion = Emotion::from_tag(
            m.get(1).expect("capture group 1 always present").as_str(),
        )
        .expect("regex alternation only matches known tags");
        let body_start = whole.end();
        let body_end = matches
            .get(i + 1)
            .map_or(text.len(), |next| next.get(0).expect("group 0 always present").start());
        let body = text[body_start..body_end].trim();
        if !body.is_empty() {
            segments.push(EmotionSegment {
                text: body.to_string(),
                emotion,
            });
        }
    }

    segments
}

/// Strip `[tag]` markers, leaving the plain text (used for the response
/// text surfaced over HTTP, which must not leak synthesis directives).
#[must_use]
pub fn strip_emotion_tags(text: &str) -> String {
    tag_regex().replace_all(text, "").trim().to_string()
}

fn detect_punctuation_emotion(text: &str) -> Emotion {
    let bangs = text.matches('!').count();
    let has_question = text.contains('?');
    if bangs >= 2 {
        Emotion::Excite
    } else if bangs >= 1 && has_question {
        Emotion::Surpris
    } else if bangs == 1 {
        Emotion::Joyeux
    } else {
        Emotion::Neutre
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_tag_falls_back_to_punctuation() {
        let segs = parse_emotion_tags("That's incredible!!");
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].emotion, Emotion::Excite);
    }

    #[test]
    fn single_exclamation_is_joyeux() {
        let segs = parse_emotion_tags("Great job!");
        assert_eq!(segs[0].emotion, Emotion::Joyeux);
    }

    #[test]
    fn exclamation_and_question_is_surpris() {
        let segs = parse_emotion_tags("Wait, really!?");
        assert_eq!(segs[0].emotion, Emotion::Surpris);
    }

    #[test]
    fn plain_text_is_neutre() {
        let segs = parse_emotion_tags("The meeting is at noon.");
        assert_eq!(segs[0].emotion, Emotion::Neutre);
    }

    #[test]
    fn tagged_segments_split_correctly() {
        let segs = parse_emotion_tags("[triste]I'm sorry to hear that.[joyeux]But good news too!");
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].emotion, Emotion::Triste);
        assert_eq!(segs[0].text, "I'm sorry to hear that.");
        assert_eq!(segs[1].emotion, Emotion::Joyeux);
        assert_eq!(segs[1].text, "But good news too!");
    }

    #[test]
    fn prefix_before_first_tag_is_kept() {
        let segs = parse_emotion_tags("Hmm. [serieux]Let's be careful here.");
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, "Hmm.");
        assert_eq!(segs[1].emotion, Emotion::Serieux);
    }

    #[test]
    fn strip_tags_removes_markers_only() {
        let stripped = strip_emotion_tags("[joyeux]Hello there![triste]Goodbye.");
        assert_eq!(stripped, "Hello there!Goodbye.");
    }

    #[test]
    fn empty_text_yields_no_segments() {
        assert!(parse_emotion_tags("   ").is_empty());
    }
}
