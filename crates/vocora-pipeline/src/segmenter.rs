//! Sentence Segmenter (§4.5).
//!
//! `gglib-voice::text_utils::split_into_chunks` is batch-oriented: it
//! receives the whole response text up front and splits it for TTS chunk
//! size. This module has a different job — it receives an LLM token
//! stream one fragment at a time and must decide, incrementally, when
//! enough text has accumulated to start synthesizing — so the algorithm
//! here is new. Only the terminator-set idea and the "split at clause
//! punctuation when a sentence runs long" idea are carried over from
//! `split_sentences`/`split_long_sentence`.
//!
//! Two split policies, tried in order on every `push`:
//! 1. Primary: split right after the *last* `.`, `!`, `?`, `…` or `\n` in
//!    the buffer — standard sentence boundaries. A `.` flanked by digits
//!    on both sides (a decimal point) does not count.
//! 2. Early: if no primary terminator has appeared yet but the buffer has
//!    grown past `EARLY_MIN_BUFFER_CHARS` characters, split at the *last*
//!    `,` or `;` that comes after character position
//!    `EARLY_MIN_SPLIT_CHAR_POS` — lets TTS start on a long clause instead
//!    of waiting for the whole sentence to stream in.

const PRIMARY_TERMINATORS: [char; 5] = ['.', '!', '?', '…', '\n'];
const EARLY_TERMINATORS: [char; 2] = [',', ';'];
const EARLY_MIN_BUFFER_CHARS: usize = 60;
const EARLY_MIN_SPLIT_CHAR_POS: usize = 20;

/// Streaming rolling-buffer segmenter. One instance per response turn.
#[derive(Debug, Default)]
pub struct SentenceSegmenter {
    buffer: String,
}

impl SentenceSegmenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a streamed fragment; returns zero or more complete sentences
    /// now ready to hand to the segmenter's downstream consumer.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);
        let mut out = Vec::new();
        while let Some(end) = self.find_split_point() {
            let piece: String = self.buffer.drain(..end).collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
        out
    }

    /// Flush whatever remains at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        let trimmed = self.buffer.trim().to_string();
        self.buffer.clear();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    fn find_split_point(&self) -> Option<usize> {
        let last_primary = self
            .buffer
            .char_indices()
            .filter(|(byte_idx, c)| PRIMARY_TERMINATORS.contains(c) && !self.is_decimal_point(*byte_idx, *c))
            .last();
        if let Some((byte_idx, c)) = last_primary {
            return Some(byte_idx + c.len_utf8());
        }

        if self.buffer.chars().count() < EARLY_MIN_BUFFER_CHARS {
            return None;
        }

        let last_early = self
            .buffer
            .char_indices()
            .enumerate()
            .filter(|(char_pos, (_, c))| *char_pos >= EARLY_MIN_SPLIT_CHAR_POS && EARLY_TERMINATORS.contains(c))
            .last();
        last_early.map(|(_, (byte_idx, c))| byte_idx + c.len_utf8())
    }

    /// `.` between two digits is a decimal point, not a sentence
    /// terminator — e.g. "3.5 dollars" must not split after the "3.".
    fn is_decimal_point(&self, byte_idx: usize, c: char) -> bool {
        if c != '.' {
            return false;
        }
        let before_is_digit = self.buffer[..byte_idx].chars().next_back().is_some_and(|p| p.is_ascii_digit());
        let after_is_digit = self.buffer[byte_idx + c.len_utf8()..].chars().next().is_some_and(|n| n.is_ascii_digit());
        before_is_digit && after_is_digit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_period_as_it_arrives() {
        let mut seg = SentenceSegmenter::new();
        assert!(seg.push("Hello there").is_empty());
        let out = seg.push(". How are you");
        assert_eq!(out, vec!["Hello there."]);
    }

    #[test]
    fn does_not_split_mid_token() {
        let mut seg = SentenceSegmenter::new();
        assert!(seg.push("It costs 3").is_empty());
        assert!(seg.push(".5 dollars").is_empty());
        let out = seg.push(" today.");
        assert_eq!(out, vec!["It costs 3.5 dollars today."]);
    }

    #[test]
    fn early_split_on_long_clause() {
        let mut seg = SentenceSegmenter::new();
        let long_clause = "this is a rather long introductory clause that keeps going";
        assert!(long_clause.len() >= EARLY_MIN_BUFFER_CHARS);
        let out = seg.push(&format!("{long_clause}, and then it continues"));
        assert_eq!(out, vec![format!("{long_clause},")]);
    }

    #[test]
    fn short_clause_does_not_early_split() {
        let mut seg = SentenceSegmenter::new();
        let out = seg.push("Yes, I agree");
        assert!(out.is_empty());
    }

    #[test]
    fn finish_flushes_remainder() {
        let mut seg = SentenceSegmenter::new();
        seg.push("no terminator here");
        assert_eq!(seg.finish(), Some("no terminator here".to_string()));
        assert_eq!(seg.finish(), None);
    }

    #[test]
    fn newline_is_a_primary_terminator() {
        let mut seg = SentenceSegmenter::new();
        let out = seg.push("line one\nline two");
        assert_eq!(out, vec!["line one"]);
    }

    #[test]
    fn primary_split_uses_last_terminator_not_first() {
        let mut seg = SentenceSegmenter::new();
        let out = seg.push("Wait. Really? Yes! more text");
        assert_eq!(out, vec!["Wait. Really? Yes!"]);
    }

    #[test]
    fn early_split_uses_last_comma_not_first() {
        let mut seg = SentenceSegmenter::new();
        let clause = "this is a rather long clause, with one comma, and another one, trailing";
        assert!(clause.len() >= EARLY_MIN_BUFFER_CHARS);
        let out = seg.push(clause);
        assert_eq!(
            out,
            vec!["this is a rather long clause, with one comma, and another one,"]
        );
    }
}
