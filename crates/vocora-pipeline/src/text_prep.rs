//! Text Preparation (§4.9).
//!
//! Grounded on the original `jarvis/tts/text_prep.py`'s four-pass
//! pipeline (clean artifacts → normalize punctuation → add breath
//! pauses → normalize whitespace); the character-by-character stripping
//! helpers borrow `gglib-voice::text_utils`'s hand-rolled-loop style
//! (`strip_links`, `collapse_whitespace`) rather than reaching for regex
//! everywhere, since both sources favor that approach for simple
//! character substitutions.

use regex::Regex;
use std::sync::OnceLock;

/// Markdown/URL/artifact stripping, prosody punctuation normalization and
/// French breath-pause insertion, in that order — the exact order the
/// original applies them in.
#[must_use]
pub fn prepare_for_tts(text: &str) -> String {
    let text = clean_llm_artifacts(text);
    let text = normalize_punctuation_for_prosody(&text);
    let text = add_breath_pauses(&text);
    normalize_whitespace(&text)
}

fn clean_llm_artifacts(text: &str) -> String {
    let text = strip_markdown_links(text);
    let text = strip_bare_urls(&text);
    let text = text.replace("**", "").replace("__", "").replace('`', "");
    let text = strip_leading_list_dashes(&text);
    text.replace(['—', '–'], ",")
}

/// `[label](url)` → `label`.
fn strip_markdown_links(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '[' {
            let label: String = chars.by_ref().take_while(|&c| c != ']').collect();
            if chars.peek() == Some(&'(') {
                chars.next();
                let _url: String = chars.by_ref().take_while(|&c| c != ')').collect();
                result.push_str(&label);
                continue;
            }
            result.push('[');
            result.push_str(&label);
            result.push(']');
        } else {
            result.push(c);
        }
    }

    result
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("static pattern is valid"))
}

fn strip_bare_urls(text: &str) -> String {
    url_regex().replace_all(text, "").into_owned()
}

fn strip_leading_list_dashes(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let indent = &line[..line.len() - trimmed.len()];
            trimmed
                .strip_prefix("- ")
                .map_or_else(|| line.to_string(), |rest| format!("{indent}{rest}"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ellipsis/semicolon normalization for speech prosody: the Unicode
/// ellipsis glyph is folded to ASCII dots first, then every `...`
/// occurrence becomes a period if nothing but whitespace follows it (end
/// of the text) or a comma otherwise (mid-sentence trailing-off). `;` and
/// `:` always become `,` — TTS engines tend to read them as a full stop,
/// flattening the intended pause.
fn normalize_punctuation_for_prosody(text: &str) -> String {
    let text = text.replace('…', "...");
    let mut result = String::with_capacity(text.len());
    let mut rest = text.as_str();

    while let Some(pos) = rest.find("...") {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 3..];
        if after.trim().is_empty() {
            result.push('.');
        } else {
            result.push(',');
        }
        rest = after;
    }
    result.push_str(rest);

    result.replace([';', ':'], ",")
}

const BREATH_CONNECTORS: [&str; 16] = [
    "mais",
    "cependant",
    "toutefois",
    "néanmoins",
    "pourtant",
    "donc",
    "alors",
    "ensuite",
    "puis",
    "sinon",
    "d'ailleurs",
    "en fait",
    "parce que",
    "puisque",
    "car",
    "afin que",
];

const INTERJECTIONS: [&str; 15] = [
    "ah",
    "oh",
    "eh",
    "hmm",
    "bon",
    "ben",
    "bref",
    "enfin",
    "tiens",
    "bah",
    "euh",
    "hein",
    "allons",
    "voyons",
    "dis donc",
];

fn breath_before_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alt = BREATH_CONNECTORS.join("|");
        // "pour que" is intentionally listed alongside "afin que" in the
        // connector set but appears here separately to avoid the
        // alternation engine preferring the shorter "que"-less prefixes.
        Regex::new(&format!(r"([a-zàâäéèêëïîôöùûüç])(\s+)({alt}|pour que)\b"))
            .expect("static pattern is valid")
    })
}

fn interjection_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alt = INTERJECTIONS.join("|");
        Regex::new(&format!(r"(?i)\b(quand même|du coup|{alt})\b")).expect("static pattern is valid")
    })
}

/// Insert a breath-pause comma before a logical connector, and after an
/// interjection that isn't already followed by punctuation.
fn add_breath_pauses(text: &str) -> String {
    let with_connector_pauses = breath_before_regex().replace_all(text, "$1,$2$3");
    insert_after_interjections(&with_connector_pauses)
}

fn insert_after_interjections(text: &str) -> String {
    let re = interjection_regex();
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;

    for m in re.find_iter(text) {
        result.push_str(&text[last_end..m.end()]);
        let next_is_punct = text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| ",.!?;:".contains(c));
        if !next_is_punct {
            result.push(',');
        }
        last_end = m.end();
    }
    result.push_str(&text[last_end..]);
    result
}

fn normalize_whitespace(text: &str) -> String {
    let collapsed_commas = text.replace(",,", ",");
    let mut result = String::with_capacity(collapsed_commas.len());
    let mut prev_space = false;
    for c in collapsed_commas.chars() {
        if c.is_whitespace() {
            if !prev_space {
                result.push(' ');
                prev_space = true;
            }
        } else {
            result.push(c);
            prev_space = false;
        }
    }
    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_link() {
        let out = clean_llm_artifacts("Check [the docs](https://example.com/docs) first.");
        assert_eq!(out, "Check the docs first.");
    }

    #[test]
    fn strips_bare_url() {
        let out = clean_llm_artifacts("Visit https://example.com for more.");
        assert_eq!(out.trim(), "Visit  for more.".trim());
    }

    #[test]
    fn strips_bold_and_backticks() {
        let out = clean_llm_artifacts("This is **important** and `code`.");
        assert_eq!(out, "This is important and code.");
    }

    #[test]
    fn em_dash_becomes_comma() {
        let out = clean_llm_artifacts("Wait — no, that's wrong.");
        assert_eq!(out, "Wait , no, that's wrong.");
    }

    #[test]
    fn mid_text_ellipsis_becomes_comma() {
        let out = normalize_punctuation_for_prosody("Well... I suppose so.");
        assert_eq!(out, "Well, I suppose so.");
    }

    #[test]
    fn trailing_ellipsis_becomes_period() {
        let out = normalize_punctuation_for_prosody("I don't know...");
        assert_eq!(out, "I don't know.");
    }

    #[test]
    fn semicolon_becomes_comma() {
        let out = normalize_punctuation_for_prosody("First point; second point.");
        assert_eq!(out, "First point, second point.");
    }

    #[test]
    fn colon_becomes_comma() {
        let out = normalize_punctuation_for_prosody("One thing: it works.");
        assert_eq!(out, "One thing, it works.");
    }

    #[test]
    fn breath_pause_before_connector() {
        let out = add_breath_pauses("je suis fatigué mais je continue");
        assert_eq!(out, "je suis fatigué, mais je continue");
    }

    #[test]
    fn breath_pause_after_interjection_skipped_if_punctuated() {
        let out = add_breath_pauses("Ah, d'accord.");
        assert_eq!(out, "Ah, d'accord.");
    }

    #[test]
    fn breath_pause_after_interjection_inserted_when_missing() {
        let out = add_breath_pauses("Bon on y va");
        assert_eq!(out, "Bon, on y va");
    }

    #[test]
    fn full_pipeline_roundtrip() {
        let out = prepare_for_tts("**Important** cependant... [voir](https://x.test) — continuons.");
        assert_eq!(out, "Important, cependant, voir , continuons.");
    }
}
