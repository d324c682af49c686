//! Deterministic text cleaning applied to every extractor's raw output
//! before fingerprinting and chunking (§4.A "Cleaning rules").
//!
//! Each rule is a pure `&str -> String` step; `clean` composes them in
//! the order the spec lists them. `clean` is idempotent by construction
//! — none of the steps can produce output that a later pass of the same
//! step would further change (see the idempotence test below, which is
//! the property §8 calls out explicitly).

/// Curated OCR elision expansions (§4.A rule 5). A fixed table — adding
/// entries is meant to be a data change, not a code change, so this
/// stays a plain static slice rather than a config-loaded structure.
const ELISIONS: &[(&str, &str)] = &[
    ("isa", "is a"),
    ("hasa", "has a"),
    ("catof", "cat of"),
    ("andthe", "and the"),
    ("ofthe", "of the"),
    ("inthe", "in the"),
    ("tothe", "to the"),
    ("onthe", "on the"),
    ("forthe", "for the"),
    ("withthe", "with the"),
];

pub fn clean(raw: &str) -> String {
    let text = normalize_line_endings(raw);
    let text = rejoin_word_splits(&text);
    let text = space_after_punctuation(&text);
    let text = expand_elisions(&text);
    let text = collapse_blank_lines(&text);
    trim_blank_lines(&text)
}

/// Rule 1: normalize line endings to LF.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Rule 3: collapse an intra-paragraph newline (single LF between
/// non-empty, non-terminal lines) to a single space. Applied before
/// blank-line collapsing so a genuine paragraph break (a blank line)
/// is left alone.
fn rejoin_word_splits(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = String::with_capacity(text.len());
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line);
        let is_last = i + 1 == lines.len();
        if is_last {
            continue;
        }
        let next_is_blank = lines[i + 1].trim().is_empty();
        let this_is_blank = line.trim().is_empty();
        if this_is_blank || next_is_blank {
            out.push('\n');
        } else {
            out.push(' ');
        }
    }
    out
}

/// Rule 4: insert a space after `.`, `,`, or `;` immediately followed
/// by a letter — uppercase-only for `.`, any case for `,`/`;`.
fn space_after_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for i in 0..chars.len() {
        let c = chars[i];
        out.push(c);
        if i + 1 >= chars.len() {
            continue;
        }
        let next = chars[i + 1];
        let should_split = match c {
            '.' => next.is_alphabetic() && next.is_uppercase(),
            ',' | ';' => next.is_alphabetic(),
            _ => false,
        };
        if should_split {
            out.push(' ');
        }
    }
    out
}

/// Rule 5: expand curated OCR elisions. Matched as whole whitespace-delimited words.
fn expand_elisions(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let (prefix, core, suffix) = split_word_punctuation(word);
            let expanded = ELISIONS
                .iter()
                .find(|(from, _)| *from == core)
                .map(|(_, to)| *to)
                .unwrap_or(core);
            format!("{prefix}{expanded}{suffix}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a word into (leading non-alphanumeric, alphanumeric core, trailing non-alphanumeric)
/// so elision lookups ignore surrounding punctuation.
fn split_word_punctuation(word: &str) -> (&str, &str, &str) {
    let start = word.find(|c: char| c.is_alphanumeric()).unwrap_or(word.len());
    let end = word.rfind(|c: char| c.is_alphanumeric()).map(|i| i + 1).unwrap_or(start);
    (&word[..start], &word[start..end], &word[end..])
}

/// Rule 2: collapse runs of ≥2 consecutive blank lines to exactly one.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.pop(); // drop the trailing newline the loop always adds
    out
}

/// Rule 6: strip trailing whitespace per line; trim leading/trailing blank lines.
fn trim_blank_lines(text: &str) -> String {
    let trimmed_lines: Vec<&str> = text.split('\n').map(|l| l.trim_end()).collect();
    let start = trimmed_lines.iter().position(|l| !l.is_empty()).unwrap_or(trimmed_lines.len());
    let end = trimmed_lines.iter().rposition(|l| !l.is_empty()).map(|i| i + 1).unwrap_or(start);
    trimmed_lines[start..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_crlf_to_lf() {
        assert_eq!(clean("a\r\nb"), "a b");
    }

    #[test]
    fn collapses_multiple_blank_lines() {
        let input = "para one\n\n\n\npara two";
        assert_eq!(clean(input), "para one\n\npara two");
    }

    #[test]
    fn rejoins_ocr_word_split() {
        assert_eq!(clean("This is one\nsentence."), "This is one sentence.");
    }

    #[test]
    fn preserves_paragraph_breaks() {
        let input = "First paragraph.\n\nSecond paragraph.";
        assert_eq!(clean(input), "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn inserts_space_after_period_before_uppercase() {
        assert_eq!(clean("India.It rained."), "India. It rained.");
    }

    #[test]
    fn does_not_split_period_before_lowercase() {
        assert_eq!(clean("e.g.to clarify"), "e.g.to clarify");
    }

    #[test]
    fn inserts_space_after_comma_any_case() {
        assert_eq!(clean("red,green,blue"), "red, green, blue");
    }

    #[test]
    fn expands_known_elision() {
        assert_eq!(clean("This isa test"), "This is a test");
    }

    #[test]
    fn trims_leading_and_trailing_blank_lines() {
        assert_eq!(clean("\n\n  content  \n\n"), "content");
    }

    #[test]
    fn is_idempotent() {
        let input = "India.It\r\n\n\n\nhasa  \n\ncatof  problems\n\n\n";
        let once = clean(input);
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_cleans_to_empty() {
        assert_eq!(clean(""), "");
    }
}
