//! Text cleanup and segmentation for text-to-speech.
//!
//! Generated text arrives with markdown and stray markup; voices read that
//! out literally. `sanitize` strips it, `chunk` cuts the result into
//! segments no longer than the renderer's limit. Lengths are in characters.

use std::sync::LazyLock;

use regex::Regex;

static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```|`[^`]*`").expect("valid code regex"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\*\*|\*|__|~~|`){1,3}").expect("valid emphasis regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid link regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("valid heading regex"));
static TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("valid trailing-space regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));
static HSPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid space regex"));
static COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s+").expect("valid comma regex"));

/// Strip markup and normalize whitespace.
pub fn sanitize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let s = CODE.replace_all(text, "");
    let s = LINK.replace_all(&s, "$1");
    let s = EMPHASIS.replace_all(&s, "");
    let s = TAG.replace_all(&s, "");
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let s: String = s
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect();
    let s = HEADING.replace_all(&s, "");
    let s = TRAILING_SPACE.replace_all(&s, "");
    let s = BLANK_LINES.replace_all(&s, "\n\n");
    let s = HSPACE.replace_all(&s, " ");
    s.trim().to_string()
}

/// Sanitize, then split into segments of at most `max_len` characters.
///
/// Lines split first, then sentences (`.`, `!` or `?` followed by
/// whitespace). An over-long sentence is packed greedily at comma
/// boundaries, and any piece still too long is cut at `max_len`.
pub fn chunk(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let text = sanitize(text);
    let mut chunks = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for sentence in split_sentences(line) {
            if char_len(sentence) <= max_len {
                chunks.push(sentence.to_string());
            } else {
                for packed in pack_at_commas(sentence, max_len) {
                    hard_slice(&packed, max_len, &mut chunks);
                }
            }
        }
    }

    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_i, next_c)) = chars.peek() else {
            break;
        };
        if next_c.is_whitespace() {
            let sentence = paragraph[start..i + c.len_utf8()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = next_i;
        }
    }

    let rest = paragraph[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

fn pack_at_commas(sentence: &str, max_len: usize) -> Vec<String> {
    let mut packed = Vec::new();
    let mut buf: Option<String> = None;

    for part in COMMA.split(sentence) {
        buf = Some(match buf.take() {
            None => part.to_string(),
            Some(mut current) if char_len(&current) + 2 + char_len(part) <= max_len => {
                current.push_str(", ");
                current.push_str(part);
                current
            }
            Some(current) => {
                packed.push(current);
                part.to_string()
            }
        });
    }
    packed.extend(buf);
    packed
}

fn hard_slice(piece: &str, max_len: usize, out: &mut Vec<String>) {
    let piece = piece.trim();
    if piece.is_empty() {
        return;
    }
    if char_len(piece) <= max_len {
        out.push(piece.to_string());
        return;
    }
    let chars: Vec<char> = piece.chars().collect();
    for window in chars.chunks(max_len) {
        let slice: String = window.iter().collect();
        let slice = slice.trim();
        if !slice.is_empty() {
            out.push(slice.to_string());
        }
    }
}
