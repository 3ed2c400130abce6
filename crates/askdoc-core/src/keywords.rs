//! Keyword extraction for mixed CJK/Latin text.
//!
//! This is an approximation, not a linguistic tokenizer: configured domain
//! phrases are matched first, then punctuation-split fragments yield
//! contiguous CJK runs (2–8 characters) and Latin runs (≥2 letters) as
//! substitute "words" for a script with no inter-word spacing. Stop words
//! are dropped and the first occurrence of each term wins.

use std::collections::HashSet;

/// Domain phrases recorded ahead of run-derived terms. Matched literally
/// against lowercased text, so entries must be lowercase.
const DEFAULT_PHRASES: &[&str] = &[
    "银河麒麟操作系统",
    "银河麒麟系统",
    "麒麟操作系统",
    "麒麟系统",
    "操作系统",
    "安全性",
    "安全特点",
    "安全特征",
    "稳定性",
    "稳定特点",
    "兼容性",
    "安装步骤",
    "安装过程",
    "安装方法",
    "cpu架构",
    "处理器",
    "特点",
    "特征",
    "特性",
    "功能",
    "优点",
    "优势",
    "应用",
    "支持",
];

const DEFAULT_STOP_WORDS: &[&str] = &[
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也",
    "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这", "什么",
    "如何", "怎么", "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of",
    "with", "by", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does",
    "did", "what", "how",
];

/// Fragment separators: CJK punctuation, ideographic space, and whitespace.
const SPLIT_MARKS: [char; 5] = ['，', '。', '！', '？', '\u{3000}'];

/// Maximum length of a CJK keyword run.
const CJK_RUN_MAX: usize = 8;
/// Minimum length of any keyword (CJK or Latin).
const MIN_TERM_LEN: usize = 2;

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Keyword extractor with a configurable phrase list and stop-word set.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    phrases: Vec<String>,
    stop_words: HashSet<String>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_PHRASES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl KeywordExtractor {
    pub fn new(phrases: Vec<String>, stop_words: HashSet<String>) -> Self {
        Self {
            phrases,
            stop_words,
        }
    }

    /// Extract a deduplicated, first-seen-ordered term list from `text`.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut candidates: Vec<String> = Vec::new();

        // 1. Configured domain phrases take priority.
        for phrase in &self.phrases {
            if lower.contains(phrase.as_str()) {
                candidates.push(phrase.clone());
            }
        }

        // 2. Punctuation-split fragments, then character runs per fragment.
        for fragment in lower.split(|c: char| SPLIT_MARKS.contains(&c) || c.is_whitespace()) {
            if fragment.is_empty() {
                continue;
            }
            collect_cjk_runs(fragment, &mut candidates);
            collect_latin_runs(fragment, &mut candidates);
        }

        // 3 + 4. Stop-word filter, length floor, first-occurrence dedup.
        let mut seen: HashSet<String> = HashSet::new();
        let mut keywords = Vec::new();
        for term in candidates {
            if term.chars().count() < MIN_TERM_LEN
                || self.stop_words.contains(&term)
                || seen.contains(&term)
            {
                continue;
            }
            seen.insert(term.clone());
            keywords.push(term);
        }
        keywords
    }
}

/// Slice each maximal CJK run into consecutive pieces of at most
/// [`CJK_RUN_MAX`] characters, discarding a trailing piece shorter than
/// [`MIN_TERM_LEN`].
fn collect_cjk_runs(fragment: &str, out: &mut Vec<String>) {
    let chars: Vec<char> = fragment.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if !is_cjk(chars[i]) {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < chars.len() && is_cjk(chars[i]) {
            i += 1;
        }
        let mut piece_start = run_start;
        while piece_start < i {
            let piece_end = (piece_start + CJK_RUN_MAX).min(i);
            if piece_end - piece_start >= MIN_TERM_LEN {
                out.push(chars[piece_start..piece_end].iter().collect());
            }
            piece_start = piece_end;
        }
    }
}

/// Collect maximal ASCII-letter runs of at least [`MIN_TERM_LEN`].
fn collect_latin_runs(fragment: &str, out: &mut Vec<String>) {
    let chars: Vec<char> = fragment.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_alphabetic() {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < chars.len() && chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i - run_start >= MIN_TERM_LEN {
            out.push(chars[run_start..i].iter().collect());
        }
    }
}

/// Maximal CJK and Latin word runs of any length, lowercased.
///
/// This is the Scorer's shared-vocabulary tokenization: unlike
/// [`KeywordExtractor::extract`] there is no stop-word filter, no phrase
/// list, and no length floor beyond run contiguity.
pub fn word_runs(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    let mut words = HashSet::new();
    let mut i = 0;
    while i < chars.len() {
        if is_cjk(chars[i]) {
            let start = i;
            while i < chars.len() && is_cjk(chars[i]) {
                i += 1;
            }
            words.insert(chars[start..i].iter().collect());
        } else if chars[i].is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            words.insert(chars[start..i].iter().collect());
        } else {
            i += 1;
        }
    }
    words
}
