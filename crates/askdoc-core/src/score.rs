//! Lexical relevance scoring and top-k ranking.
//!
//! Scoring is a deliberate linear scan (`corpus_size × query_term_count`)
//! over the record snapshot — there is no inverted index, the corpus is
//! expected to stay small. Every weight in the formula is an unexplained
//! empirical constant inherited from the reference behavior; they are
//! carried as named, configurable parameters and nothing more should be
//! read into them.

use serde::{Deserialize, Serialize};

use crate::keywords::{word_runs, KeywordExtractor};
use crate::models::{CorpusRecord, ScoredResult};

/// Named scoring constants. Defaults reproduce the reference formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Bonus when the full lowercased query occurs verbatim in the record.
    #[serde(default = "default_exact_phrase")]
    pub exact_phrase: f64,
    /// Bonus per distinct query keyword found in the record.
    #[serde(default = "default_keyword_hit")]
    pub keyword_hit: f64,
    /// Multiplier on the matched-keyword fraction (coverage bonus).
    #[serde(default = "default_coverage")]
    pub coverage: f64,
    /// Multiplier on the shared word-run fraction (semantic bonus).
    #[serde(default = "default_shared_vocab")]
    pub shared_vocab: f64,
    /// Score multiplier for records longer than `long_passage_chars`.
    #[serde(default = "default_long_passage_factor")]
    pub long_passage_factor: f64,
    /// Character-count threshold for the long-passage multiplier.
    #[serde(default = "default_long_passage_chars")]
    pub long_passage_chars: usize,
    /// Final scores are clamped to this maximum.
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    /// Records scoring below this are excluded from results.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

fn default_exact_phrase() -> f64 {
    2.0
}
fn default_keyword_hit() -> f64 {
    0.8
}
fn default_coverage() -> f64 {
    1.0
}
fn default_shared_vocab() -> f64 {
    0.5
}
fn default_long_passage_factor() -> f64 {
    1.1
}
fn default_long_passage_chars() -> usize {
    200
}
fn default_max_score() -> f64 {
    3.0
}
fn default_min_score() -> f64 {
    0.2
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            exact_phrase: default_exact_phrase(),
            keyword_hit: default_keyword_hit(),
            coverage: default_coverage(),
            shared_vocab: default_shared_vocab(),
            long_passage_factor: default_long_passage_factor(),
            long_passage_chars: default_long_passage_chars(),
            max_score: default_max_score(),
            min_score: default_min_score(),
        }
    }
}

/// Score every record against `query` and return the top `k`.
///
/// Results are sorted by descending score, stable on ties (insertion order
/// preserved), contain at most `k` entries, and every returned score is at
/// least `weights.min_score` and at most `weights.max_score`.
pub fn search(
    query: &str,
    records: &[CorpusRecord],
    k: usize,
    weights: &ScoreWeights,
    extractor: &KeywordExtractor,
) -> Vec<ScoredResult> {
    if query.trim().is_empty() || records.is_empty() {
        return Vec::new();
    }

    let query_lower = query.to_lowercase();
    let query_keywords = extractor.extract(&query_lower);
    let query_words = word_runs(&query_lower);

    let mut results: Vec<ScoredResult> = Vec::new();
    for record in records {
        let score = score_record(record, &query_lower, &query_keywords, &query_words, weights);
        if score >= weights.min_score {
            results.push(ScoredResult {
                record: record.clone(),
                score: score.min(weights.max_score),
            });
        }
    }

    // Vec::sort_by is stable, so equal scores keep insertion order.
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(k);
    results
}

/// Accumulate the multi-signal score for one record. Unclamped; the caller
/// applies `max_score`.
fn score_record(
    record: &CorpusRecord,
    query_lower: &str,
    query_keywords: &[String],
    query_words: &std::collections::HashSet<String>,
    weights: &ScoreWeights,
) -> f64 {
    let text_lower = record.text.to_lowercase();
    let mut score = 0.0;

    // 1. Verbatim query substring.
    if text_lower.contains(query_lower) {
        score += weights.exact_phrase;
    }

    // 2. Per-keyword hits.
    let matched = query_keywords
        .iter()
        .filter(|kw| text_lower.contains(kw.as_str()))
        .count();
    score += weights.keyword_hit * matched as f64;

    // 3. Coverage bonus, only when something matched.
    if !query_keywords.is_empty() && matched > 0 {
        score += (matched as f64 / query_keywords.len() as f64) * weights.coverage;
    }

    // 4. Shared-vocabulary bonus over raw word runs.
    if !query_words.is_empty() {
        let text_words = word_runs(&text_lower);
        let common = text_words.intersection(query_words).count();
        if common > 0 {
            score += (common as f64 / query_words.len() as f64) * weights.shared_vocab;
        }
    }

    // 5. Longer passages weighted slightly higher.
    if record.text.chars().count() > weights.long_passage_chars {
        score *= weights.long_passage_factor;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordMetadata;

    fn record(doc_id: u64, text: &str) -> CorpusRecord {
        CorpusRecord {
            text: text.to_string(),
            metadata: RecordMetadata {
                source: "test.txt".to_string(),
                chunk_id: doc_id as usize,
                total_chunks: 1,
                file_type: ".txt".to_string(),
                chunk_size: text.chars().count(),
                source_name: "test.txt".to_string(),
                doc_id,
            },
        }
    }

    fn run(query: &str, records: &[CorpusRecord], k: usize) -> Vec<ScoredResult> {
        search(
            query,
            records,
            k,
            &ScoreWeights::default(),
            &KeywordExtractor::default(),
        )
    }

    #[test]
    fn empty_corpus_returns_empty() {
        assert!(run("任何问题", &[], 5).is_empty());
    }

    #[test]
    fn empty_query_returns_empty() {
        let records = vec![record(0, "some content")];
        assert!(run("   ", &records, 5).is_empty());
    }

    #[test]
    fn exact_phrase_match_ranks_first() {
        let records = vec![
            record(0, "本文介绍内核调度与内存管理的基础知识"),
            record(1, "银河麒麟操作系统是一款面向政企的国产系统"),
            record(2, "另一段与查询关系不大的文本内容示例"),
        ];
        let results = run("银河麒麟操作系统", &records, 5);
        assert!(!results.is_empty());
        assert_eq!(results[0].record.metadata.doc_id, 1);
        // Exact-substring bonus alone exceeds 2.0.
        assert!(results[0].score >= 2.0);
    }

    #[test]
    fn scores_are_clamped_to_max() {
        let text = format!("银河麒麟操作系统的安全性与稳定性都很突出。{}", "系统安全稳定。".repeat(40));
        let records = vec![record(0, &text)];
        let results = run("银河麒麟操作系统的安全性与稳定性", &records, 5);
        assert_eq!(results.len(), 1);
        assert!(results[0].score <= 3.0);
    }

    #[test]
    fn weak_matches_below_threshold_are_excluded() {
        let records = vec![record(0, "completely unrelated english prose here")];
        let results = run("量子计算资料", &records, 5);
        assert!(results.is_empty());
    }

    #[test]
    fn never_returns_more_than_k() {
        let records: Vec<CorpusRecord> = (0..10)
            .map(|i| record(i, "麒麟系统支持多种处理器架构"))
            .collect();
        let results = run("麒麟系统", &records, 3);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn sorted_descending_and_stable_on_ties() {
        let records = vec![
            record(0, "麒麟系统支持多种处理器架构"),
            record(1, "麒麟系统支持多种处理器架构"),
            record(2, "麒麟系统是国产操作系统，支持多种处理器架构，安全可靠"),
        ];
        let results = run("麒麟系统支持哪些处理器", &records, 5);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // Identical records tie; insertion order must be preserved.
        let tied: Vec<u64> = results
            .iter()
            .filter(|r| r.record.metadata.doc_id < 2)
            .map(|r| r.record.metadata.doc_id)
            .collect();
        assert_eq!(tied, vec![0, 1]);
    }

    #[test]
    fn more_matching_keywords_never_decrease_score() {
        // Neither query occurs verbatim in the record, so only the keyword
        // and coverage signals move.
        let records = vec![record(0, "麒麟系统的安装步骤与处理器兼容性说明文档")];
        let narrow = run("安装步骤说明", &records, 1);
        let broad = run("安装步骤说明 处理器", &records, 1);
        assert!(!narrow.is_empty() && !broad.is_empty());
        assert!(broad[0].score >= narrow[0].score);
    }

    #[test]
    fn long_passages_score_higher_than_short_duplicates() {
        // Raise the clamp so the long-passage multiplier is observable.
        let mut weights = ScoreWeights::default();
        weights.max_score = 10.0;
        let short = "麒麟系统支持飞腾处理器";
        let long = format!("{}。{}", short, "这里是补充说明文字，用于把文本加长。".repeat(15));
        let records = vec![record(0, short), record(1, &long)];
        let results = search(
            "麒麟系统支持飞腾处理器",
            &records,
            5,
            &weights,
            &KeywordExtractor::default(),
        );
        assert_eq!(results[0].record.metadata.doc_id, 1);
    }

    #[test]
    fn custom_weights_are_respected() {
        let mut weights = ScoreWeights::default();
        weights.exact_phrase = 0.0;
        weights.keyword_hit = 0.0;
        weights.coverage = 0.0;
        weights.shared_vocab = 0.0;
        let records = vec![record(0, "麒麟系统支持多种处理器架构")];
        let results = search(
            "麒麟系统",
            &records,
            5,
            &weights,
            &KeywordExtractor::default(),
        );
        // All signals zeroed: nothing clears the inclusion threshold.
        assert!(results.is_empty());
    }
}
