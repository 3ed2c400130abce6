//! Retrieval-augmented answering.
//!
//! `RagEngine` owns the whole question path: retrieve scored passages from
//! the corpus, ask the generator for an answer grounded in them, and fall
//! back to a local extractive answer when generation is unavailable. The
//! engine never returns an error for a question; degraded modes produce a
//! usable response instead.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use askdoc_core::keywords::KeywordExtractor;
use askdoc_core::models::ScoredResult;
use askdoc_core::score::{search, ScoreWeights};
use askdoc_core::store::CorpusStore;
use askdoc_core::Result;

use crate::generation::Generator;

const NO_MATCH_ANSWER: &str =
    "抱歉，我没有找到相关的文档内容来回答您的问题。请尝试上传相关文档或换个问题。";

const FALLBACK_NOT_FOUND: &str = "抱歉，在提供的文档中没有找到直接相关的信息。建议您：\n1. 尝试使用不同的关键词重新提问\n2. 上传更多相关文档\n3. 查看文档的完整内容";

const FALLBACK_PREAMBLE: &str = "根据文档内容，我找到以下相关信息：\n\n";

const FALLBACK_AFTERWORD: &str =
    "\n\n请注意：这是基于关键词匹配的简化回答，建议查看完整文档获取更准确信息。";

const PROMPT_TEMPLATE: &str = "你是银河麒麟操作系统的智能助手，专门回答与麒麟系统相关的问题。\n\n请基于提供的文档内容回答用户问题，要求：\n1. 回答要准确、专业、有条理\n2. 优先使用提供的文档内容\n3. 如果文档内容不足，可以结合你的知识补充\n4. 明确指出信息来源\n5. 使用中文回答\n\n文档内容：\n{context}\n\n用户问题：{question}\n\n请提供详细的回答：";

/// Sentence delimiters for the extractive fallback.
const SENTENCE_DELIMITERS: &[char] = &['。', '！', '？', '.', '!', '?'];

/// At most this many matching sentences appear in a fallback answer.
const FALLBACK_MAX_SENTENCES: usize = 3;

/// Source previews are capped at this many characters.
const PREVIEW_CHARS: usize = 200;

/// One retrieved passage cited in an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub source: String,
    pub chunk_id: usize,
    pub score: f64,
    pub text_preview: String,
}

/// How the answer text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    Generated,
    Extractive,
    NoMatch,
}

/// Complete response to a question.
#[derive(Debug, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub confidence: f64,
    pub mode: AnswerMode,
}

pub struct RagEngine {
    store: Arc<dyn CorpusStore>,
    generator: Arc<dyn Generator>,
    weights: ScoreWeights,
    extractor: KeywordExtractor,
    default_max_results: usize,
}

impl RagEngine {
    pub fn new(
        store: Arc<dyn CorpusStore>,
        generator: Arc<dyn Generator>,
        weights: ScoreWeights,
        default_max_results: usize,
    ) -> Self {
        Self {
            store,
            generator,
            weights,
            extractor: KeywordExtractor::default(),
            default_max_results,
        }
    }

    /// Answer a question against the current corpus.
    ///
    /// Only store access can fail here; retrieval misses and generation
    /// failures both degrade to canned or extractive answers.
    pub async fn answer(&self, question: &str, max_results: Option<usize>) -> Result<Answer> {
        let records = self.store.snapshot().await?;
        let k = max_results.unwrap_or(self.default_max_results);
        let results = search(question, &records, k, &self.weights, &self.extractor);
        if results.is_empty() {
            return Ok(Answer {
                answer: NO_MATCH_ANSWER.to_string(),
                sources: Vec::new(),
                confidence: 0.0,
                mode: AnswerMode::NoMatch,
            });
        }
        debug!(results = results.len(), "retrieved passages");

        let confidence = confidence_for(&results);
        let sources = results
            .iter()
            .map(|r| SourceRef {
                source: r.record.metadata.source_name.clone(),
                chunk_id: r.record.metadata.chunk_id,
                score: r.score,
                text_preview: preview_of(&r.record.text),
            })
            .collect();

        let prompt = PROMPT_TEMPLATE
            .replace("{context}", &build_context(&results))
            .replace("{question}", question);
        let (answer, mode) = match self.generator.generate(&prompt).await {
            Ok(text) => (text, AnswerMode::Generated),
            Err(e) => {
                warn!(error = %e, "generation failed, using extractive fallback");
                let keywords = self.extractor.extract(question);
                (
                    extractive_answer(&results, &keywords),
                    AnswerMode::Extractive,
                )
            }
        };

        Ok(Answer {
            answer,
            sources,
            confidence,
            mode,
        })
    }
}

/// Retrieved passages formatted for the prompt, labeled in rank order.
fn build_context(results: &[ScoredResult]) -> String {
    let parts: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "文档片段 {} (来源: {}):\n{}\n",
                i + 1,
                result.record.metadata.source_name,
                result.record.text
            )
        })
        .collect();
    parts.join("\n")
}

/// First 200 characters of a passage, with an ellipsis when truncated.
fn preview_of(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() > PREVIEW_CHARS {
        let mut preview: String = chars[..PREVIEW_CHARS].iter().collect();
        preview.push_str("...");
        preview
    } else {
        text.to_string()
    }
}

/// Local extractive answer used when the generator is unreachable: split
/// the retrieved passages into sentences and keep up to three that contain
/// a query keyword.
fn extractive_answer(results: &[ScoredResult], keywords: &[String]) -> String {
    let mut matching: Vec<String> = Vec::new();
    'outer: for result in results {
        for sentence in result
            .record
            .text
            .split(SENTENCE_DELIMITERS)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let lower = sentence.to_lowercase();
            if keywords.iter().any(|k| lower.contains(k.as_str())) {
                matching.push(sentence.to_string());
                if matching.len() == FALLBACK_MAX_SENTENCES {
                    break 'outer;
                }
            }
        }
    }
    if matching.is_empty() {
        return FALLBACK_NOT_FOUND.to_string();
    }
    let bullets: Vec<String> = matching.iter().map(|s| format!("• {}", s)).collect();
    format!(
        "{}{}{}",
        FALLBACK_PREAMBLE,
        bullets.join("\n"),
        FALLBACK_AFTERWORD
    )
}

/// Confidence in the retrieved set: mean score clamped to [0, 1], boosted
/// by 1.2x when at least two passages score above 0.7, rounded to two
/// decimals.
fn confidence_for(results: &[ScoredResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let mean = results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64;
    let mut confidence = mean.clamp(0.0, 1.0);
    let strong = results.iter().filter(|r| r.score > 0.7).count();
    if strong >= 2 {
        confidence = (confidence * 1.2).clamp(0.0, 1.0);
    }
    (confidence * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdoc_core::models::ChunkRecord;
    use askdoc_core::store::memory::InMemoryCorpus;
    use askdoc_core::Error;
    use async_trait::async_trait;

    struct CannedGenerator(String);

    #[async_trait]
    impl Generator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(Error::Generation("unreachable".to_string()))
        }
    }

    async fn seeded_store() -> Arc<dyn CorpusStore> {
        let store: Arc<dyn CorpusStore> = Arc::new(InMemoryCorpus::new());
        store
            .append(
                vec![
                    ChunkRecord {
                        text: "银河麒麟操作系统支持飞腾、鲲鹏、龙芯等多种国产处理器架构。"
                            .to_string(),
                        source: "arch.txt".to_string(),
                        chunk_id: 0,
                        total_chunks: 2,
                        file_type: ".txt".to_string(),
                        chunk_size: 29,
                    },
                    ChunkRecord {
                        text: "系统安装步骤：首先制作启动盘，然后进入安装向导。".to_string(),
                        source: "arch.txt".to_string(),
                        chunk_id: 1,
                        total_chunks: 2,
                        file_type: ".txt".to_string(),
                        chunk_size: 24,
                    },
                ],
                "arch.txt",
            )
            .await
            .unwrap();
        store
    }

    fn engine(store: Arc<dyn CorpusStore>, generator: Arc<dyn Generator>) -> RagEngine {
        RagEngine::new(store, generator, ScoreWeights::default(), 3)
    }

    #[tokio::test]
    async fn empty_corpus_yields_canned_answer() {
        let store: Arc<dyn CorpusStore> = Arc::new(InMemoryCorpus::new());
        let engine = engine(store, Arc::new(CannedGenerator("x".to_string())));
        let answer = engine.answer("麒麟支持什么架构？", None).await.unwrap();
        assert_eq!(answer.answer, NO_MATCH_ANSWER);
        assert!(answer.sources.is_empty());
        assert_eq!(answer.confidence, 0.0);
        assert_eq!(answer.mode, AnswerMode::NoMatch);
    }

    #[tokio::test]
    async fn unrelated_question_yields_canned_answer() {
        let store = seeded_store().await;
        let engine = engine(store, Arc::new(CannedGenerator("x".to_string())));
        let answer = engine.answer("weather forecast tomorrow", None).await.unwrap();
        assert_eq!(answer.answer, NO_MATCH_ANSWER);
        assert_eq!(answer.mode, AnswerMode::NoMatch);
    }

    #[tokio::test]
    async fn blank_question_is_answered_not_rejected() {
        let store = seeded_store().await;
        let engine = engine(store, Arc::new(CannedGenerator("x".to_string())));
        let answer = engine.answer("   ", None).await.unwrap();
        assert_eq!(answer.answer, NO_MATCH_ANSWER);
        assert_eq!(answer.confidence, 0.0);
        assert_eq!(answer.mode, AnswerMode::NoMatch);
    }

    #[tokio::test]
    async fn generated_answer_cites_sources() {
        let store = seeded_store().await;
        let engine = engine(
            store,
            Arc::new(CannedGenerator("支持飞腾、鲲鹏、龙芯。".to_string())),
        );
        let answer = engine
            .answer("银河麒麟操作系统支持哪些处理器架构？", None)
            .await
            .unwrap();
        assert_eq!(answer.mode, AnswerMode::Generated);
        assert_eq!(answer.answer, "支持飞腾、鲲鹏、龙芯。");
        assert!(!answer.sources.is_empty());
        assert_eq!(answer.sources[0].source, "arch.txt");
        assert!(!answer.sources[0].text_preview.is_empty());
        assert!(answer.confidence > 0.0);
    }

    #[tokio::test]
    async fn generation_failure_falls_back_to_excerpts() {
        let store = seeded_store().await;
        let engine = engine(store, Arc::new(FailingGenerator));
        let answer = engine
            .answer("银河麒麟操作系统支持哪些处理器架构？", None)
            .await
            .unwrap();
        assert_eq!(answer.mode, AnswerMode::Extractive);
        assert!(answer.answer.starts_with(FALLBACK_PREAMBLE));
        assert!(answer.answer.contains("• "));
        assert!(answer.answer.contains("处理器架构"));
        assert!(answer.answer.ends_with(FALLBACK_AFTERWORD));
        assert!(!answer.sources.is_empty());
    }

    #[test]
    fn fallback_without_matching_sentences_suggests_rephrasing() {
        let results: Vec<ScoredResult> = Vec::new();
        assert_eq!(
            extractive_answer(&results, &["不存在的关键词".to_string()]),
            FALLBACK_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn prompt_embeds_context_and_question() {
        struct TemplateAssertingGenerator;

        #[async_trait]
        impl Generator for TemplateAssertingGenerator {
            async fn generate(&self, prompt: &str) -> Result<String> {
                assert!(prompt.contains("文档片段 1 (来源: arch.txt):"));
                assert!(prompt.contains("用户问题：银河麒麟操作系统支持哪些处理器架构？"));
                assert!(prompt.ends_with("请提供详细的回答："));
                Ok("ok".to_string())
            }
        }

        let store = seeded_store().await;
        let engine = engine(store, Arc::new(TemplateAssertingGenerator));
        let answer = engine
            .answer("银河麒麟操作系统支持哪些处理器架构？", None)
            .await
            .unwrap();
        assert_eq!(answer.mode, AnswerMode::Generated);
    }

    #[test]
    fn fallback_keeps_at_most_three_sentences() {
        let record = ChunkRecord {
            text: "麒麟一。麒麟二。麒麟三。麒麟四。".to_string(),
            source: "s.txt".to_string(),
            chunk_id: 0,
            total_chunks: 1,
            file_type: ".txt".to_string(),
            chunk_size: 16,
        }
        .into_record("s.txt", 0);
        let results = vec![ScoredResult {
            record,
            score: 1.0,
        }];
        let answer = extractive_answer(&results, &["麒麟".to_string()]);
        assert_eq!(answer.matches('•').count(), 3);
    }

    #[test]
    fn preview_truncates_long_passages_with_ellipsis() {
        let text = "长".repeat(250);
        let preview = preview_of(&text);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 203);
        assert_eq!(preview_of("短文本"), "短文本");
    }

    #[tokio::test]
    async fn max_results_limits_cited_sources() {
        let store = seeded_store().await;
        let engine = engine(store, Arc::new(CannedGenerator("ok".to_string())));
        let answer = engine
            .answer("银河麒麟操作系统安装步骤", Some(1))
            .await
            .unwrap();
        assert_eq!(answer.sources.len(), 1);
    }

    #[test]
    fn confidence_rounds_and_boosts() {
        fn scored(score: f64) -> ScoredResult {
            ScoredResult {
                record: ChunkRecord {
                    text: "t".to_string(),
                    source: "s".to_string(),
                    chunk_id: 0,
                    total_chunks: 1,
                    file_type: ".txt".to_string(),
                    chunk_size: 1,
                }
                .into_record("s", 0),
                score,
            }
        }

        // Mean 0.5, single strong score, no boost.
        assert_eq!(confidence_for(&[scored(0.25), scored(0.75)]), 0.5);
        // Two strong scores trigger the 1.2x boost: mean 0.8 -> 0.96.
        assert_eq!(confidence_for(&[scored(0.8), scored(0.8)]), 0.96);
        // Boost never exceeds 1.0.
        assert_eq!(confidence_for(&[scored(3.0), scored(3.0)]), 1.0);
    }
}
