//! Multi-format text extraction for uploaded documents.
//!
//! Connectors supply raw bytes plus the declared file extension; this
//! module returns cleaned plain UTF-8 text ready for chunking. Supported
//! formats: PDF, Markdown, plain text, and — when an OCR capability is
//! available — common image formats.

use askdoc_core::{Error, Result};
use tracing::warn;

use crate::ocr::OcrEngine;

/// Extensions accepted without OCR.
pub const TEXT_EXTENSIONS: &[&str] = &[".pdf", ".md", ".markdown", ".txt"];
/// Image extensions accepted only when an OCR capability is present.
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".bmp"];

/// Declared document format, derived from the upload's file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Markdown,
    PlainText,
    Image,
}

impl FileFormat {
    /// Classify a lowercase extension (with leading dot).
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext {
            ".pdf" => Ok(Self::Pdf),
            ".md" | ".markdown" => Ok(Self::Markdown),
            ".txt" => Ok(Self::PlainText),
            e if IMAGE_EXTENSIONS.contains(&e) => Ok(Self::Image),
            other => Err(Error::UnsupportedFormat(format!(
                "{} (supported: PDF, Markdown, text{})",
                other, ", images with OCR"
            ))),
        }
    }
}

/// Lowercased extension of `filename`, including the dot.
pub fn extension_of(filename: &str) -> String {
    match filename.rfind('.') {
        Some(pos) => filename[pos..].to_lowercase(),
        None => String::new(),
    }
}

/// Extraction result: the recovered text plus the number of per-unit
/// failures (OCR text blocks) that were skipped rather than aborting.
#[derive(Debug)]
pub struct Extracted {
    pub text: String,
    pub skipped_units: usize,
}

/// Extract plain text from `bytes` according to the declared format.
///
/// Image extraction requires an available OCR capability; when the
/// capability is absent the upload is rejected with
/// [`Error::UnsupportedFormat`] rather than silently degrading.
pub fn extract_text(bytes: &[u8], format: FileFormat, ocr: &dyn OcrEngine) -> Result<Extracted> {
    match format {
        FileFormat::Pdf => extract_pdf(bytes),
        FileFormat::Markdown => Ok(Extracted {
            text: strip_markdown(&decode_text(bytes)),
            skipped_units: 0,
        }),
        FileFormat::PlainText => Ok(Extracted {
            text: decode_text(bytes),
            skipped_units: 0,
        }),
        FileFormat::Image => {
            if !ocr.is_available() {
                return Err(Error::UnsupportedFormat(
                    "image upload requires an OCR capability, which is not available".to_string(),
                ));
            }
            let out = ocr.extract_text(bytes)?;
            if out.blocks_skipped > 0 {
                warn!(skipped = out.blocks_skipped, "OCR skipped unreadable text blocks");
            }
            Ok(Extracted {
                text: out.text,
                skipped_units: out.blocks_skipped,
            })
        }
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<Extracted> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Extraction(format!("PDF extraction failed: {}", e)))?;
    if text.trim().is_empty() {
        return Err(Error::Extraction(
            "no extractable text found in PDF".to_string(),
        ));
    }
    Ok(Extracted {
        text,
        skipped_units: 0,
    })
}

/// Decode text bytes, trying UTF-8 first, then GBK (covers GB2312), then
/// lossy UTF-8 as a last resort. Mirrors the encoding ladder used for
/// documents originating on Chinese-locale systems.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    let (decoded, _, had_errors) = encoding_rs::GBK.decode(bytes);
    if !had_errors {
        return decoded.into_owned();
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reduce Markdown to plain text: drop heading/list/quote markers, code
/// fences, emphasis marks, and unwrap links and images to their labels.
pub fn strip_markdown(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut in_code_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_code_fence = !in_code_fence;
            continue;
        }
        if in_code_fence {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        let without_prefix = trimmed
            .trim_start_matches('#')
            .trim_start_matches('>')
            .trim_start_matches(|c| c == '-' || c == '*' || c == '+')
            .trim_start();

        out.push_str(&strip_inline_markup(without_prefix));
        out.push('\n');
    }
    out
}

/// Strip emphasis and backticks, and unwrap `[label](target)` /
/// `![alt](target)` to the label text.
fn strip_inline_markup(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' | '_' | '`' => i += 1,
            '!' if i + 1 < chars.len() && chars[i + 1] == '[' => i += 1,
            '[' => {
                // Copy the label; skip a following (target), if present.
                let close = chars[i + 1..].iter().position(|&c| c == ']');
                match close {
                    Some(rel) => {
                        let close_at = i + 1 + rel;
                        for &c in &chars[i + 1..close_at] {
                            out.push(c);
                        }
                        i = close_at + 1;
                        if i < chars.len() && chars[i] == '(' {
                            if let Some(rel) = chars[i..].iter().position(|&c| c == ')') {
                                i += rel + 1;
                            }
                        }
                    }
                    None => {
                        out.push('[');
                        i += 1;
                    }
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Characters kept by the cleaning pass, beyond alphanumerics, CJK, and
/// whitespace. CJK sentence punctuation stays so the chunker's boundary
/// search has marks to find.
const KEPT_PUNCT: &[char] = &[
    '.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '-', '_', '。', '！',
    '？', '，', '、', '；', '：',
];

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Clean extracted text before chunking: collapse whitespace runs to a
/// single space and drop characters outside the allowed set.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if is_cjk(c) || c.is_alphanumeric() || KEPT_PUNCT.contains(&c) {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}
