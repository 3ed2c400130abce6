//! OCR capability seam for image uploads.
//!
//! Image formats are accepted only when an [`OcrEngine`] reports itself
//! available. The default build ships [`NoopOcr`], which declines image
//! uploads; deployments with a recognizer wire their own implementation in.

use askdoc_core::Result;

/// Text recovered from an image, plus how many detected text blocks were
/// skipped because they could not be read.
#[derive(Debug, Default)]
pub struct OcrText {
    pub text: String,
    pub blocks_skipped: usize,
}

/// Optional image-to-text capability.
pub trait OcrEngine: Send + Sync {
    /// Whether this engine can actually recognize text. When `false`,
    /// image uploads are rejected up front.
    fn is_available(&self) -> bool;

    /// Recognize text in the given image bytes. Unreadable blocks are
    /// counted in [`OcrText::blocks_skipped`] rather than failing the
    /// whole image.
    fn extract_text(&self, bytes: &[u8]) -> Result<OcrText>;
}

/// Placeholder engine for builds without a recognizer.
pub struct NoopOcr;

impl OcrEngine for NoopOcr {
    fn is_available(&self) -> bool {
        false
    }

    fn extract_text(&self, _bytes: &[u8]) -> Result<OcrText> {
        Ok(OcrText::default())
    }
}
