//! Image extractor trait definition.

use applymate_types::error::ExtractionError;

/// Turns an image location into a textual summary of the job it shows.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ImageExtractor: Send + Sync {
    /// Extract job details from the image at `image_url` (an `https:` or
    /// `data:` URL).
    fn extract(
        &self,
        image_url: &str,
    ) -> impl std::future::Future<Output = Result<String, ExtractionError>> + Send;
}
