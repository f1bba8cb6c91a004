use crate::domain::dialogue::Batch;
use async_trait::async_trait;

/// Repository for multi-speaker synthesis requests.
/// Abstracts the underlying TTS provider (Google Cloud TTS, test doubles, etc.)
///
/// Implementations receive batches that already fit the provider's request
/// limits; they never split or merge. Voice and encoding are fixed per
/// implementation.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one batch of speaker turns
    ///
    /// Returns the encoded audio (MP3) for the whole batch
    ///
    /// # Errors
    /// Returns a provider-specific description when the request is rejected
    /// or the provider is unreachable; callers treat it as opaque
    async fn synthesize(&self, batch: &Batch) -> Result<Vec<u8>, String>;

    /// Whether credentials for the provider are configured
    fn is_configured(&self) -> bool {
        true
    }
}
