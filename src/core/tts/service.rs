//! Cached, rate-limit-aware synthesis.
//!
//! [`SynthesisService`] sits in front of any [`SpeechSynthesizer`]. A request
//! whose exact parameters were synthesized before is answered from a bounded
//! LRU cache without calling the provider. Misses go through the
//! [`RetryPolicy`]; concurrent misses for the same request share one call.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use super::base::{SpeechSynthesizer, SynthesisRequest, TTSResult};
use super::retry::RetryPolicy;
use crate::core::cache::BoundedCache;

/// Default number of cached synthesis results
pub const DEFAULT_CACHE_CAPACITY: u64 = 1000;

pub struct SynthesisService {
    provider: Arc<dyn SpeechSynthesizer>,
    cache: BoundedCache<SynthesisRequest, Bytes>,
    retry: RetryPolicy,
}

impl SynthesisService {
    pub fn new(provider: Arc<dyn SpeechSynthesizer>, cache_capacity: u64, retry: RetryPolicy) -> Self {
        Self {
            provider,
            cache: BoundedCache::new(cache_capacity),
            retry,
        }
    }

    pub async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<Bytes> {
        if let Some(audio) = self.cache.get(&request).await {
            debug!(voice_model = %request.voice_model, "Synthesis cache hit");
            return Ok(audio);
        }

        let provider = self.provider.clone();
        let retry = self.retry;
        let pending = request.clone();

        self.cache
            .get_or_try_insert_with(request, async move {
                retry
                    .run(|attempt| {
                        debug!(attempt, provider = provider.get_provider_info(), "Calling synthesizer");
                        provider.synthesize(&pending)
                    })
                    .await
            })
            .await
            .map_err(|e| (*e).clone())
    }

    pub async fn cached_entries(&self) -> u64 {
        self.cache.len().await
    }
}
