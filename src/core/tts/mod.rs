//! Speech synthesis.
//!
//! Providers implement [`SpeechSynthesizer`]; callers go through
//! [`SynthesisService`], which adds the response cache and rate-limit retry.

mod base;
pub mod google;
pub mod retry;
pub mod service;

pub use base::{SpeechSynthesizer, SynthesisRequest, TTSError, TTSResult};
pub use google::{GoogleSynthesizer, GoogleTTSConfig};
pub use retry::RetryPolicy;
pub use service::{DEFAULT_CACHE_CAPACITY, SynthesisService};
