//! Google Cloud Speech-to-Text v1 adapters.

mod client;
mod config;

pub use client::{GoogleBatchRecognizer, GoogleStreamingRecognizer, grpc_status_to_stt_error};
pub use config::{
    GOOGLE_SPEECH_ENDPOINT, GoogleSTTConfig, batch_config, encoding_for_content_type,
    streaming_config,
};
