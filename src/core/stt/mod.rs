//! Speech recognition.
//!
//! [`StreamingRecognizer`] is the seam the relay drives for live speaker
//! audio; [`BatchRecognizer`] serves one-shot uploads.

mod base;
pub mod google;

pub use base::{
    BatchRecognizer, EVENT_CHANNEL_BUFFER, RecognizerEvent, RecognizerSession, RecognizerStream,
    STTConfig, STTError, STTResult, StreamingRecognizer,
};

pub use google::{GoogleBatchRecognizer, GoogleSTTConfig, GoogleStreamingRecognizer};
