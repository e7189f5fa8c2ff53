//! Wire vocabulary of the real-time channel.

use bytes::Bytes;

/// Text frame a speaker sends when it stops recording
pub const END_OF_AUDIO: &str = "END_OF_AUDIO";

pub const TRANSCRIPT_PREFIX: &str = "TRANSCRIPT:";
pub const TRANSLATION_PREFIX: &str = "TRANSLATION:";
pub const STREAM_COMPLETE: &str = "STREAM_COMPLETE";

/// Control input recognized on text frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    EndOfAudio,
}

impl ControlSignal {
    /// `None` for anything that is not a known control word
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            END_OF_AUDIO => Some(ControlSignal::EndOfAudio),
            _ => None,
        }
    }
}

/// A message queued for one destination session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    /// Final transcript echoed to the speaker
    Transcript(String),
    /// Translated text for a listener
    Translation(String),
    /// Synthesized MP3 audio for a listener
    Audio(Bytes),
    /// All work for the speaker's stream has drained
    StreamComplete,
}

/// A frame ready for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

impl OutgoingMessage {
    pub fn into_frame(self) -> Frame {
        match self {
            OutgoingMessage::Transcript(text) => Frame::Text(format!("{TRANSCRIPT_PREFIX}{text}")),
            OutgoingMessage::Translation(text) => {
                Frame::Text(format!("{TRANSLATION_PREFIX}{text}"))
            }
            OutgoingMessage::Audio(audio) => Frame::Binary(audio),
            OutgoingMessage::StreamComplete => Frame::Text(STREAM_COMPLETE.to_string()),
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            OutgoingMessage::Transcript(_) => "transcript",
            OutgoingMessage::Translation(_) => "translation",
            OutgoingMessage::Audio(_) => "audio",
            OutgoingMessage::StreamComplete => "stream_complete",
        }
    }
}
