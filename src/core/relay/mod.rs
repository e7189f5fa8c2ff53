//! Room broadcast of live speech.
//!
//! A connection becomes a [`Session`] in a room. Speakers stream audio into a
//! recognizer; each final transcript is translated and re-synthesized for
//! every listener in the same room by the [`RelayCoordinator`].

mod completion;
mod coordinator;
pub mod messages;
mod room;
mod session;

pub use completion::CompletionTracker;
pub use coordinator::{RelayCoordinator, RelayError, RelayServices};
pub use messages::{ControlSignal, END_OF_AUDIO, Frame, OutgoingMessage};
pub use room::RoomRegistry;
pub use session::{Role, Session, SessionDefaults, SessionParams};
