pub mod batch;
pub mod cache;
pub mod providers;
pub mod relay;
pub mod rooms;
pub mod stt;
pub mod translate;
pub mod tts;

pub use batch::{BatchTranslation, BatchTranslator};
pub use cache::BoundedCache;
pub use relay::{RelayCoordinator, RelayError, RelayServices, RoomRegistry, SessionDefaults};
pub use rooms::{RoomConfig, RoomDirectory};
