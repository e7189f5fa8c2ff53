//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `relay` - Real-time relay WebSocket (speakers and listeners)
//! - `rooms` - Room voice configuration
//! - `translate` - Batch translation of uploaded audio

pub mod api;
pub mod relay;
pub mod rooms;
pub mod translate;

pub use relay::relay_handler;
