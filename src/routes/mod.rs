pub mod api;
pub mod relay;
