//! Shared plumbing for cloud providers.

pub mod google;
