//! Text translation.

mod base;
pub mod google;

pub use base::{TranslateError, Translator};
pub use google::{GOOGLE_TRANSLATE_URL, GoogleTranslateConfig, GoogleTranslator};
