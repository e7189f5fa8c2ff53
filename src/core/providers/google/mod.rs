//! Google Cloud credentials shared by the Speech, Translation and
//! Text-to-Speech adapters.

mod auth;

pub use auth::{
    AuthError, CredentialSource, GOOGLE_CLOUD_PLATFORM_SCOPE, GoogleAuthClient, ServiceAccountKey,
    TokenProvider,
};
