//! Batch translation of an uploaded recording
//!
//! Accepts `multipart/form-data` with an `audio` file and optional
//! `sourceLang` / `targetLang` text fields.

use axum::{
    Json,
    extract::{Multipart, State},
};
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub original_text: String,
    pub translated_text: String,
    /// Base64 MP3, null when nothing was synthesized
    pub audio_content: Option<String>,
}

#[derive(Default)]
struct TranslateUpload {
    audio: Option<Bytes>,
    content_type: Option<String>,
    source_language: Option<String>,
    target_language: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> AppResult<TranslateUpload> {
    let mut upload = TranslateUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                upload.content_type = field.content_type().map(str::to_string);
                upload.audio = Some(field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read audio field: {e}"))
                })?);
            }
            "sourceLang" | "targetLang" => {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field {name}: {e}"))
                })?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                if name == "sourceLang" {
                    upload.source_language = value;
                } else {
                    upload.target_language = value;
                }
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(upload)
}

pub async fn translate_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<TranslateResponse>> {
    let upload = read_upload(multipart).await?;
    let audio = upload
        .audio
        .ok_or_else(|| AppError::BadRequest("Missing audio field".to_string()))?;
    if audio.is_empty() {
        return Err(AppError::BadRequest("Audio field is empty".to_string()));
    }

    let defaults = &state.config.session_defaults;
    let source_language = upload
        .source_language
        .unwrap_or_else(|| defaults.source_language.clone());
    let target_language = upload
        .target_language
        .unwrap_or_else(|| defaults.target_language.clone());

    let result = state
        .batch
        .translate_audio(
            audio,
            upload.content_type.as_deref(),
            &source_language,
            &target_language,
        )
        .await?;

    Ok(Json(TranslateResponse {
        original_text: result.original_text,
        translated_text: result.translated_text,
        audio_content: result
            .audio
            .filter(|audio| !audio.is_empty())
            .map(|audio| base64::engine::general_purpose::STANDARD.encode(&audio)),
    }))
}
