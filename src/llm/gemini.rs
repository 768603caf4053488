//! Gemini image-generation client. The composed prompt plus the loaded
//! reference images go in; generated image bytes and an optional model note
//! come out. One call per request, no automatic retry.

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::llm::media::LoadedReference;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, thiserror::Error)]
pub enum ImageGenerationError {
    #[error("image generation timed out after {0}s")]
    Timeout(u64),
    #[error("image generation failed: {0}")]
    Api(String),
    #[error("no images returned by Gemini (model: {0})")]
    Empty(String),
}

/// Output-format knobs forwarded to the model's `imageConfig`.
#[derive(Debug, Clone, Default)]
pub struct GeminiImageConfig {
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
}

/// One generated image plus whatever commentary the model attached.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub text_note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn redact_api_key(text: &str) -> String {
    let key = CONFIG.gemini_api_key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string());
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn build_safety_settings() -> Vec<Value> {
    let profile = CONFIG.gemini_safety_settings.as_str();
    let threshold = match profile {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        _ => "OFF",
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_CIVIC_INTEGRITY", "threshold": threshold }),
    ]
}

fn build_image_config(config: &GeminiImageConfig) -> Option<Value> {
    let mut map = Map::new();

    if let Some(aspect_ratio) = config.aspect_ratio.as_deref() {
        let trimmed = aspect_ratio.trim();
        if !trimmed.is_empty() {
            map.insert("aspectRatio".to_string(), json!(trimmed));
        }
    }

    if let Some(image_size) = config.image_size.as_deref() {
        let trimmed = image_size.trim();
        if !trimmed.is_empty() {
            map.insert("imageSize".to_string(), json!(trimmed));
        }
    }

    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

/// Prompt text first, then one inline part per reference image. Callers
/// order the references (background ahead of staff) before getting here.
fn build_parts(prompt: &str, references: &[LoadedReference]) -> Vec<Value> {
    let mut parts = vec![json!({ "text": prompt })];

    for reference in references {
        let encoded = general_purpose::STANDARD.encode(&reference.bytes);
        parts.push(json!({
            "inlineData": {
                "mimeType": reference.mime_type,
                "data": encoded
            }
        }));
    }

    parts
}

fn extract_result(response: GeminiResponse) -> (Option<Vec<u8>>, Option<String>) {
    let mut image = None;
    let mut notes = Vec::new();

    for candidate in response.candidates.unwrap_or_default() {
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts.unwrap_or_default() {
            match part {
                GeminiPart::Text { text } => {
                    if !text.trim().is_empty() {
                        notes.push(text);
                    }
                }
                GeminiPart::InlineData { inline_data } => {
                    if image.is_none() && inline_data.mime_type.starts_with("image/") {
                        if let Ok(bytes) = general_purpose::STANDARD.decode(inline_data.data) {
                            image = Some(bytes);
                        }
                    }
                }
            }
        }
    }

    let note = if notes.is_empty() {
        None
    } else {
        Some(notes.join("\n"))
    };
    (image, note)
}

async fn call_gemini_api(
    model: &str,
    payload: Value,
    timeout_seconds: u64,
) -> Result<GeminiResponse, ImageGenerationError> {
    let client = get_http_client();
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        CONFIG.gemini_base_url.trim_end_matches('/'),
        model
    );

    let response = client
        .post(&url)
        .header("x-goog-api-key", &CONFIG.gemini_api_key)
        .timeout(Duration::from_secs(timeout_seconds))
        .json(&payload)
        .send()
        .await
        .map_err(|err| {
            if err.is_timeout() {
                return ImageGenerationError::Timeout(timeout_seconds);
            }
            let err_text = redact_api_key(&err.to_string());
            warn!(
                "Gemini request failed to send: {} (timeout={}, connect={})",
                err_text,
                err.is_timeout(),
                err.is_connect()
            );
            ImageGenerationError::Api(format!("Gemini request failed: {err_text}"))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let (message, body_summary) = summarize_error_body(&body);
        warn!("Gemini API error: status={}, body={}", status, body_summary);
        let detail = message.unwrap_or(body_summary);
        return Err(ImageGenerationError::Api(format!(
            "Gemini request failed with status {status}: {detail}"
        )));
    }

    response
        .json::<GeminiResponse>()
        .await
        .map_err(|err| ImageGenerationError::Api(format!("Failed to decode Gemini response: {err}")))
}

/// Generates one image from the composed prompt and the attached references.
pub async fn generate_image(
    prompt: &str,
    references: &[LoadedReference],
    config: &GeminiImageConfig,
) -> Result<GeneratedImage, ImageGenerationError> {
    if CONFIG.gemini_api_key.trim().is_empty() {
        return Err(ImageGenerationError::Api(
            "GEMINI_API_KEY is not set".to_string(),
        ));
    }

    let system_instruction = if references.is_empty() {
        "Generate an image based on the prompt. CRITICAL: the response must be an image, NOT TEXT."
    } else {
        "Generate an image based on the prompt, using the attached reference photographs as \
         anchors for the setting and for people's appearance. CRITICAL: the response must be \
         an image, NOT TEXT."
    };

    let mut generation_config = json!({
        "responseModalities": ["TEXT", "IMAGE"]
    });
    if let Some(image_config) = build_image_config(config) {
        if let Some(config_object) = generation_config.as_object_mut() {
            config_object.insert("imageConfig".to_string(), image_config);
        }
    }

    let payload = json!({
        "systemInstruction": { "parts": [{ "text": system_instruction }] },
        "contents": [{ "role": "user", "parts": build_parts(prompt, references) }],
        "generationConfig": generation_config,
        "safetySettings": build_safety_settings(),
    });

    let model = CONFIG.gemini_image_model.clone();
    let timeout_seconds = CONFIG.image_timeout_seconds;
    let reference_summary = references
        .iter()
        .map(|reference| format!("{} ({:?})", reference.label, reference.kind))
        .collect::<Vec<_>>()
        .join(", ");
    debug!(
        target: "studio.gemini",
        model = %model,
        references = %reference_summary,
        prompt = %truncate_for_log(prompt, 200),
        "Gemini image request"
    );

    log_llm_timing("gemini", &model, "generate_image", None, || async {
        let response = call_gemini_api(&model, payload, timeout_seconds).await?;
        let (image, text_note) = extract_result(response);
        match image {
            Some(bytes) => Ok(GeneratedImage { bytes, text_note }),
            None => Err(ImageGenerationError::Empty(model.clone())),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ReferenceKind;

    #[test]
    fn parts_start_with_prompt_then_references() {
        let references = vec![
            LoadedReference::new(vec![1, 2, 3], ReferenceKind::Background, "bg".to_string()),
            LoadedReference::new(vec![4, 5, 6], ReferenceKind::Staff, "staff".to_string()),
        ];
        let parts = build_parts("a prompt", &references);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].get("text").and_then(|v| v.as_str()), Some("a prompt"));
        assert!(parts[1].get("inlineData").is_some());
        assert!(parts[2].get("inlineData").is_some());
    }

    #[test]
    fn image_config_is_omitted_when_empty() {
        assert!(build_image_config(&GeminiImageConfig::default()).is_none());
        let config = GeminiImageConfig {
            aspect_ratio: Some("16:9".to_string()),
            image_size: None,
        };
        let value = build_image_config(&config).unwrap();
        assert_eq!(
            value.get("aspectRatio").and_then(|v| v.as_str()),
            Some("16:9")
        );
    }

    #[test]
    fn extracts_first_image_and_joined_notes() {
        let encoded = general_purpose::STANDARD.encode([9u8, 9, 9]);
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "note one" },
                        { "inlineData": { "mimeType": "image/png", "data": encoded } },
                        { "text": "note two" }
                    ]
                }
            }]
        }))
        .unwrap();
        let (image, note) = extract_result(response);
        assert_eq!(image.unwrap(), vec![9u8, 9, 9]);
        assert_eq!(note.as_deref(), Some("note one\nnote two"));
    }

    #[test]
    fn missing_image_is_reported_as_empty() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "sorry" }] } }]
        }))
        .unwrap();
        let (image, _) = extract_result(response);
        assert!(image.is_none());
    }
}
