//! `generateContent` request and response bodies.

use serde::{Deserialize, Serialize};

use super::error::{EditError, EditResult};
use crate::image_ref::ImageRef;

const NO_EXPLANATION_PLACEHOLDER: &str = "the model returned no image and no explanation";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, alias = "inline_data", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn image(mime_type: &str, data: &str) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
            text: None,
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            inline_data: None,
            text: Some(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateResponse {
    /// Parts of the first candidate. Alternates are never consulted.
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// Returns the first inline image of the first candidate, or a
    /// `Declined` error carrying whatever text the model answered with.
    pub fn into_image(self) -> EditResult<ImageRef> {
        let image = self
            .parts()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|inline| !inline.data.is_empty());
        if let Some(inline) = image {
            return Ok(ImageRef::from_base64(&inline.mime_type, &inline.data));
        }

        let text = self
            .parts()
            .filter_map(|part| part.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let message = if text.is_empty() {
            NO_EXPLANATION_PLACEHOLDER.to_string()
        } else {
            text
        };
        Err(EditError::Declined { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).expect("response json should parse")
    }

    #[test]
    fn text_only_response_is_declined_with_model_text() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"I can't edit photos of this kind."}]}}]}"#,
        );
        let err = response.into_image().expect_err("text only should decline");
        assert!(matches!(err, EditError::Declined { .. }));
        assert!(err.to_string().contains("I can't edit photos of this kind."));
    }

    #[test]
    fn empty_response_uses_placeholder_message() {
        let err = parse(r#"{"candidates":[]}"#)
            .into_image()
            .expect_err("empty response should decline");
        assert!(err.to_string().contains(NO_EXPLANATION_PLACEHOLDER));
    }

    #[test]
    fn inline_image_becomes_data_url_with_declared_mime() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here you go"},
                {"inlineData":{"mimeType":"image/webp","data":"UklGRg=="}},
                {"inlineData":{"mimeType":"image/png","data":"iVBORw=="}}
            ]}}]}"#,
        );
        let image = response.into_image().expect("inline data should be returned");
        assert_eq!(image.as_str(), "data:image/webp;base64,UklGRg==");
    }

    #[test]
    fn only_first_candidate_is_decoded() {
        let response = parse(
            r#"{"candidates":[
                {"content":{"parts":[{"text":"No image this time."}]}},
                {"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"QUJD"}}]}}
            ]}"#,
        );
        let err = response
            .into_image()
            .expect_err("alternate candidates are ignored");
        assert!(err.to_string().contains("No image this time."));
    }

    #[test]
    fn snake_case_inline_data_is_accepted() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"inline_data":{"mime_type":"image/png","data":"QUJD"}}]}}]}"#,
        );
        let image = response.into_image().unwrap();
        assert_eq!(image.mime_type().unwrap(), "image/png");
    }

    #[test]
    fn request_serializes_with_camel_case_keys() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::image("image/png", "QUJD"), Part::text("do it")],
            }],
            generation_config: GenerationConfig::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "QUJD"}},
                    {"text": "do it"}
                ]}],
                "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
            })
        );
    }
}
