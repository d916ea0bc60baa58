//! Vision-model tag extraction.
//!
//! Sends a product image URL to an OpenAI-compatible chat-completions
//! endpoint and parses the free-text reply as a JSON array of keyword tags.
//! Every failure degrades to an empty tag list; nothing propagates past this
//! boundary.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Upper bound on tags kept from one reply.
const MAX_TAGS: usize = 5;

const PROMPT: &str = "Analyze this product image. Return a JSON array of up to 5 simple \
lowercase English keywords describing the product category (e.g. ['stroller', 'diaper', \
'toy', 'clothing']). Do not return sentences.";

/// Vision client settings.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageRef },
}

#[derive(Debug, Serialize)]
struct ImageRef {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Client for the external vision model.
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl VisionClient {
    /// Build the client.
    ///
    /// # Errors
    /// Returns an error when the base URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(config: VisionConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build vision HTTP client")?;

        let base_url = Url::parse(&config.base_url).context("invalid vision base URL")?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            model: config.model,
        })
    }

    /// Extract up to [`MAX_TAGS`] lowercase keyword tags for an image.
    ///
    /// Infallible by contract: every failure is logged and yields an empty
    /// list.
    pub async fn analyze_image(&self, image_url: &str) -> Vec<String> {
        match self.fetch_tags(image_url).await {
            Ok(tags) => tags,
            Err(error) => {
                warn!(error = %error, image_url, "vision tag extraction failed");
                Vec::new()
            }
        }
    }

    async fn fetch_tags(&self, image_url: &str) -> Result<Vec<String>> {
        let url = self
            .base_url
            .join("v1/chat/completions")
            .context("failed to build chat-completions URL")?;

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageRef {
                            url: image_url.to_string(),
                        },
                    },
                ],
            }],
            max_tokens: 50,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("vision model request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("vision model returned status {status}: {error_body}");
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("failed to deserialize vision model response")?;

        let content = chat
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .context("vision model reply carried no content")?;

        Ok(parse_tags(content))
    }
}

/// Parse a model reply into tags.
///
/// The reply is free text and often arrives fenced as ```` ```json [...] ``` ````;
/// fences are stripped before parsing. Anything that is not a JSON array of
/// strings yields an empty list.
#[must_use]
pub(crate) fn parse_tags(content: &str) -> Vec<String> {
    let cleaned = content.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(cleaned) else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(tag) => Some(tag.trim().to_lowercase()),
            _ => None,
        })
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> VisionConfig {
        VisionConfig {
            base_url,
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
            connect_timeout: Duration::from_secs(3),
            total_timeout: Duration::from_secs(8),
        }
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "content": content } }]
        })
    }

    #[tokio::test]
    async fn analyze_image_parses_plain_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
                r#"["stroller", "travel"]"#,
            )))
            .mount(&server)
            .await;

        let client = VisionClient::new(test_config(server.uri())).expect("client builds");
        let tags = client.analyze_image("https://img.example.com/p.jpg").await;

        assert_eq!(tags, vec!["stroller".to_string(), "travel".to_string()]);
    }

    #[tokio::test]
    async fn analyze_image_strips_code_fences() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
                "```json\n[\"Diaper\", \"WIPES\"]\n```",
            )))
            .mount(&server)
            .await;

        let client = VisionClient::new(test_config(server.uri())).expect("client builds");
        let tags = client.analyze_image("https://img.example.com/p.jpg").await;

        assert_eq!(tags, vec!["diaper".to_string(), "wipes".to_string()]);
    }

    #[tokio::test]
    async fn analyze_image_returns_empty_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = VisionClient::new(test_config(server.uri())).expect("client builds");
        assert!(client.analyze_image("https://img.example.com/p.jpg").await.is_empty());
    }

    #[tokio::test]
    async fn analyze_image_returns_empty_on_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = VisionClient::new(test_config(server.uri())).expect("client builds");
        assert!(client.analyze_image("https://img.example.com/p.jpg").await.is_empty());
    }

    #[test]
    fn parse_tags_rejects_non_array_reply() {
        assert!(parse_tags("a stroller in a park").is_empty());
        assert!(parse_tags(r#"{"tags": ["toy"]}"#).is_empty());
    }

    #[test]
    fn parse_tags_caps_at_five_and_skips_non_strings() {
        let content = r#"["a", "b", 3, "c", "d", "e", "f"]"#;
        let tags = parse_tags(content);
        assert_eq!(tags, vec!["a", "b", "c", "d", "e"]);
    }
}
