use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

/// Anything that turns a prompt into a text reply
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    text: String,
}

pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl LanguageModel for ClaudeClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Claude API error ({}): {}", status, error_text);
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .context("Failed to parse Claude API response")?;

        Ok(claude_response
            .content
            .first()
            .map(|c| c.text.trim().to_string())
            .unwrap_or_default())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;

    #[test]
    fn test_request_serializes_messages_shape() {
        let request = ClaudeRequest {
            model: DEFAULT_MODEL,
            max_tokens: 600,
            messages: vec![Message {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], 600);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_response_takes_text_block() {
        let response: ClaudeResponse =
            serde_json::from_str(r#"{"content": [{"type": "text", "text": "{\"relevant\": false}"}]}"#)
                .unwrap();
        assert_eq!(response.content[0].text, "{\"relevant\": false}");
    }

    #[tokio::test]
    async fn test_scripted_model_replays_then_errors() {
        let model = ScriptedModel::new(["one"]);
        assert_eq!(model.complete("p1", 10).await.unwrap(), "one");
        assert!(model.complete("p2", 10).await.is_err());
        assert_eq!(model.calls(), 2);
        assert_eq!(model.prompts(), vec!["p1", "p2"]);
    }
}
