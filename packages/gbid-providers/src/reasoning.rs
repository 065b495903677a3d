use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Sends one user turn to a messages-style endpoint and returns the reply text.
pub async fn reason(
	cfg: &gbid_config::LlmProviderConfig,
	prompt: &str,
	max_output_tokens: u32,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"max_tokens": max_output_tokens,
		"temperature": cfg.temperature,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.auth, &cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = crate::check_status(res, "Reasoning request").await?.json().await?;

	parse_reasoning_response(json)
}

/// Accepts both `content: [{type: "text", text}]` and `choices[0].message.content` replies.
pub fn parse_reasoning_response(json: Value) -> Result<String> {
	if let Some(blocks) = json.get("content").and_then(|v| v.as_array()) {
		let text = blocks
			.iter()
			.filter(|block| block.get("type").and_then(|v| v.as_str()).unwrap_or("text") == "text")
			.filter_map(|block| block.get("text").and_then(|v| v.as_str()))
			.collect::<Vec<_>>()
			.join("");

		if !text.trim().is_empty() {
			return Ok(text);
		}
	}
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		&& !content.trim().is_empty()
	{
		return Ok(content.to_string());
	}

	Err(Error::InvalidResponse {
		message: "Reasoning response is missing text content.".to_string(),
	})
}
