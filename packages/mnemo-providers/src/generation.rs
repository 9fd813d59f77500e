use serde_json::Value;

use crate::{Result, invalid_response};

/// Sends a single-turn chat completion to `model` and returns the reply text.
///
/// `model` is passed explicitly so callers can retry with the configured fallback model.
pub async fn generate(
	cfg: &mnemo_config::LlmProviderConfig,
	model: &str,
	prompt: &str,
) -> Result<String> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": model,
		"temperature": cfg.temperature,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let res = crate::client(cfg.timeout_ms)?
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion(json)
}

fn parse_completion(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(|content| content.as_str())
		.ok_or_else(|| invalid_response("Completion response is missing message content."))?;

	if content.trim().is_empty() {
		return Err(invalid_response("Completion content is empty."));
	}

	Ok(content.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_first_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "Hello there." } },
				{ "message": { "role": "assistant", "content": "ignored" } }
			]
		});

		assert_eq!(parse_completion(json).expect("parse failed"), "Hello there.");
	}

	#[test]
	fn rejects_blank_content() {
		let json = serde_json::json!({ "choices": [{ "message": { "content": "  " } }] });

		assert!(parse_completion(json).is_err());
	}
}
