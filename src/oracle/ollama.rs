//! Oracle backed by a local Ollama chat model

use super::{OracleDecision, StrategyOracle};
use crate::error::OracleError;
use crate::negotiation::NegotiationContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_MESSAGE: &str = "I am not sure how to respond.";

/// Configuration for the Ollama oracle
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "phi3".to_string(),
            temperature: 0.2,
        }
    }
}

/// Asks an Ollama-hosted model for a JSON decision each round
pub struct OllamaOracle {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaOracle {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: &'static str,
    options: ChatOptions,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[async_trait]
impl StrategyOracle for OllamaOracle {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn decide(&self, context: &NegotiationContext) -> Result<OracleDecision, OracleError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(context)?,
            }],
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::Transport(format!("HTTP {}", response.status())));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        tracing::debug!("Ollama replied: {}", chat.message.content);
        parse_decision(&chat.message.content)
    }
}

/// Render the round's context into the model prompt
pub fn build_prompt(context: &NegotiationContext) -> Result<String, OracleError> {
    let history = serde_json::to_string_pretty(&context.history)
        .map_err(|e| OracleError::Malformed(e.to_string()))?;
    let budget = context.budget;
    let ask = context.seller_offer;
    let previous = context.last_agent_offer_label();

    Ok(format!(
        r#"You negotiate on behalf of a buyer who wants to purchase "{product}".
Be rational, strategic and polite. Pay as little as possible.

Current situation:
- Round: {round}
- Maximum budget: {budget}
- Seller's current offer: {ask}
- Your previous offer: {previous}
- History (JSON):
{history}

Hard rules:
- Never offer or accept more than {budget}.
- A new counter offer must be higher than your previous offer ({previous}) and lower than the seller's current offer ({ask}).
- Reply with JSON only.

Strategy:
1. Open low, around 80-90% of the seller's first offer and well under budget.
2. Later concessions are small and signal that you are nearing your limit.
3. Accept only when the seller has conceded meaningfully and the price is within budget.
4. If the seller stays above budget, reject or counter at or below budget.
5. After three or four rounds you may call your offer final.
6. Give a short, polite reason for each offer.

Reply with a JSON object with exactly these keys:
- "action": "accept", "reject" or "counter"
- "message": a short polite note to the seller
- "offer_price": integer price for "counter" or "accept" (at most {budget}), null for "reject"

Example (seller offers 28000, budget 25000):
{{"action": "counter", "message": "That is more than I planned to spend. I can start at 23000.", "offer_price": 23000}}

Now answer the seller's offer of {ask}."#,
        product = context.product,
        round = context.round,
    ))
}

/// Parse the model's JSON reply into a decision.
///
/// Prices are taken as integers, integral floats or numeric strings under
/// `offer_price` or `offerPrice`; anything else is malformed.
pub fn parse_decision(raw: &str) -> Result<OracleDecision, OracleError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| OracleError::Malformed(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| OracleError::Malformed("reply is not a JSON object".to_string()))?;

    let action = object
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| OracleError::Malformed("missing \"action\"".to_string()))?;

    let message = object
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_MESSAGE);

    let price = object
        .get("offer_price")
        .or_else(|| object.get("offerPrice"))
        .map(parse_price)
        .transpose()?
        .flatten();

    Ok(OracleDecision::new(action, message, price))
}

fn parse_price(value: &Value) -> Result<Option<i64>, OracleError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                return Ok(Some(int));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(OracleError::Malformed(format!("price {} is not an integer", n))),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| OracleError::Malformed(format!("price {:?} is not an integer", s))),
        other => Err(OracleError::Malformed(format!("price {} is not a number", other))),
    }
}
