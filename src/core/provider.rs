//! Generative-text provider capability.
//!
//! The pipeline consumes an opaque `complete(system, user) -> text` call;
//! the concrete client speaks the OpenAI-compatible chat completions wire
//! format over reqwest. Call-level timeout policy lives here, not in the
//! pipeline.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::ProviderError;

pub const SYSTEM_PROMPT: &str = "你是一个哲学名言专家，专门从你的知识库中提取真实哲学家说过的经典名言。你只提供真实存在的、有历史记录的哲学家名言，绝不编造或创作新的内容。请优先选择较长的、具有深刻哲学思辨的语录，避免简短的格言式表达。";

/// Semantically-equivalent prompt variants; one is drawn uniformly at
/// random per attempt.
pub const PROMPT_VARIANTS: &[&str] = &[
    "请从你的知识库中提取一句真实哲学家说过的名言。要求：1）必须是历史上真实存在的哲学家说过的话，有历史记录或文献记载；2）内容富有深刻哲理，具有思辨性；3）中文表达，如果原文是外文请提供准确的中文翻译；4）长度必须在30字以上，优先选择50字以上的完整思想表达；5）选择能引发深度思考的完整语录，而非简短格言；6）可以是任何时代、任何文化背景的哲学家；7）返回格式：名言内容|作者姓名。",
    "请提供一句真实哲学家的深刻名言。要求：1）必须是历史上真实存在的哲学家说过或写过的话；2）内容深刻有启发性，具有哲学思辨色彩；3）用中文表达；4）长度必须在30字以上，要有完整的思想表达；5）选择较长的、具有深度思考价值的语录；6）不限制哲学家的时代、国籍或哲学流派；7）返回格式：名言内容|作者姓名。",
    "从世界哲学史上任意一位真实哲学家的言论中选择一句富有哲思的名言。要求：1）必须是有历史记录的真实名言；2）内容具有普世价值和深刻启发意义；3）中文表达；4）长度必须在30字以上，体现完整的哲学思辨；5）优先选择较长的、思想深刻的语录；6）可以是古代、近代或现代的任何哲学家；7）返回格式：名言内容|作者姓名。",
    "请提供一句来自真实哲学家的智慧名言。要求：1）必须是该哲学家真实的言论，有文献记录；2）内容富有智慧，具有深刻的人生哲理或思想洞察；3）使用现代中文表达；4）长度必须在30字以上，要有完整的思想表达；5）选择较长的、适合深度思考的语录；6）不限制哲学家的文化背景或哲学传统；7）返回格式：名言内容|作者姓名。",
    "从人类哲学思想宝库中选择一句真实哲学家的深刻名言。要求：1）必须是该哲学家真实写过或说过的话；2）内容深刻，具有强烈的哲学思辨色彩；3）中文表达；4）长度必须在30字以上，体现完整的思想深度；5）选择能引发关于人生、存在、道德、真理等深层思考的较长语录；6）可以来自任何哲学传统或思想流派；7）返回格式：名言内容|作者姓名。",
];

/// Immutable prompt pool with uniform-random selection. Tests inject a
/// single-variant pool for determinism.
#[derive(Clone)]
pub struct PromptPool {
    variants: Vec<String>,
}

impl PromptPool {
    pub fn new(variants: Vec<String>) -> Self {
        assert!(!variants.is_empty(), "prompt pool must not be empty");
        Self { variants }
    }

    pub fn pick(&self) -> &str {
        self.variants
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(&self.variants[0])
    }
}

impl Default for PromptPool {
    fn default() -> Self {
        Self::new(PROMPT_VARIANTS.iter().map(|s| s.to_string()).collect())
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ProviderError>;
}

// ── OpenAI-compatible request/response ──

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl QuoteProvider for OpenAiCompatProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ProviderError> {
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatRequestMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatRequestMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: 200,
            temperature: 0.8,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ProviderError::Api {
                status: res.status().as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        let parsed: ChatResponse = res.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(content.trim().to_string())
    }
}
