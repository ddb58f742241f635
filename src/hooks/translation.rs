//! AI translation hook: translates each transcription through an
//! OpenAI-compatible chat-completions endpoint.

use crate::error::{HearsayError, Result};
use crate::hooks::{Hook, HookContext, HookKind, HookResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Settings for the translation hook.
#[derive(Debug, Clone)]
pub struct TranslationSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub target_language: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub output_prefix: Option<String>,
    pub print_translation: bool,
    pub timeout: Duration,
}

/// Translates the transcription into a configured target language.
///
/// Auth, quota, and network failures are ordinary hook failures; the
/// surrounding session never notices beyond the recorded result.
pub struct AiTranslationHook {
    name: String,
    settings: TranslationSettings,
    endpoint: String,
    client: reqwest::Client,
}

impl AiTranslationHook {
    pub fn new(name: String, settings: TranslationSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| HearsayError::HookConfig {
                hook: name.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let endpoint = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );

        Ok(Self {
            name,
            settings,
            endpoint,
            client,
        })
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a professional translator. Translate the following text to {}. \
             Only return the translated text, no explanations.",
            self.settings.target_language
        )
    }
}

#[async_trait]
impl Hook for AiTranslationHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> HookKind {
        HookKind::AiTranslation
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    async fn execute(&self, ctx: &HookContext) -> HookResult {
        let request_body = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: ctx.text().to_string(),
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let response = match self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .json(&request_body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return HookResult::failure(format!("translation request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let shortened: String = body.trim().chars().take(200).collect();
            return HookResult::failure(format!(
                "translation API returned {}: {}",
                status.as_u16(),
                shortened
            ));
        }

        let parsed: ChatResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                return HookResult::failure(format!("failed to parse translation response: {}", e));
            }
        };

        let Some(choice) = parsed.choices.first() else {
            return HookResult::failure("translation response has no choices");
        };
        let translated = choice.message.content.trim();

        if self.settings.print_translation {
            match &self.settings.output_prefix {
                Some(prefix) => println!(
                    "{} [{}] {}",
                    prefix, self.settings.target_language, translated
                ),
                None => println!("[{}] {}", self.settings.target_language, translated),
            }
        }

        HookResult::ok(format!(
            "translated to {} ({} chars)",
            self.settings.target_language,
            translated.len()
        ))
    }
}
