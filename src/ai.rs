use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Marks where a prompt's templated draft begins.
pub const DRAFT_MARKER: &str = "Draft:\n";

/// Text produced by a generator, always in this shape whichever backend wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub model: String,
}

pub trait TextGenerator {
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<Generation>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Template,
    Anthropic,
    OpenAI,
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model_id: String,
}

pub fn resolve_model(name: &str) -> Result<ModelSpec> {
    let (provider, model_id) = match name {
        "template" | "offline" => (ProviderKind::Template, "template"),
        "api-sonnet" | "sonnet" => (ProviderKind::Anthropic, "claude-sonnet-4-5-20250929"),
        "api-haiku" | "haiku" => (ProviderKind::Anthropic, "claude-haiku-4-5-20251001"),
        "gpt-4o" => (ProviderKind::OpenAI, "gpt-4o"),
        "gpt-4o-mini" => (ProviderKind::OpenAI, "gpt-4o-mini"),
        _ => {
            return Err(anyhow!(
                "Unknown model '{}'. Available: template (default), api-sonnet, api-haiku, gpt-4o, gpt-4o-mini",
                name
            ))
        }
    };
    Ok(ModelSpec {
        provider,
        model_id: model_id.to_string(),
    })
}

pub fn create_generator(spec: &ModelSpec) -> Result<Box<dyn TextGenerator>> {
    match spec.provider {
        ProviderKind::Template => Ok(Box::new(TemplateGenerator)),
        ProviderKind::Anthropic | ProviderKind::OpenAI => {
            Ok(Box::new(ApiGenerator::new(spec.provider.clone(), spec.model_id.clone())?))
        }
    }
}

/// Replaces each `{key}` in `template` with its value.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

// --- Offline generator ---

/// Works without network access: returns the templated draft carried in the prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateGenerator;

impl TextGenerator for TemplateGenerator {
    fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<Generation> {
        let text = match prompt.rfind(DRAFT_MARKER) {
            Some(idx) => &prompt[idx + DRAFT_MARKER.len()..],
            None => prompt,
        };
        Ok(Generation {
            text: text.trim().to_string(),
            model: self.model_name().to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "template"
    }
}

// --- Hosted chat APIs ---

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Request body accepted by both hosted APIs.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct AnthropicReply {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIReply {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

/// Generator backed by the Anthropic or OpenAI HTTP API. The key comes from
/// `ANTHROPIC_API_KEY` or `OPENAI_API_KEY`.
#[derive(Debug)]
pub struct ApiGenerator {
    provider: ProviderKind,
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl ApiGenerator {
    pub fn new(provider: ProviderKind, model_id: String) -> Result<Self> {
        let key_var = match provider {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Template => return Err(anyhow!("template model has no API backend")),
        };
        let api_key = env::var(key_var).with_context(|| format!("{} environment variable not set", key_var))?;
        Ok(Self {
            provider,
            api_key,
            model_id,
            client: reqwest::blocking::Client::new(),
        })
    }

    fn label(&self) -> &'static str {
        match self.provider {
            ProviderKind::OpenAI => "OpenAI",
            _ => "Anthropic",
        }
    }

    fn post(&self, body: &ChatRequest) -> Result<reqwest::blocking::Response> {
        let request = match self.provider {
            ProviderKind::OpenAI => self.client.post(OPENAI_API_URL).bearer_auth(&self.api_key),
            _ => self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01"),
        };
        let response = request
            .json(body)
            .send()
            .with_context(|| format!("Failed to reach the {} API", self.label()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(anyhow!("{} API returned {}: {}", self.label(), status, detail));
        }
        Ok(response)
    }
}

impl TextGenerator for ApiGenerator {
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<Generation> {
        let body = ChatRequest {
            model: &self.model_id,
            max_tokens,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response = self.post(&body)?;

        let text = match self.provider {
            ProviderKind::OpenAI => response
                .json::<OpenAIReply>()
                .context("Malformed OpenAI reply")?
                .choices
                .into_iter()
                .find_map(|choice| choice.message.content),
            _ => response
                .json::<AnthropicReply>()
                .context("Malformed Anthropic reply")?
                .content
                .into_iter()
                .find_map(|block| block.text),
        };

        text.map(|text| Generation {
            text,
            model: self.model_id.clone(),
        })
        .ok_or_else(|| anyhow!("{} reply contained no text", self.label()))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
