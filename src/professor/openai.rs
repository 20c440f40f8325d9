use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{ProfessorError, Source};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default instructional preamble sent ahead of the raw template. The
/// `customPrompt` config field replaces it wholesale.
const DEFAULT_PREAMBLE: &str = "Explain the given shell command in markdown \
with the headings summary, breakdown, example of use and cautions. The \
command may contain placeholders of the form {{.name}} that stand for \
user-supplied values; do not explain how to replace them. The command is:";

/// Optional settings for `OpenAiClient::new`.
#[derive(Debug, Default)]
pub struct OpenAiOptions {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub preamble: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    preamble: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, opts: OpenAiOptions) -> Result<Self, ProfessorError> {
        let client = Client::builder()
            .timeout(PROMPT_TIMEOUT)
            .build()
            .map_err(|e| ProfessorError::Request(e.to_string()))?;

        Ok(OpenAiClient {
            client,
            base_url: opts
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: api_key.to_string(),
            model: opts.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            preamble: opts
                .preamble
                .unwrap_or_else(|| DEFAULT_PREAMBLE.to_string()),
        })
    }
}

impl Source for OpenAiClient {
    fn prompt(&self, prompt: &str) -> Result<String, ProfessorError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "user",
                    content: &self.preamble,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        debug!("prompting {} with model {}", url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| ProfessorError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ProfessorError::Api(format!("{status}: {body}")));
        }

        let completion: ChatResponse = response
            .json()
            .map_err(|e| ProfessorError::Request(e.to_string()))?;

        match completion.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content),
            None => Err(ProfessorError::NoResponse),
        }
    }
}
