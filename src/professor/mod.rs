pub mod openai;

use log::debug;
use thiserror::Error;

use crate::command::Command;

pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum ProfessorError {
    /// The provider returned zero completions.
    #[error("no response from the explanation source")]
    NoResponse,
    #[error("error prompting the explanation source: {0}")]
    Request(String),
    #[error("explanation source rejected the request: {0}")]
    Api(String),
}

/// Source of explanations. Implementations send an instruction + template
/// pair to a provider and return its first completion.
pub trait Source {
    fn prompt(&self, prompt: &str) -> Result<String, ProfessorError>;
}

/// Produces Markdown explanations of commands by prompting a source with
/// the raw command template.
pub struct Professor {
    source: Box<dyn Source>,
}

impl Professor {
    pub fn new(source: Box<dyn Source>) -> Self {
        Professor { source }
    }

    pub fn explain(&self, cmd: &Command) -> Result<String, ProfessorError> {
        debug!("requesting explanation for command {}", cmd.id);
        self.source.prompt(&cmd.template)
    }
}
