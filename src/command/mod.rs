pub mod template;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// A seed parameter names a placeholder the template doesn't contain.
    #[error("parameter '{0}' not found in the command template")]
    ParameterNotInTemplate(String),
    #[error("expected {expected} argument(s), got {got}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
}

/// A stored shell command template plus the parameters extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// The raw command string, with zero or more `{{.name}}` placeholders.
    pub template: String,
    /// Parameters in order of first placeholder appearance.
    #[serde(default)]
    pub params: Vec<Parameter>,
}

/// Persistent metadata attached to one placeholder name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_value: String,
}

/// A transient name/value pair supplied at compile time. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub value: String,
}

/// Optional settings for `Command::new`.
#[derive(Debug, Default)]
pub struct Options {
    /// Seed parameters carrying descriptions and defaults. Every name must
    /// appear as a placeholder in the template.
    pub params: Vec<Parameter>,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Parameter {
            id: Uuid::now_v7(),
            name: name.to_string(),
            description: String::new(),
            default_value: String::new(),
        }
    }
}

impl Argument {
    pub fn new(name: &str, value: &str) -> Self {
        Argument {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl Command {
    /// Creates a new command. Without seed parameters the list is derived
    /// from the template; with them, every seed name is validated against
    /// the template's placeholders.
    pub fn new(
        name: &str,
        description: &str,
        template: &str,
        opts: Options,
    ) -> Result<Self, CommandError> {
        let mut cmd = Command {
            id: Uuid::now_v7(),
            name: name.to_string(),
            description: description.to_string(),
            template: template.to_string(),
            params: Vec::new(),
        };

        if opts.params.is_empty() {
            cmd.build();
            return Ok(cmd);
        }

        let known: HashSet<String> = template::parse_parameters(template)
            .into_iter()
            .map(|p| p.name)
            .collect();

        for param in opts.params {
            if !known.contains(&param.name) {
                return Err(CommandError::ParameterNotInTemplate(param.name));
            }
            cmd.params.push(param);
        }

        cmd.build();
        Ok(cmd)
    }

    /// Idempotent normalization.
    ///
    /// Ensures the id is set and rebuilds the parameter list from the
    /// template: one entry per distinct placeholder name, in order of first
    /// appearance. Metadata is preserved by name from the previous list;
    /// names appearing for the first time get fresh ids, names no longer
    /// present are dropped. Renaming a placeholder therefore discards the
    /// old parameter's description and default.
    pub fn build(&mut self) {
        if self.id.is_nil() {
            self.id = Uuid::now_v7();
        }

        let mut seen = HashSet::new();
        let mut rebuilt = Vec::new();
        for parsed in template::parse_parameters(&self.template) {
            if !seen.insert(parsed.name.clone()) {
                continue;
            }

            match self.params.iter().find(|p| p.name == parsed.name) {
                Some(existing) => rebuilt.push(existing.clone()),
                None => rebuilt.push(parsed),
            }
        }

        self.params = rebuilt;
    }

    /// Renders the template with the given arguments.
    ///
    /// Requires exactly one argument per parameter; every argument name must
    /// match a parameter name.
    pub fn compile(&mut self, args: &[Argument]) -> Result<String, CommandError> {
        self.build();

        if args.len() != self.params.len() {
            return Err(CommandError::ArityMismatch {
                expected: self.params.len(),
                got: args.len(),
            });
        }

        let names: HashSet<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        let mut values = HashMap::with_capacity(args.len());
        for arg in args {
            if !names.contains(arg.name.as_str()) {
                return Err(CommandError::UnknownArgument(arg.name.clone()));
            }
            values.insert(arg.name.clone(), arg.value.clone());
        }

        Ok(template::render(&self.template, &values))
    }
}
