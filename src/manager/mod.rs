use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::command::Command;
use crate::db::{Store, StoreError, Usage};
use crate::professor::{Professor, ProfessorError};

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("invalid command id '{0}'")]
    InvalidId(String),
    #[error("element not found")]
    ElementNotFound,
    /// Explanation operations require a configured professor.
    #[error("explanation source not configured")]
    SourceNotConfigured,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Professor(#[from] ProfessorError),
    #[error("error encoding explanation: {0}")]
    Encode(String),
    #[error("error decoding explanation: {0}")]
    Decode(String),
}

/// Coordinates the command model, the store and the optional explanation
/// source. The only layer the UI talks to.
pub struct Manager {
    store: Store,
    professor: Option<Professor>,
}

impl Manager {
    pub fn new(store: Store) -> Self {
        Manager {
            store,
            professor: None,
        }
    }

    pub fn with_professor(store: Store, professor: Professor) -> Self {
        Manager {
            store,
            professor: Some(professor),
        }
    }

    /// Mints a fresh id for the command, persists it and returns it.
    pub fn add(&mut self, mut cmd: Command) -> Result<Command, ManagerError> {
        cmd.id = Uuid::now_v7();
        self.store.save(&cmd)?;
        Ok(cmd)
    }

    pub fn get_one(&self, raw_id: &str) -> Result<Command, ManagerError> {
        let id = parse_id(raw_id)?;
        Ok(self.store.get_command_by_id(id)?)
    }

    pub fn search(&self, term: &str) -> Result<Vec<Command>, ManagerError> {
        Ok(self.store.search_command(term)?)
    }

    pub fn get_all(&self) -> Result<Vec<Command>, ManagerError> {
        Ok(self.store.list_commands()?)
    }

    pub fn delete_command(&mut self, raw_id: &str) -> Result<(), ManagerError> {
        let id = parse_id(raw_id)?;
        Ok(self.store.delete_command(id)?)
    }

    /// Persists an edited command.
    ///
    /// Parameters are diffed against the stored version by name: a stored
    /// parameter whose name no longer appears in the new set is deleted.
    /// Save and deletion run in one store transaction.
    pub fn update_command(&mut self, cmd: &Command) -> Result<Command, ManagerError> {
        let current = self.store.get_command_by_id(cmd.id)?;

        let stale: Vec<Uuid> = current
            .params
            .iter()
            .filter(|old| !cmd.params.iter().any(|new| new.name == old.name))
            .map(|old| old.id)
            .collect();

        self.store.update_command(cmd, &stale)?;
        Ok(cmd.clone())
    }

    /// Returns the explanation for a command, consulting the cache first
    /// and prompting the source on a miss. A fetched explanation is written
    /// through the cache before being returned.
    pub fn explain(&mut self, cmd: &Command) -> Result<String, ManagerError> {
        let professor = self
            .professor
            .as_ref()
            .ok_or(ManagerError::SourceNotConfigured)?;

        match self.read_explanation(cmd.id) {
            Ok(text) => {
                debug!("explanation for {} served from cache", cmd.id);
                return Ok(text);
            }
            Err(ManagerError::ElementNotFound) => {}
            Err(err) => return Err(err),
        }

        let text = professor.explain(cmd)?;
        self.write_explanation(cmd.id, &text)?;
        Ok(text)
    }

    /// Compresses and stores the explanation text for a command.
    pub fn write_explanation(&mut self, command_id: Uuid, text: &str) -> Result<(), ManagerError> {
        if self.professor.is_none() {
            return Err(ManagerError::SourceNotConfigured);
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(text.as_bytes())
            .map_err(|e| ManagerError::Encode(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| ManagerError::Encode(e.to_string()))?;

        let encoded = BASE64.encode(compressed);
        self.store.write_explanation(command_id, &encoded)?;
        Ok(())
    }

    /// Reads back the explanation for a command, byte-for-byte as written.
    pub fn read_explanation(&self, command_id: Uuid) -> Result<String, ManagerError> {
        if self.professor.is_none() {
            return Err(ManagerError::SourceNotConfigured);
        }

        let encoded = match self.store.read_explanation(command_id) {
            Ok(text) => text,
            Err(StoreError::NotFound) => return Err(ManagerError::ElementNotFound),
            Err(err) => return Err(err.into()),
        };

        let compressed = BASE64
            .decode(encoded)
            .map_err(|e| ManagerError::Decode(e.to_string()))?;

        let mut text = String::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_string(&mut text)
            .map_err(|e| ManagerError::Decode(e.to_string()))?;
        Ok(text)
    }

    /// Evicts the cached explanation. A miss is tolerated.
    pub fn delete_explanation(&mut self, command_id: Uuid) -> Result<(), ManagerError> {
        if self.professor.is_none() {
            return Err(ManagerError::SourceNotConfigured);
        }

        match self.store.delete_explanation(command_id) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => {
                debug!("no cached explanation for {}", command_id);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Best-effort usage recording; failures are logged, never surfaced.
    pub fn insert_usage(&mut self, command_id: Uuid, compiled: &str) {
        if let Err(err) = self.store.insert_usage(command_id, compiled) {
            warn!("failed to record usage for {}: {}", command_id, err);
        }
    }

    pub fn get_history(&self, command_id: Uuid) -> Result<Vec<Usage>, ManagerError> {
        Ok(self.store.get_history(command_id)?)
    }

    pub fn has_professor(&self) -> bool {
        self.professor.is_some()
    }

    /// Releases the underlying store handle.
    pub fn close(self) -> Result<(), ManagerError> {
        Ok(self.store.close()?)
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ManagerError> {
    Uuid::parse_str(raw).map_err(|_| ManagerError::InvalidId(raw.to_string()))
}
