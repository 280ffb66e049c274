//! Credential/session gate.
//!
//! The studio never handles key material itself; it only needs to know
//! whether a usable credential is currently selected, to be able to ask
//! the surrounding environment to select one, and to drop its cached
//! "key is valid" state when the service reports an authorization failure.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::GenAiError;

/// Marker the generation service includes in authorization failures.
///
/// A failure message containing this marker means the selected credential
/// can no longer be trusted; cached validity must be invalidated so the
/// next attempt re-prompts for key selection.
pub const ENTITY_NOT_FOUND_MARKER: &str = "Requested entity was not found";

/// True when a failure message indicates the authorization/entity-not-found
/// condition.
pub fn is_entity_not_found(message: &str) -> bool {
    message.contains(ENTITY_NOT_FOUND_MARKER)
}

/// Gate consulted before any generator call.
#[async_trait]
pub trait CredentialGate: Send + Sync {
    /// Whether a usable credential is currently selected.
    async fn is_key_selected(&self) -> bool;

    /// Ask the environment to prompt the user for key selection.
    async fn prompt_select(&self) -> Result<(), GenAiError>;

    /// Drop the cached validity state, forcing re-selection.
    async fn invalidate(&self);
}

/// In-memory gate caching a single validity flag.
///
/// Environments with a real key-selection dialog wrap this with their own
/// prompt; tests use it directly.
#[derive(Debug)]
pub struct MemoryCredentialGate {
    selected: AtomicBool,
}

impl MemoryCredentialGate {
    pub fn new(selected: bool) -> Self {
        Self {
            selected: AtomicBool::new(selected),
        }
    }
}

#[async_trait]
impl CredentialGate for MemoryCredentialGate {
    async fn is_key_selected(&self) -> bool {
        self.selected.load(Ordering::SeqCst)
    }

    async fn prompt_select(&self) -> Result<(), GenAiError> {
        // No dialog here; prompting marks the cached state valid, the way
        // the hosting picker reports success once its dialog closes.
        self.selected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn invalidate(&self) {
        self.selected.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
