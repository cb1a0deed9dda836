//! Protocol extensions
//!
//! An extension contributes a request-dispatch object, the struct type of its
//! setup reply, and tables mapping event and error codes to view types. The
//! core protocol is registered like any other extension, once, into a
//! [`Registry`] that connections share.

use crate::error::RegistrationError;
use crate::protocol::{ViewKind, ViewType};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Event code -> view type
pub type EventTable = HashMap<u8, ViewType>;

/// Error code -> view type
pub type ErrorTable = HashMap<u8, ViewType>;

/// Name-keyed extension identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionKey {
    name: String,
}

impl ExtensionKey {
    pub fn new(name: impl Into<String>) -> Self {
        ExtensionKey { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ExtensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Request-dispatch object for one protocol extension
pub trait Extension: fmt::Debug + Send + Sync {
    fn key(&self) -> &ExtensionKey;
}

/// The registered core protocol
#[derive(Debug, Clone)]
pub struct Core {
    pub extension: Arc<dyn Extension>,
    pub setup: ViewType,
    pub events: EventTable,
    pub errors: ErrorTable,
}

/// Extension registry, written once and read by every connection sharing it
#[derive(Debug, Default)]
pub struct Registry {
    core: OnceLock<Core>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the core protocol.
    ///
    /// All arguments are validated before anything is stored. A registry
    /// accepts exactly one core; later attempts fail and leave it as it was.
    pub fn add_core(
        &self,
        extension: Arc<dyn Extension>,
        setup: ViewType,
        events: EventTable,
        errors: ErrorTable,
    ) -> Result<(), RegistrationError> {
        if extension.key().name().is_empty() {
            return Err(RegistrationError::EmptyExtensionName);
        }
        if setup.kind != ViewKind::Struct {
            return Err(RegistrationError::SetupNotStruct {
                name: setup.name,
                kind: setup.kind,
            });
        }
        if let Some((&code, ty)) = events.iter().find(|(_, ty)| ty.kind != ViewKind::Event) {
            return Err(RegistrationError::EventKindMismatch { code, kind: ty.kind });
        }
        if let Some((&code, ty)) = errors.iter().find(|(_, ty)| ty.kind != ViewKind::Error) {
            return Err(RegistrationError::ErrorKindMismatch { code, kind: ty.kind });
        }

        let name = extension.key().name().to_string();
        let core = Core {
            extension,
            setup,
            events,
            errors,
        };
        self.core
            .set(core)
            .map_err(|_| RegistrationError::AlreadyRegistered { name: name.clone() })?;

        log::debug!("Registered core extension {}", name);
        Ok(())
    }

    /// The core protocol, once registered
    pub fn core(&self) -> Option<&Core> {
        self.core.get()
    }

    pub fn core_extension(&self) -> Option<&Arc<dyn Extension>> {
        self.core().map(|core| &core.extension)
    }

    pub fn setup_type(&self) -> Option<&ViewType> {
        self.core().map(|core| &core.setup)
    }

    pub fn event_type(&self, code: u8) -> Option<&ViewType> {
        self.core().and_then(|core| core.events.get(&code))
    }

    pub fn error_type(&self, code: u8) -> Option<&ViewType> {
        self.core().and_then(|core| core.errors.get(&code))
    }
}
