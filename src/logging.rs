//! Injectable logging capability.
//!
//! Services emit their diagnostics through a [`Logger`] handed to them at
//! construction, so a caller (or a test) can route them to a dedicated
//! subscriber or silence them without touching global state.

use tracing::dispatcher::{self, Dispatch};

/// Routes `tracing` events emitted by a service.
#[derive(Clone, Default)]
pub struct Logger {
    dispatch: Option<Dispatch>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("scoped", &self.dispatch.is_some())
            .finish()
    }
}

impl Logger {
    /// Emit through whatever subscriber is globally installed.
    pub fn global() -> Self {
        Self::default()
    }

    /// Discard everything.
    pub fn silent() -> Self {
        Self {
            dispatch: Some(Dispatch::none()),
        }
    }

    /// Emit through the given dispatcher.
    pub fn with_dispatch(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Run `f`, sending any events it emits to this logger's subscriber.
    pub fn emit<F: FnOnce()>(&self, f: F) {
        match &self.dispatch {
            Some(dispatch) => dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}
