#![forbid(unsafe_code)]

//! Plugin configuration.
//!
//! ```ignore
//! let service = DialogConfiguration::new()
//!     .use_defaults(Rc::new(host))
//!     .use_composer(Rc::new(composer))
//!     .configure(|opts| opts.lock = false)
//!     .apply(&root_scope, Rc::new(pool.spawner()))?;
//! ```

use std::fmt;
use std::rc::Rc;

use fdialog_core::DialogOptions;
use futures::task::LocalSpawn;
use thiserror::Error;

use crate::composition::CompositionEngine;
use crate::renderer::{DialogHost, DialogRegistry, LayerRenderer, Renderer};
use crate::scope::Scope;
use crate::service::DialogService;

/// Why a configuration could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no dialog renderer configured")]
    MissingRenderer,
    #[error("no composition engine configured")]
    MissingComposer,
}

/// Builder for a [`DialogService`].
#[derive(Default)]
pub struct DialogConfiguration {
    renderer: Option<Rc<dyn Renderer>>,
    composer: Option<Rc<dyn CompositionEngine>>,
    options: DialogOptions,
}

impl DialogConfiguration {
    /// Start from the default options with no collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render into `host` with a [`LayerRenderer`] and a fresh registry.
    pub fn use_defaults<H: DialogHost + 'static>(self, host: Rc<H>) -> Self {
        let registry = Rc::new(DialogRegistry::new());
        self.use_renderer(Rc::new(LayerRenderer::new(host, registry)))
    }

    /// Use a custom renderer.
    #[must_use]
    pub fn use_renderer(mut self, renderer: Rc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Use a composition engine.
    #[must_use]
    pub fn use_composer(mut self, composer: Rc<dyn CompositionEngine>) -> Self {
        self.composer = Some(composer);
        self
    }

    /// Adjust the process-wide options.
    #[must_use]
    pub fn configure(mut self, f: impl FnOnce(&mut DialogOptions)) -> Self {
        f(&mut self.options);
        self
    }

    /// Replace the process-wide options.
    #[must_use]
    pub fn options(mut self, options: DialogOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the service and register it in `scope`.
    pub fn apply(
        self,
        scope: &Scope,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Result<DialogService, ConfigurationError> {
        let renderer = self.renderer.ok_or(ConfigurationError::MissingRenderer)?;
        let composer = self.composer.ok_or(ConfigurationError::MissingComposer)?;
        tracing::debug!(options = ?self.options, "dialog plugin configured");

        let service = DialogService::new(scope.clone(), composer, renderer, spawner, self.options);
        scope.register(service.clone());
        Ok(service)
    }
}

impl fmt::Debug for DialogConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogConfiguration")
            .field("renderer", &self.renderer.is_some())
            .field("composer", &self.composer.is_some())
            .field("options", &self.options)
            .finish()
    }
}
