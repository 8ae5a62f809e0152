#![forbid(unsafe_code)]

//! Fully wired dialog stack over a [`MemoryHost`].

use std::future::Future;
use std::rc::Rc;

use fdialog::{
    DialogEvent, DialogRegistry, DialogService, EventOutcome, LayerRenderer, OpenDialogResult,
    Scope,
};
use fdialog_core::{DialogError, DialogOptions, DialogSettings, NodeId};
use futures::executor::LocalPool;

use crate::composer::RegistryComposer;
use crate::host::MemoryHost;

/// Service, layer renderer, composer and host sharing one local executor.
///
/// Fields are public so tests can drive the pool while borrowing the rest.
pub struct DialogFixture {
    pub pool: LocalPool,
    pub scope: Scope,
    pub host: Rc<MemoryHost>,
    pub registry: Rc<DialogRegistry>,
    pub renderer: Rc<LayerRenderer<MemoryHost>>,
    pub composer: Rc<RegistryComposer>,
    pub service: DialogService,
}

impl Default for DialogFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogFixture {
    pub fn new() -> Self {
        Self::with_options(DialogOptions::default())
    }

    pub fn with_options(options: DialogOptions) -> Self {
        Self::with_host(MemoryHost::new(), options)
    }

    pub fn with_host(host: MemoryHost, options: DialogOptions) -> Self {
        let pool = LocalPool::new();
        let scope = Scope::new();
        let host = Rc::new(host);
        let registry = Rc::new(DialogRegistry::new());
        let renderer = Rc::new(LayerRenderer::new(Rc::clone(&host), Rc::clone(&registry)));
        let composer = Rc::new(RegistryComposer::new());
        let service = DialogService::new(
            scope.clone(),
            composer.clone(),
            renderer.clone(),
            Rc::new(pool.spawner()),
            options,
        );
        scope.register(service.clone());

        Self {
            pool,
            scope,
            host,
            registry,
            renderer,
            composer,
            service,
        }
    }

    /// Drive `future` (and every spawned task) to completion.
    pub fn run<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }

    /// Run spawned tasks until none can make progress.
    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Open with the controller yielded; waits for the dialog to be shown.
    pub fn open(&mut self, settings: DialogSettings) -> Result<OpenDialogResult, DialogError> {
        let service = self.service.clone();
        self.pool
            .run_until(async move { service.open_and_yield_controller(settings).await })
    }

    /// Release the Escape key and let the resulting close run.
    pub fn press_escape(&mut self) -> EventOutcome {
        let outcome = self.renderer.handle_event(&DialogEvent::escape_released());
        self.settle();
        outcome
    }

    /// Click the backdrop of `container` and let the resulting close run.
    pub fn click_backdrop(&mut self, container: NodeId) -> EventOutcome {
        let outcome = self
            .renderer
            .handle_event(&DialogEvent::backdrop_click(container));
        self.settle();
        outcome
    }
}
