#![forbid(unsafe_code)]
#![allow(dead_code)]

//! Shared setup for the integration tests.

use std::rc::Rc;

use fdialog::{DialogService, OpenDialogResult, Scope};
use fdialog_core::{DialogError, DialogOptions, DialogSettings, ViewModel, ViewModelRef};
use fdialog_harness::{RecordingRenderer, RegistryComposer, ScriptedViewModel};
use futures::executor::LocalPool;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Reference a scripted view-model instance.
pub fn instance(view_model: &Rc<ScriptedViewModel>) -> ViewModelRef {
    ViewModelRef::Instance(Rc::clone(view_model) as Rc<dyn ViewModel>)
}

/// Service over a [`RecordingRenderer`]; no document involved.
pub struct Rig {
    pub pool: LocalPool,
    pub scope: Scope,
    pub renderer: Rc<RecordingRenderer>,
    pub composer: Rc<RegistryComposer>,
    pub service: DialogService,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_options(DialogOptions::default())
    }

    pub fn with_options(options: DialogOptions) -> Self {
        init_tracing();
        let pool = LocalPool::new();
        let scope = Scope::new();
        let renderer = Rc::new(RecordingRenderer::new());
        let composer = Rc::new(RegistryComposer::new());
        let service = DialogService::new(
            scope.clone(),
            composer.clone(),
            renderer.clone(),
            Rc::new(pool.spawner()),
            options,
        );
        Self {
            pool,
            scope,
            renderer,
            composer,
            service,
        }
    }

    pub fn open(&mut self, settings: DialogSettings) -> Result<OpenDialogResult, DialogError> {
        let service = self.service.clone();
        self.pool
            .run_until(async move { service.open_and_yield_controller(settings).await })
    }
}
