#![forbid(unsafe_code)]

//! Headless collaborators for FrankenTUI dialogs.
//!
//! - [`MemoryHost`]: in-memory [`fdialog::DialogHost`] with manual
//!   transitions and failure injection.
//! - [`ScriptedViewModel`]: view-model with scripted, holdable hooks.
//! - [`RegistryComposer`]: name -> factory [`fdialog::CompositionEngine`].
//! - [`RecordingRenderer`]: document-less [`fdialog::Renderer`].
//! - [`DialogFixture`]: all of the above wired to a [`fdialog::DialogService`].

pub mod composer;
pub mod fixture;
pub mod host;
pub mod renderer;
pub mod view_model;

pub use composer::{AnchorSlot, BoundView, RegistryComposer};
pub use fixture::DialogFixture;
pub use host::{HostOp, MemoryHost, NodeKind};
pub use renderer::{RecordingRenderer, RenderCall};
pub use view_model::{HookCall, ScriptedViewModel};
