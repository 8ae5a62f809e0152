#![forbid(unsafe_code)]

//! View-models with scripted hook outcomes.
//!
//! A [`ScriptedViewModel`] records every hook call and answers with the
//! verdict it was configured with. Any hook can also be made to fail or be
//! held open until the test releases it, which is how in-flight close
//! sequences are observed.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use fdialog_core::{DialogError, HookResult, LifecycleHook, LifecycleHooks, Value, ViewModel};
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture, Shared};

type Gate = Shared<LocalBoxFuture<'static, ()>>;

#[derive(Default)]
struct Script {
    verdicts: BTreeMap<u8, Option<bool>>,
    failures: BTreeMap<u8, String>,
    gates: BTreeMap<u8, (Gate, Option<oneshot::Sender<()>>)>,
}

fn slot(hook: LifecycleHook) -> u8 {
    hook.flag().bits()
}

/// A recorded hook call.
#[derive(Debug, Clone, PartialEq)]
pub enum HookCall {
    CanActivate(Option<Value>),
    Activate(Option<Value>),
    CanDeactivate(bool),
    Deactivate,
}

impl HookCall {
    pub fn hook(&self) -> LifecycleHook {
        match self {
            Self::CanActivate(_) => LifecycleHook::CanActivate,
            Self::Activate(_) => LifecycleHook::Activate,
            Self::CanDeactivate(_) => LifecycleHook::CanDeactivate,
            Self::Deactivate => LifecycleHook::Deactivate,
        }
    }
}

/// View-model whose hooks answer from a script.
pub struct ScriptedViewModel {
    name: String,
    hooks: LifecycleHooks,
    script: RefCell<Script>,
    calls: RefCell<Vec<HookCall>>,
    in_flight: Cell<usize>,
}

impl ScriptedViewModel {
    /// View-model implementing every hook, each answering "no opinion".
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: LifecycleHooks::all(),
            script: RefCell::new(Script::default()),
            calls: RefCell::new(Vec::new()),
            in_flight: Cell::new(0),
        }
    }

    /// Restrict the implemented hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Answer `hook` with `verdict` (`None` = returned nothing).
    #[must_use]
    pub fn answering(self, hook: LifecycleHook, verdict: Option<bool>) -> Self {
        self.set_verdict(hook, verdict);
        self
    }

    /// `can_deactivate` refuses every close.
    #[must_use]
    pub fn refusing_close(self) -> Self {
        self.answering(LifecycleHook::CanDeactivate, Some(false))
    }

    /// `can_activate` refuses to open.
    #[must_use]
    pub fn refusing_open(self) -> Self {
        self.answering(LifecycleHook::CanActivate, Some(false))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_verdict(&self, hook: LifecycleHook, verdict: Option<bool>) {
        self.script.borrow_mut().verdicts.insert(slot(hook), verdict);
    }

    /// Make `hook` fail with `message`.
    pub fn fail(&self, hook: LifecycleHook, message: impl Into<String>) {
        self.script
            .borrow_mut()
            .failures
            .insert(slot(hook), message.into());
    }

    /// Hold every call of `hook` until [`ScriptedViewModel::release`].
    pub fn hold(&self, hook: LifecycleHook) {
        let (open, wait) = oneshot::channel::<()>();
        let gate = wait.map(drop).boxed_local().shared();
        self.script
            .borrow_mut()
            .gates
            .insert(slot(hook), (gate, Some(open)));
    }

    /// Let held calls of `hook` continue.
    pub fn release(&self, hook: LifecycleHook) {
        if let Some((_, Some(open))) = self.script.borrow_mut().gates.remove(&slot(hook)) {
            let _ = open.send(());
        }
    }

    // --- Inspection ---

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.borrow().clone()
    }

    /// Number of calls of `hook`.
    pub fn count(&self, hook: LifecycleHook) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.hook() == hook)
            .count()
    }

    /// Hook calls currently suspended on a gate.
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    async fn answer(&self, call: HookCall) -> HookResult {
        let hook = call.hook();
        self.calls.borrow_mut().push(call);

        let gate = self
            .script
            .borrow()
            .gates
            .get(&slot(hook))
            .map(|(gate, _)| gate.clone());
        if let Some(gate) = gate {
            self.in_flight.set(self.in_flight.get() + 1);
            gate.await;
            self.in_flight.set(self.in_flight.get() - 1);
        }

        let script = self.script.borrow();
        if let Some(message) = script.failures.get(&slot(hook)) {
            return Err(DialogError::hook(hook, message.clone()));
        }
        Ok(script.verdicts.get(&slot(hook)).copied().flatten())
    }
}

#[async_trait(?Send)]
impl ViewModel for ScriptedViewModel {
    fn hooks(&self) -> LifecycleHooks {
        self.hooks
    }

    async fn can_activate(&self, model: Option<&Value>) -> HookResult {
        self.answer(HookCall::CanActivate(model.cloned())).await
    }

    async fn activate(&self, model: Option<&Value>) -> HookResult {
        self.answer(HookCall::Activate(model.cloned())).await
    }

    async fn can_deactivate(&self, ok: bool) -> HookResult {
        self.answer(HookCall::CanDeactivate(ok)).await
    }

    async fn deactivate(&self) -> HookResult {
        self.answer(HookCall::Deactivate).await
    }
}

impl fmt::Debug for ScriptedViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedViewModel")
            .field("name", &self.name)
            .field("hooks", &self.hooks)
            .field("calls", &self.calls.borrow().len())
            .finish_non_exhaustive()
    }
}
