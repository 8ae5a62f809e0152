#![forbid(unsafe_code)]

//! Input events routed to the renderer.

use fdialog_core::NodeId;

use crate::controller::DialogId;

/// Key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Enter,
    Tab,
    Char(char),
    /// Any other key, by host key code.
    Other(u32),
}

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Release,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a key event.
    pub const fn new(code: KeyCode, kind: KeyEventKind) -> Self {
        Self { code, kind }
    }
}

/// A click that landed on a dialog container.
///
/// `on_content` is set when the click originated inside the dialog's own
/// content rather than on the surrounding backdrop area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClickEvent {
    pub container: NodeId,
    pub on_content: bool,
}

/// Events the renderer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogEvent {
    Key(KeyEvent),
    Click(ClickEvent),
}

impl DialogEvent {
    /// Escape key released (the event dialogs close on).
    pub const fn escape_released() -> Self {
        Self::Key(KeyEvent::new(KeyCode::Escape, KeyEventKind::Release))
    }

    /// Click on the backdrop area of `container`.
    pub const fn backdrop_click(container: NodeId) -> Self {
        Self::Click(ClickEvent {
            container,
            on_content: false,
        })
    }

    /// Click inside the content of `container`.
    pub const fn content_click(container: NodeId) -> Self {
        Self::Click(ClickEvent {
            container,
            on_content: true,
        })
    }
}

/// What the renderer did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// No dialog reacted.
    Ignored,
    /// A cancel was requested for this dialog.
    Cancelling(DialogId),
}

impl EventOutcome {
    /// The dialog being cancelled, if any.
    pub fn cancelled(self) -> Option<DialogId> {
        match self {
            Self::Ignored => None,
            Self::Cancelling(id) => Some(id),
        }
    }
}
