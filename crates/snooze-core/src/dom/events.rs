//! Synthetic events, user input events and element construction specs.

use serde::{Deserialize, Serialize};

/// Event interface used to construct a synthetic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pointer,
    Mouse,
    Plain,
}

/// A synthetic DOM event. All synthetic events bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyntheticEvent {
    pub kind: EventKind,
    pub event_type: &'static str,
    pub cancelable: bool,
}

impl SyntheticEvent {
    pub const POINTER_DOWN: Self = Self::pointer("pointerdown");
    pub const MOUSE_DOWN: Self = Self::mouse("mousedown");
    pub const POINTER_UP: Self = Self::pointer("pointerup");
    pub const MOUSE_UP: Self = Self::mouse("mouseup");
    pub const CLICK: Self = Self::mouse("click");
    pub const INPUT: Self = Self::plain("input");
    pub const CHANGE: Self = Self::plain("change");
    pub const BLUR: Self = Self::plain("blur");

    const fn pointer(event_type: &'static str) -> Self {
        Self {
            kind: EventKind::Pointer,
            event_type,
            cancelable: true,
        }
    }

    const fn mouse(event_type: &'static str) -> Self {
        Self {
            kind: EventKind::Mouse,
            event_type,
            cancelable: true,
        }
    }

    const fn plain(event_type: &'static str) -> Self {
        Self {
            kind: EventKind::Plain,
            event_type,
            cancelable: false,
        }
    }
}

/// Keys the injected text box reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    /// Any other key, by its DOM `key` name.
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }
}

/// User input on the injected text box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// The text changed; carries the full current value.
    Changed(String),
    /// A key was pressed.
    Key(Key),
    /// The text box lost focus.
    Blur,
}

/// Where [`HostDocument::insert`](super::HostDocument::insert) places a new element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertPosition {
    First,
    Last,
}

/// Behavior attached to an injected element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickAction {
    /// Remove the closest ancestor (or self) carrying this class.
    RemoveClosest(String),
}

/// Declarative description of an element tree to inject.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub on_click: Option<ClickAction>,
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn on_click(mut self, action: ClickAction) -> Self {
        self.on_click = Some(action);
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
