//! Element locators for the host mail UI.
//!
//! A [`Selector`] is a small typed subset of CSS: an optional tag name plus a
//! list of attribute predicates. It renders to a CSS string for browser
//! backends and matches element data directly for in-memory hosts.
//! [`Locators`] bundles every selector the automation needs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrOp {
    /// `[name="value"]`
    Equals,
    /// `[name*="value"]`
    Contains,
    /// `[name~="value"]` (whitespace separated word, used for classes)
    Word,
    /// `[name]`
    Present,
}

/// One attribute predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrPredicate {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
}

impl AttrPredicate {
    fn matches(&self, actual: Option<&str>) -> bool {
        match (self.op, actual) {
            (_, None) => false,
            (AttrOp::Present, Some(_)) => true,
            (AttrOp::Equals, Some(v)) => v == self.value,
            (AttrOp::Contains, Some(v)) => v.contains(&self.value),
            (AttrOp::Word, Some(v)) => v.split_whitespace().any(|w| w == self.value),
        }
    }

    fn to_css(&self) -> String {
        let op = match self.op {
            AttrOp::Equals => "=",
            AttrOp::Contains => "*=",
            AttrOp::Word => "~=",
            AttrOp::Present => return format!("[{}]", self.name),
        };
        format!("[{}{}\"{}\"]", self.name, op, escape_css_string(&self.value))
    }
}

/// A typed element selector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selector {
    tag: Option<String>,
    attrs: Vec<AttrPredicate>,
}

impl Selector {
    /// Match any element.
    pub fn any() -> Self {
        Self::default()
    }

    /// Match elements with the given tag name.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into().to_ascii_lowercase()),
            attrs: Vec::new(),
        }
    }

    /// Require `name` to equal `value`.
    pub fn attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, AttrOp::Equals, value)
    }

    /// Require `name` to contain `value`.
    pub fn attr_contains(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, AttrOp::Contains, value)
    }

    /// Require the attribute to be present.
    pub fn has_attr(self, name: impl Into<String>) -> Self {
        self.with(name, AttrOp::Present, "")
    }

    /// Require a class name.
    pub fn class(self, class: impl Into<String>) -> Self {
        self.with("class", AttrOp::Word, class)
    }

    fn with(mut self, name: impl Into<String>, op: AttrOp, value: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate {
            name: name.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Tag name constraint, if any.
    pub fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Attribute predicates.
    pub fn predicates(&self) -> &[AttrPredicate] {
        &self.attrs
    }

    /// Test an element given its tag name and an attribute lookup.
    pub fn matches<'a, F>(&self, tag: &str, attr: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        if let Some(ref wanted) = self.tag {
            if !wanted.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.attrs.iter().all(|p| p.matches(attr(p.name.as_str())))
    }

    /// Render as a CSS selector string.
    pub fn to_css(&self) -> String {
        let mut css = match self.tag {
            Some(ref tag) => tag.clone(),
            None => "*".to_string(),
        };
        for predicate in &self.attrs {
            css.push_str(&predicate.to_css());
        }
        css
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Every selector and phrase the automation uses to find host elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locators {
    /// The open snooze menu.
    pub menu: Selector,
    /// Items inside the menu.
    pub menu_item: Selector,
    /// Controls that open the menu, in priority order.
    pub triggers: Vec<Selector>,
    /// Text of the item that opens the date & time dialog.
    pub pick_phrase: String,
    /// The date & time dialog.
    pub modal: Selector,
    /// Date input inside the dialog.
    pub date_input: Selector,
    /// Time input inside the dialog.
    pub time_input: Selector,
    /// Submit control, by data attribute.
    pub submit: Selector,
    /// Exact visible text of the submit button, used when `submit` misses.
    pub submit_text: String,
    /// Class of the injected natural-language text box.
    pub surface_class: String,
    /// Class of the success toast.
    pub toast_class: String,
}

impl Default for Locators {
    fn default() -> Self {
        Self::for_labels("Snooze menu", "Snooze", "Pick date & time", "Save")
    }
}

impl Locators {
    /// Build locators for a host UI that uses the given labels.
    pub fn for_labels(
        menu_label: &str,
        trigger_label: &str,
        pick_phrase: &str,
        submit_text: &str,
    ) -> Self {
        Self {
            menu: Selector::any()
                .attr("role", "menu")
                .attr("aria-label", menu_label),
            menu_item: Selector::any().attr("role", "menuitem"),
            triggers: vec![
                Selector::tag("button").attr("aria-label", trigger_label),
                Selector::tag("div").attr("aria-label", trigger_label),
                Selector::any().attr("data-tooltip", trigger_label),
                Selector::any().attr_contains("aria-label", trigger_label),
                Selector::any().attr_contains("data-tooltip", trigger_label),
            ],
            pick_phrase: pick_phrase.to_string(),
            modal: Selector::tag("div")
                .attr("role", "dialog")
                .attr("aria-modal", "true"),
            date_input: Selector::tag("input").attr("aria-label", "Date"),
            time_input: Selector::tag("input").attr("aria-label", "Time"),
            submit: Selector::tag("button").attr("data-mdc-dialog-action", "ok"),
            submit_text: submit_text.to_string(),
            surface_class: "snooze-nl-input".to_string(),
            toast_class: "snooze-nl-toast".to_string(),
        }
    }

    /// Any button, scanned for `submit_text` when `submit` misses.
    pub fn buttons(&self) -> Selector {
        Selector::tag("button")
    }

    /// The injected text box.
    pub fn surface(&self) -> Selector {
        Selector::any().class(self.surface_class.clone())
    }

    /// The success toast.
    pub fn toast(&self) -> Selector {
        Selector::any().class(self.toast_class.clone())
    }
}
