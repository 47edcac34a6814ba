//! Menu trigger.
//!
//! Opens the snooze menu if needed and activates its "pick date & time"
//! item. Host click handlers listen to different subsets of pointer and
//! mouse events, so every activation is the full gesture from
//! [`activate`].

use std::time::Duration;

use tracing::{debug, trace};

use crate::dom::{HostDocument, NodeId, SyntheticEvent};
use crate::error::DomError;
use crate::locator::Locators;
use crate::waiter::wait_for;

/// Synthetic events of one activation gesture, in dispatch order. A native
/// `click()` follows them.
pub const ACTIVATION_SEQUENCE: [SyntheticEvent; 5] = [
    SyntheticEvent::POINTER_DOWN,
    SyntheticEvent::MOUSE_DOWN,
    SyntheticEvent::POINTER_UP,
    SyntheticEvent::MOUSE_UP,
    SyntheticEvent::CLICK,
];

/// Dispatch the whole activation gesture on `node`.
pub async fn activate(doc: &dyn HostDocument, node: NodeId) -> Result<(), DomError> {
    for event in ACTIVATION_SEQUENCE {
        doc.dispatch(node, event).await?;
    }
    doc.native_click(node).await
}

/// Index of the item to activate: the first whose text contains `phrase`,
/// else the last one.
pub fn pick_index<S: AsRef<str>>(texts: &[S], phrase: &str) -> Option<usize> {
    texts
        .iter()
        .position(|t| t.as_ref().contains(phrase))
        .or_else(|| texts.len().checked_sub(1))
}

/// Opens the snooze menu and activates its custom item.
pub struct MenuTrigger<'a> {
    doc: &'a dyn HostDocument,
    locators: &'a Locators,
}

impl<'a> MenuTrigger<'a> {
    pub fn new(doc: &'a dyn HostDocument, locators: &'a Locators) -> Self {
        Self { doc, locators }
    }

    /// An open snooze menu anywhere in the document.
    pub async fn find_menu(&self) -> Result<Option<NodeId>, DomError> {
        self.doc.query(None, &self.locators.menu).await
    }

    /// The first trigger control, in priority order.
    pub async fn find_trigger(&self) -> Result<Option<NodeId>, DomError> {
        for selector in &self.locators.triggers {
            if let Some(node) = self.doc.query(None, selector).await? {
                trace!(%selector, %node, "trigger control");
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// Make sure the snooze menu is open and return it.
    ///
    /// An already open menu wins over `hint`; `hint` is used only while it is
    /// still attached. Otherwise the trigger control is activated and the
    /// menu awaited for up to `timeout`.
    pub async fn ensure_menu(
        &self,
        hint: Option<NodeId>,
        timeout: Duration,
    ) -> Result<Option<NodeId>, DomError> {
        if let Some(menu) = self.find_menu().await? {
            debug!(%menu, "menu already open");
            return Ok(Some(menu));
        }

        if let Some(hint) = hint {
            if matches!(self.doc.is_attached(hint).await, Ok(true)) {
                debug!(menu = %hint, "using hinted menu");
                return Ok(Some(hint));
            }
        }

        let Some(trigger) = self.find_trigger().await? else {
            debug!("no snooze trigger control in the document");
            return Ok(None);
        };

        activate(self.doc, trigger).await?;
        let menu = wait_for(self.doc, None, timeout, || self.find_menu()).await?;
        match menu {
            Some(menu) => debug!(%menu, "menu opened"),
            None => debug!(?timeout, "menu did not appear"),
        }
        Ok(menu)
    }

    /// The menu item that opens the date & time dialog.
    ///
    /// Matches on the pick phrase; falls back to the last item because the
    /// phrase is localized and the custom option is always listed last.
    pub async fn find_pick_item(&self, menu: NodeId) -> Result<Option<NodeId>, DomError> {
        let items = self
            .doc
            .query_all(Some(menu), &self.locators.menu_item)
            .await?;
        let mut texts = Vec::with_capacity(items.len());
        for &item in &items {
            texts.push(self.doc.text_content(item).await?);
        }
        Ok(pick_index(&texts, &self.locators.pick_phrase).map(|i| items[i]))
    }

    /// Wait for the pick item under `menu` and activate it.
    ///
    /// Returns `false` when no item showed up or the menu went away. Does not
    /// confirm that the dialog opened.
    pub async fn trigger_pick_item(
        &self,
        menu: NodeId,
        timeout: Duration,
    ) -> Result<bool, DomError> {
        let item = wait_for(self.doc, Some(menu), timeout, || self.find_pick_item(menu)).await?;
        let Some(item) = item else {
            debug!(%menu, ?timeout, "pick item did not appear");
            return Ok(false);
        };

        if !self.doc.is_attached(item).await? {
            debug!(%item, "pick item detached before activation");
            return Ok(false);
        }

        activate(self.doc, item).await?;
        debug!(%item, "pick item activated");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fixture::MailPage;
    use crate::dom::memory::{MemoryDocument, Recorded};
    use crate::dom::{ElementSpec, InsertPosition};
    use crate::locator::Selector;

    fn menu_with(items: &[&str]) -> ElementSpec {
        let mut menu = ElementSpec::new("div")
            .attr("role", "menu")
            .attr("aria-label", "Snooze menu");
        for item in items {
            menu = menu.child(ElementSpec::new("div").attr("role", "menuitem").text(*item));
        }
        menu
    }

    #[test]
    fn test_pick_index_prefers_phrase() {
        let texts = ["Tomorrow", "Pick date & time", "Next week"];
        assert_eq!(pick_index(&texts, "Pick date & time"), Some(1));
    }

    #[test]
    fn test_pick_index_falls_back_to_last() {
        let texts = ["Demain", "Semaine prochaine", "Choisir la date"];
        assert_eq!(pick_index(&texts, "Pick date & time"), Some(2));
    }

    #[test]
    fn test_pick_index_empty() {
        let texts: [&str; 0] = [];
        assert_eq!(pick_index(&texts, "Pick date & time"), None);
    }

    #[tokio::test]
    async fn test_activate_dispatches_full_gesture() {
        let doc = MemoryDocument::new();
        let node = doc
            .append(None, InsertPosition::Last, &ElementSpec::new("div"))
            .unwrap();
        activate(&doc, node).await.unwrap();

        let kinds: Vec<String> = doc
            .log()
            .into_iter()
            .filter_map(|entry| match entry {
                Recorded::Dispatched { event_type, .. } => Some(event_type),
                Recorded::NativeClick { .. } => Some("native".to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["pointerdown", "mousedown", "pointerup", "mouseup", "click", "native"]
        );
    }

    #[tokio::test]
    async fn test_find_pick_item_by_text_anywhere() {
        let doc = MemoryDocument::new();
        let locators = Locators::default();
        let menu = doc
            .append(
                None,
                InsertPosition::Last,
                &menu_with(&["Pick date & time", "Tomorrow", "Next week"]),
            )
            .unwrap();
        let trigger = MenuTrigger::new(&doc, &locators);
        let item = trigger.find_pick_item(menu).await.unwrap().unwrap();
        assert_eq!(doc.text_of(item).as_deref(), Some("Pick date & time"));
    }

    #[tokio::test]
    async fn test_find_pick_item_fallback_and_empty() {
        let doc = MemoryDocument::new();
        let locators = Locators::default();
        let trigger = MenuTrigger::new(&doc, &locators);

        let menu = doc
            .append(None, InsertPosition::Last, &menu_with(&["Demain", "Choisir"]))
            .unwrap();
        let item = trigger.find_pick_item(menu).await.unwrap().unwrap();
        assert_eq!(doc.text_of(item).as_deref(), Some("Choisir"));

        let empty = doc
            .append(None, InsertPosition::Last, &menu_with(&[]))
            .unwrap();
        assert_eq!(trigger.find_pick_item(empty).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ensure_menu_returns_open_menu_without_clicking() {
        let page = MailPage::new();
        let doc = page.build().unwrap();
        let open = doc
            .append(None, InsertPosition::Last, &page.menu_spec())
            .unwrap();
        let locators = Locators::default();

        let menu = MenuTrigger::new(&doc, &locators)
            .ensure_menu(None, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(menu, Some(open));
        assert_eq!(doc.activations(&page.trigger_selector(), "mousedown"), 0);
    }

    #[tokio::test]
    async fn test_ensure_menu_uses_attached_hint() {
        let doc = MemoryDocument::new();
        let locators = Locators::default();
        let hint = doc
            .append(None, InsertPosition::Last, &ElementSpec::new("div").attr("role", "menu"))
            .unwrap();

        let menu = MenuTrigger::new(&doc, &locators)
            .ensure_menu(Some(hint), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(menu, Some(hint));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_menu_ignores_detached_hint_and_clicks() {
        let page = MailPage::new();
        let doc = page.build().unwrap();
        let locators = Locators::default();
        let stale = doc
            .append(None, InsertPosition::Last, &ElementSpec::new("div"))
            .unwrap();
        doc.remove(stale).await.unwrap();

        let menu = MenuTrigger::new(&doc, &locators)
            .ensure_menu(Some(stale), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(menu.is_some());
        assert_ne!(menu, Some(stale));
        assert_eq!(doc.activations(&page.trigger_selector(), "mousedown"), 1);
    }

    #[tokio::test]
    async fn test_ensure_menu_without_trigger() {
        let doc = MailPage::new().without_trigger().build().unwrap();
        let locators = Locators::default();
        let menu = MenuTrigger::new(&doc, &locators)
            .ensure_menu(None, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(menu, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_menu_times_out_when_menu_never_opens() {
        let doc = MailPage::new().ignore_presses(1).build().unwrap();
        let locators = Locators::default();
        let start = tokio::time::Instant::now();
        let menu = MenuTrigger::new(&doc, &locators)
            .ensure_menu(None, Duration::from_millis(3000))
            .await
            .unwrap();
        assert_eq!(menu, None);
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
        assert_eq!(doc.active_observers(), 0);
    }

    #[tokio::test]
    async fn test_trigger_priority_prefers_button() {
        let doc = MemoryDocument::new();
        let div = doc
            .append(
                None,
                InsertPosition::Last,
                &ElementSpec::new("div").attr("aria-label", "Snooze"),
            )
            .unwrap();
        let button = doc
            .append(
                None,
                InsertPosition::Last,
                &ElementSpec::new("button").attr("aria-label", "Snooze"),
            )
            .unwrap();
        let locators = Locators::default();
        let found = MenuTrigger::new(&doc, &locators).find_trigger().await.unwrap();
        assert_eq!(found, Some(button));
        assert_ne!(found, Some(div));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_pick_item_opens_dialog() {
        let page = MailPage::new();
        let doc = page.build().unwrap();
        let locators = Locators::default();
        let trigger = MenuTrigger::new(&doc, &locators);

        let menu = trigger
            .ensure_menu(None, Duration::from_secs(3))
            .await
            .unwrap()
            .unwrap();
        assert!(trigger
            .trigger_pick_item(menu, Duration::from_millis(1500))
            .await
            .unwrap());
        assert_eq!(doc.activations(&MailPage::pick_item_selector(), "mouseup"), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(doc.count(&MailPage::dialog_selector()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_pick_item_times_out_on_empty_menu() {
        let doc = MemoryDocument::new();
        let locators = Locators::default();
        let menu = doc
            .append(None, InsertPosition::Last, &menu_with(&[]))
            .unwrap();
        let start = tokio::time::Instant::now();
        let activated = MenuTrigger::new(&doc, &locators)
            .trigger_pick_item(menu, Duration::from_millis(1500))
            .await
            .unwrap();
        assert!(!activated);
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
        assert_eq!(doc.count(&Selector::any().attr("role", "menuitem")), 0);
    }
}
