//! Copy actions offered for a picked element, and the element-picking session.
//!
//! Both are plain state; rendering them and delivering the text (clipboard,
//! stdout, a file) is the caller's business.

use crate::dom::dom_tree::{Document, NodeId};
use crate::page::Page;
use crate::snippet::{snippet_text, SnipConfig};
use log::debug;

/// Ids of the helper UI, which can never be picked.
pub const HELPER_UI_IDS: &[&str] = &["copy-helper-widget", "copy-toast"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CopyHtml,
    CopyHtmlAndCss,
    CopyPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub action: MenuAction,
}

/// The context menu, top to bottom.
pub const MENU_ENTRIES: &[MenuEntry] = &[
    MenuEntry {
        label: "Copy HTML Only",
        action: MenuAction::CopyHtml,
    },
    MenuEntry {
        label: "Copy HTML & CSS",
        action: MenuAction::CopyHtmlAndCss,
    },
    MenuEntry {
        label: "Copy Entire Page",
        action: MenuAction::CopyPage,
    },
];

impl MenuAction {
    pub fn label(self) -> &'static str {
        MENU_ENTRIES
            .iter()
            .find(|entry| entry.action == self)
            .map(|entry| entry.label)
            .unwrap_or_default()
    }

    /// Produces the text this action copies for `target`.
    pub fn run(self, page: &Page, target: NodeId) -> String {
        match self {
            MenuAction::CopyHtml => snippet_text::html_only(page, target),
            MenuAction::CopyHtmlAndCss => snippet_text::html_and_css(page, target),
            MenuAction::CopyPage => snippet_text::whole_page(page),
        }
    }
}

/// An open context menu. Choosing an entry or dismissing consumes it, so a
/// menu acts at most once.
#[derive(Debug)]
pub struct ContextMenu<'p> {
    page: &'p Page,
    target: NodeId,
}

impl<'p> ContextMenu<'p> {
    /// Opens the menu for a picked element, snapping it to its component
    /// according to `config`.
    pub fn open(page: &'p Page, picked: NodeId, config: &SnipConfig) -> Self {
        let target = config.target_for(page, picked);
        ContextMenu { page, target }
    }

    pub fn entries(&self) -> &'static [MenuEntry] {
        MENU_ENTRIES
    }

    /// The element the menu acts on.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn choose(self, action: MenuAction) -> String {
        debug!("menu: {}", action.label());
        action.run(self.page, self.target)
    }

    pub fn dismiss(self) {}
}

/// Selection-mode state: whether picking is active and what is under the pointer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionSession {
    active: bool,
    hovered: Option<NodeId>,
}

impl SelectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Flips selection mode and returns the new state. Leaving it forgets the hovered element.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        if !self.active {
            self.hovered = None;
        }
        self.active
    }

    /// Records the element under the pointer. Ignored while inactive or
    /// when `node` belongs to the helper UI; returns whether it was recorded.
    pub fn hover(&mut self, document: &Document, node: NodeId) -> bool {
        if !self.active || is_helper_ui(document, node) {
            return false;
        }
        self.hovered = Some(node);
        true
    }

    /// The element a click picks, if selection mode is on and something is hovered.
    pub fn click(&self) -> Option<NodeId> {
        self.hovered.filter(|_| self.active)
    }
}

fn is_helper_ui(document: &Document, node: NodeId) -> bool {
    document.ancestors_or_self(node).any(|ancestor| {
        document
            .element(ancestor)
            .and_then(|elem| elem.id())
            .map(|id| HELPER_UI_IDS.contains(&id))
            .unwrap_or(false)
    })
}
