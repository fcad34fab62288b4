//! SnipCSS: copy an element's markup together with the page CSS that applies to it.
//!
//! The core is [`style::used_css::extract_used_css`], which walks every
//! readable stylesheet and keeps the style rules whose selectors match the
//! element or one of its descendants.

pub mod dom;
pub mod error;
pub mod menu;
pub mod page;
pub mod parser;
pub mod snippet;
pub mod style;

pub use error::{SelectorError, SheetError, SnipError};
pub use page::Page;
pub use style::used_css::{extract_used_css, NO_RULES_FOUND};
