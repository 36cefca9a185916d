//! CSS support for the hint overlay.
//!
//! This crate parses the overlay stylesheet with `cssparser`, matches the
//! handful of selector shapes the overlay uses, and models inline declaration
//! blocks. It has no knowledge of any document; callers describe elements
//! through [`ElementFacts`].

pub mod declarations;
pub mod selector;
pub mod syntax;
pub mod values;

pub use declarations::{Declaration, DeclarationBlock};
pub use selector::{CompoundSelector, ElementFacts, SelectorList, Specificity};
pub use syntax::{StyleRule, Stylesheet, parse_stylesheet};
pub use values::{Length, parse_length, parse_translate};
