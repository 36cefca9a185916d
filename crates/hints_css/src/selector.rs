//! Compound selectors: `tag`, `#id`, `.class` and `*`, combined without
//! combinators, in comma separated lists.
//!
//! The overlay stylesheet only ever styles its own nodes by class, so there is
//! no descendant or sibling matching here. Anything with a combinator,
//! attribute selector or pseudo-class is rejected at parse time.

use smallvec::SmallVec;

/// What a selector needs to know about an element.
#[derive(Clone, Copy, Debug)]
pub struct ElementFacts<'node> {
    /// Lowercase tag name.
    pub tag: &'node str,
    /// Value of the `id` attribute, if any.
    pub id: Option<&'node str>,
    /// Class list in attribute order.
    pub classes: &'node [String],
}

/// Selector specificity as `(ids, classes, tags)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

/// A single compound selector such as `div.hint.hiddenHint`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: SmallVec<String, 2>,
}

impl CompoundSelector {
    /// Parse one compound selector. Returns `None` for anything outside the
    /// supported subset.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let mut selector = Self::default();
        let mut rest = text;
        let mut first = true;
        while let Some(sigil) = rest.chars().next() {
            match sigil {
                '*' if first => {
                    rest = rest.get(1..)?;
                }
                '.' | '#' => {
                    let (name, tail) = take_ident(rest.get(1..)?)?;
                    if sigil == '.' {
                        selector.classes.push(name.to_owned());
                    } else if selector.id.replace(name.to_owned()).is_some() {
                        return None;
                    }
                    rest = tail;
                }
                _ if first => {
                    let (name, tail) = take_ident(rest)?;
                    selector.tag = Some(name.to_ascii_lowercase());
                    rest = tail;
                }
                _ => return None,
            }
            first = false;
        }
        Some(selector)
    }

    /// Whether this selector matches the element.
    pub fn matches(&self, element: &ElementFacts<'_>) -> bool {
        if let Some(tag) = &self.tag
            && !tag.eq_ignore_ascii_case(element.tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.id != Some(id.as_str())
        {
            return false;
        }
        self.classes
            .iter()
            .all(|class| element.classes.iter().any(|candidate| candidate == class))
    }

    pub fn specificity(&self) -> Specificity {
        Specificity(
            u32::from(self.id.is_some()),
            self.classes.len() as u32,
            u32::from(self.tag.is_some()),
        )
    }
}

/// A comma separated list of compound selectors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorList {
    selectors: SmallVec<CompoundSelector, 1>,
}

impl SelectorList {
    /// Parse a rule prelude. Every item must be supported, otherwise the
    /// whole list is rejected (as browsers do for invalid selector lists).
    pub fn parse(prelude: &str) -> Option<Self> {
        let mut selectors = SmallVec::new();
        for item in prelude.split(',') {
            selectors.push(CompoundSelector::parse(item)?);
        }
        Some(Self { selectors })
    }

    /// Highest specificity among the items matching `element`, or `None`
    /// when nothing matches.
    pub fn match_specificity(&self, element: &ElementFacts<'_>) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|selector| selector.matches(element))
            .map(CompoundSelector::specificity)
            .max()
    }

    #[inline]
    pub fn matches(&self, element: &ElementFacts<'_>) -> bool {
        self.match_specificity(element).is_some()
    }
}

/// Split a leading CSS identifier off `text`.
fn take_ident(text: &str) -> Option<(&str, &str)> {
    let end = text
        .char_indices()
        .find(|&(_, character)| {
            !(character.is_alphanumeric() || character == '-' || character == '_')
        })
        .map_or(text.len(), |(index, _)| index);
    if end == 0 {
        return None;
    }
    Some((text.get(..end)?, text.get(end..)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn class_compound_requires_all_classes() {
        let selector = CompoundSelector::parse(".hint.hiddenHint").expect("supported");
        let both = classes(&["hint", "hiddenHint"]);
        let one = classes(&["hint"]);
        let element = ElementFacts { tag: "div", id: None, classes: &both };
        assert!(selector.matches(&element));
        let element = ElementFacts { tag: "div", id: None, classes: &one };
        assert!(!selector.matches(&element));
        assert_eq!(selector.specificity(), Specificity(0, 2, 0));
    }

    #[test]
    fn tag_and_id_selectors() {
        let list = SelectorList::parse("span, div#__SynthWebExt").expect("supported");
        let none = classes(&[]);
        let element = ElementFacts { tag: "DIV", id: Some("__SynthWebExt"), classes: &none };
        assert_eq!(list.match_specificity(&element), Some(Specificity(1, 0, 1)));
        let element = ElementFacts { tag: "p", id: None, classes: &none };
        assert!(!list.matches(&element));
    }

    #[test]
    fn unsupported_shapes_are_rejected() {
        assert!(SelectorList::parse("div .hint").is_none());
        assert!(SelectorList::parse(".hint > span").is_none());
        assert!(SelectorList::parse(".hint:hover").is_none());
        assert!(SelectorList::parse("#a#b").is_none());
        assert!(SelectorList::parse(".ok,").is_none());
    }
}
