//! Declaration blocks: the property/value pairs of a rule body or an inline
//! `style` attribute.

use core::fmt;

/// A single CSS declaration (`property: value [!important]`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub name: String,
    /// Raw value text without the trailing `!important`.
    pub value: String,
    /// Whether the declaration was marked `!important`.
    pub important: bool,
}

impl Declaration {
    /// Build a declaration, lowercasing the property name.
    #[inline]
    pub fn new(name: &str, value: &str, important: bool) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.trim().to_owned(),
            important,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.important {
            write!(formatter, "{}: {} !important", self.name, self.value)
        } else {
            write!(formatter, "{}: {}", self.name, self.value)
        }
    }
}

/// An ordered set of declarations where each property appears at most once.
///
/// Setting a property that is already present replaces it in place, so the
/// block keeps first-insertion order. This mirrors how a `CSSStyleDeclaration`
/// behaves for `setProperty`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    declarations: Vec<Declaration>,
}

impl DeclarationBlock {
    /// Create an empty block.
    #[inline]
    pub const fn new() -> Self {
        Self {
            declarations: Vec::new(),
        }
    }

    /// Parse the text of a `style` attribute.
    ///
    /// Splits on `;`, then on the first `:`. Items without a colon or with an
    /// empty name or value are skipped. Later duplicates win.
    pub fn parse(input: &str) -> Self {
        let mut block = Self::new();
        for raw_item in input.split(';') {
            let Some((raw_name, raw_value)) = raw_item.split_once(':') else {
                continue;
            };
            let name = raw_name.trim();
            let (value, important) = split_important(raw_value);
            if name.is_empty() || value.is_empty() {
                continue;
            }
            block.set(name, &value, important);
        }
        block
    }

    /// Set `name` to `value`. An empty value removes the property, like
    /// `style.setProperty(name, "")` does.
    pub fn set(&mut self, name: &str, value: &str, important: bool) {
        let declaration = Declaration::new(name, value, important);
        if declaration.value.is_empty() {
            self.remove(&declaration.name);
            return;
        }
        if let Some(existing) = self
            .declarations
            .iter_mut()
            .find(|existing| existing.name == declaration.name)
        {
            *existing = declaration;
        } else {
            self.declarations.push(declaration);
        }
    }

    /// Look up the declaration for `name`.
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|declaration| declaration.name.eq_ignore_ascii_case(name))
    }

    /// Look up only the value for `name`.
    #[inline]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|declaration| declaration.value.as_str())
    }

    /// Remove `name`, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.declarations.len();
        self.declarations
            .retain(|declaration| !declaration.name.eq_ignore_ascii_case(name));
        before != self.declarations.len()
    }

    /// Iterate declarations in block order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Declaration> {
        self.declarations.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl fmt::Display for DeclarationBlock {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, declaration) in self.declarations.iter().enumerate() {
            if index > 0 {
                formatter.write_str(" ")?;
            }
            write!(formatter, "{declaration};")?;
        }
        Ok(())
    }
}

impl<'block> IntoIterator for &'block DeclarationBlock {
    type Item = &'block Declaration;
    type IntoIter = core::slice::Iter<'block, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Split a trailing `!important` (any case, optional space after `!`) off a
/// raw value.
pub(crate) fn split_important(raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    if let Some(bang) = trimmed.rfind('!')
        && let Some(tail) = trimmed.get(bang + 1..)
        && tail.trim().eq_ignore_ascii_case("important")
        && let Some(head) = trimmed.get(..bang)
    {
        return (head.trim_end().to_owned(), true);
    }
    (trimmed.to_owned(), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_invalid_items_and_keeps_last_duplicate() {
        let block = DeclarationBlock::parse("Color: red; bogus; :x; top: 1px; color: blue !important");
        assert_eq!(block.len(), 2);
        let color = block.get("color").expect("color present");
        assert_eq!(color.value, "blue");
        assert!(color.important);
        assert_eq!(block.value("top"), Some("1px"));
    }

    #[test]
    fn empty_value_removes_property() {
        let mut block = DeclarationBlock::new();
        block.set("left", "10px", true);
        block.set("right", "", true);
        assert_eq!(block.len(), 1);
        block.set("left", "", true);
        assert!(block.is_empty());
    }

    #[test]
    fn replacing_keeps_original_position() {
        let mut block = DeclarationBlock::new();
        block.set("left", "1px", false);
        block.set("top", "2px", false);
        block.set("left", "3px", true);
        assert_eq!(block.to_string(), "left: 3px !important; top: 2px;");
    }

    #[test]
    fn important_tail_allows_space_and_case() {
        assert_eq!(split_important("0 ! IMPORTANT"), ("0".to_owned(), true));
        assert_eq!(split_important(" 50% "), ("50%".to_owned(), false));
    }
}
