//! Stylesheet parsing on top of `cssparser`.
//!
//! Only qualified style rules are kept. At-rules are skipped, and rules whose
//! prelude is not a selector list understood by [`SelectorList`] are dropped
//! with a warning so that they can never match by accident.

use crate::declarations::{Declaration, split_important};
use crate::selector::SelectorList;
use cssparser::{
    AtRuleParser, BasicParseErrorKind, CowRcStr, DeclarationParser, ParseError, Parser,
    ParserInput, ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
    StyleSheetParser,
};
use log::warn;

/// A style rule: a selector list and its declarations, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Raw prelude text as written.
    pub prelude: String,
    /// Parsed selectors.
    pub selectors: SelectorList,
    /// Declarations within the rule block.
    pub declarations: Vec<Declaration>,
    /// Index of the rule within its stylesheet.
    pub source_order: u32,
}

/// A parsed stylesheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    /// Top-level style rules in source order.
    pub rules: Vec<StyleRule>,
}

impl Stylesheet {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Collects `name: value` items of a rule body.
struct BodyParser;

impl<'input> DeclarationParser<'input> for BodyParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'tokens>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'tokens>,
        _declaration_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let (value, important) = split_important(input.slice_from(start));
        Ok(Declaration {
            name: name.to_ascii_lowercase(),
            value,
            important,
        })
    }
}

impl<'input> AtRuleParser<'input> for BodyParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl<'input> QualifiedRuleParser<'input> for BodyParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl<'input> RuleBodyItemParser<'input, Declaration, ()> for BodyParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Builds [`StyleRule`]s from top-level qualified rules.
struct SheetParser {
    next_order: u32,
}

impl<'input> AtRuleParser<'input> for SheetParser {
    type Prelude = ();
    type AtRule = Option<StyleRule>;
    type Error = ();

    fn parse_prelude<'tokens>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        warn!("hints_css: skipping unsupported at-rule @{name}");
        while input.next().is_ok() {}
        Ok(())
    }

    fn parse_block<'tokens>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
    }

    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        Ok(None)
    }
}

impl<'input> QualifiedRuleParser<'input> for SheetParser {
    type Prelude = String;
    type QualifiedRule = Option<StyleRule>;
    type Error = ();

    fn parse_prelude<'tokens>(
        &mut self,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        Ok(input.slice_from(start).trim().to_owned())
    }

    fn parse_block<'tokens>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        let mut body = BodyParser;
        let declarations: Vec<Declaration> =
            RuleBodyParser::new(input, &mut body).flatten().collect();
        let source_order = self.next_order;
        self.next_order = self.next_order.saturating_add(1);
        let Some(selectors) = SelectorList::parse(&prelude) else {
            warn!("hints_css: dropping rule with unsupported selector `{prelude}`");
            return Ok(None);
        };
        Ok(Some(StyleRule {
            prelude,
            selectors,
            declarations,
            source_order,
        }))
    }
}

/// Parse a full stylesheet.
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut sheet_parser = SheetParser { next_order: 0 };
    let rules = StyleSheetParser::new(&mut parser, &mut sheet_parser)
        .flatten()
        .flatten()
        .collect();
    Stylesheet { rules }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_class_rules_with_important_and_comments() {
        let sheet = parse_stylesheet(
            "/* hint */ .hint { position: absolute; opacity: 0 !important; }\n.title{bottom:0}",
        );
        assert_eq!(sheet.rules.len(), 2);
        let first = &sheet.rules[0];
        assert_eq!(first.prelude, ".hint");
        assert_eq!(first.declarations.len(), 2);
        assert_eq!(first.declarations[1].name, "opacity");
        assert!(first.declarations[1].important);
        assert_eq!(sheet.rules[1].source_order, 1);
    }

    #[test]
    fn at_rules_and_combinators_are_dropped() {
        let sheet = parse_stylesheet(
            "@media print { .hint { color: red } } div > .hint { color: red } .ok { color: blue }",
        );
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].prelude, ".ok");
    }

    #[test]
    fn multi_line_values_are_kept_raw() {
        let sheet = parse_stylesheet(".hint { border: solid 1px rgba(0, 0, 0, 0.4); }");
        assert_eq!(sheet.rules[0].declarations[0].value, "solid 1px rgba(0, 0, 0, 0.4)");
    }
}
