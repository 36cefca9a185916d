//! Value parsing for the few properties the overlay lays out by itself:
//! lengths (`px`, `%`, unitless zero) and 2D `translate*` transforms.

use cssparser::{Parser, ParserInput, Token};

/// A length that may need a percentage basis to resolve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Absolute pixels.
    Px(f64),
    /// Fraction of some basis, stored as a ratio (`50%` is `0.5`).
    Percent(f64),
}

impl Length {
    /// Resolve against `basis` (used for percentages only).
    #[inline]
    pub fn resolve(self, basis: f64) -> f64 {
        match self {
            Self::Px(pixels) => pixels,
            Self::Percent(ratio) => ratio * basis,
        }
    }
}

/// Read one length token from the parser.
fn next_length(parser: &mut Parser<'_, '_>) -> Option<Length> {
    match parser.next().ok()? {
        Token::Dimension { value, unit, .. } if unit.eq_ignore_ascii_case("px") => {
            Some(Length::Px(f64::from(*value)))
        }
        Token::Percentage { unit_value, .. } => Some(Length::Percent(f64::from(*unit_value))),
        Token::Number { value, .. } if *value == 0.0 => Some(Length::Px(0.0)),
        _ => None,
    }
}

/// Parse a single length value such as `12px`, `-50%` or `0`.
pub fn parse_length(text: &str) -> Option<Length> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let length = next_length(&mut parser)?;
    parser.expect_exhausted().ok()?;
    Some(length)
}

/// Parse a `transform` made of `translate`, `translateX` and `translateY`
/// functions into `(x, y)`. Components of several functions add up when they
/// share a unit; mixed units keep the last value. `none` is `(0, 0)`.
///
/// Returns `None` for any other transform function.
pub fn parse_translate(text: &str) -> Option<(Length, Length)> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    if parser
        .try_parse(|inner| inner.expect_ident_matching("none"))
        .is_ok()
    {
        return Some((Length::Px(0.0), Length::Px(0.0)));
    }
    let mut x_offset = Length::Px(0.0);
    let mut y_offset = Length::Px(0.0);
    let mut seen_any = false;
    while !parser.is_exhausted() {
        let function = parser.expect_function().ok()?.clone();
        let (delta_x, delta_y) = parser
            .parse_nested_block(|args| {
                let parsed = if function.eq_ignore_ascii_case("translatex") {
                    next_length(args).map(|x_len| (x_len, Length::Px(0.0)))
                } else if function.eq_ignore_ascii_case("translatey") {
                    next_length(args).map(|y_len| (Length::Px(0.0), y_len))
                } else if function.eq_ignore_ascii_case("translate") {
                    next_length(args).and_then(|x_len| {
                        if args.try_parse(|inner| inner.expect_comma()).is_ok() {
                            next_length(args).map(|y_len| (x_len, y_len))
                        } else {
                            Some((x_len, Length::Px(0.0)))
                        }
                    })
                } else {
                    None
                };
                parsed.ok_or_else(|| args.new_custom_error::<(), ()>(()))
            })
            .ok()?;
        x_offset = accumulate(x_offset, delta_x);
        y_offset = accumulate(y_offset, delta_y);
        seen_any = true;
    }
    seen_any.then_some((x_offset, y_offset))
}

fn accumulate(current: Length, delta: Length) -> Length {
    match (current, delta) {
        (Length::Px(left), Length::Px(right)) => Length::Px(left + right),
        (Length::Percent(left), Length::Percent(right)) => Length::Percent(left + right),
        (Length::Px(zero), other) if zero == 0.0 => other,
        (_, other) => other,
    }
}
