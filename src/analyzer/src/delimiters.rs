//! Bracket, brace, parenthesis and string balance checking

use crate::normalize::{escapes_in, is_quote};
use crate::types::Finding;

/// The three delimiter kinds, tracked on independent stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Bracket,
    Brace,
    Paren,
}

impl Delimiter {
    const ALL: [Delimiter; 3] = [Self::Bracket, Self::Brace, Self::Paren];

    fn label(self) -> &'static str {
        match self {
            Self::Bracket => "bracket",
            Self::Brace => "brace",
            Self::Paren => "paren",
        }
    }

    fn opened_by(ch: char) -> Option<Self> {
        match ch {
            '[' => Some(Self::Bracket),
            '{' => Some(Self::Brace),
            '(' => Some(Self::Paren),
            _ => None,
        }
    }

    fn closed_by(ch: char) -> Option<Self> {
        match ch {
            ']' => Some(Self::Bracket),
            '}' => Some(Self::Brace),
            ')' => Some(Self::Paren),
            _ => None,
        }
    }
}

/// Check that every delimiter outside a string literal is balanced
///
/// PromQL nests `[]`, `{}` and `()` freely, so each kind only has to balance
/// against itself. Positions are character offsets.
pub fn check_delimiters(query: &str) -> Vec<Finding> {
    let mut stacks: [Vec<usize>; 3] = Default::default();
    let mut findings = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (position, ch) in query.chars().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' && escapes_in(quote) {
            escaped = true;
            continue;
        }
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        if is_quote(ch) {
            quote = Some(ch);
        } else if let Some(kind) = Delimiter::opened_by(ch) {
            stacks[kind as usize].push(position);
        } else if let Some(kind) = Delimiter::closed_by(ch) {
            if stacks[kind as usize].pop().is_none() {
                let label = kind.label();
                findings.push(
                    Finding::error(
                        &format!("unmatched_{label}"),
                        format!("Unmatched closing {label} at position {position}"),
                    )
                    .at(position),
                );
            }
        }
    }

    if quote.is_some() {
        findings.push(Finding::error("unclosed_string", "Unclosed string literal"));
    }

    for kind in Delimiter::ALL {
        let label = kind.label();
        for &position in &stacks[kind as usize] {
            findings.push(
                Finding::error(
                    &format!("unclosed_{label}"),
                    format!("Unclosed {label} at position {position}"),
                )
                .at(position),
            );
        }
    }

    findings
}
