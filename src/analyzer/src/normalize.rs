//! Lexical normalization of PromQL text
//!
//! The analyzer never builds an AST. Instead, checks scan the raw query, and
//! those that look for metric names first scan a normalized copy in which
//! string literals, label selectors and grouping clauses have been blanked
//! out. Blanking keeps the character count, so offsets stay comparable.
//!
//! PromQL has three string forms: `"..."` and `'...'` honor backslash
//! escapes, backtick raw strings do not.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static GROUPING_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(by|without|on|ignoring|group_left|group_right)\s*\([^)]*\)").unwrap()
});

/// Characters that open (and close) a string literal
pub(crate) fn is_quote(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '`')
}

/// True if a backslash escapes the next character inside `quote`
pub(crate) fn escapes_in(quote: Option<char>) -> bool {
    quote != Some('`')
}

/// Keep the clause keyword and parentheses, blank the label list
fn blank_grouping_labels(caps: &Captures) -> String {
    let clause = &caps[0];
    let open = clause.find('(').map_or(0, |idx| idx + 1);
    let labels = clause[open..clause.len() - 1].chars().count();
    format!("{}{})", &clause[..open], " ".repeat(labels))
}

/// Blank out string literals, `{...}` selectors and grouping-clause labels
///
/// What remains are bare identifiers, function names, operators, numbers and
/// range brackets. Brace depth is clamped at zero; unbalanced braces are
/// the delimiter checker's business, not this function's.
pub fn strip_strings_and_selectors(query: &str) -> String {
    let query = GROUPING_CLAUSE.replace_all(query, blank_grouping_labels);

    let mut out = String::with_capacity(query.len());
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in query.chars() {
        let keep = if escaped {
            escaped = false;
            false
        } else if ch == '\\' && escapes_in(quote) {
            escaped = true;
            false
        } else if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            false
        } else if is_quote(ch) {
            quote = Some(ch);
            false
        } else if ch == '{' {
            depth += 1;
            false
        } else if ch == '}' {
            depth = depth.saturating_sub(1);
            false
        } else {
            depth == 0
        };
        out.push(if keep { ch } else { ' ' });
    }
    out
}

/// Replace the interior of every string literal with spaces
///
/// Quotes are kept so selectors such as `{job=""}` still look populated.
pub fn blank_string_literals(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in query.chars() {
        match quote {
            Some(_) if escaped => {
                escaped = false;
                out.push(' ');
            }
            Some(open) if ch == '\\' && escapes_in(Some(open)) => {
                escaped = true;
                out.push(' ');
            }
            Some(open) if ch == open => {
                quote = None;
                out.push(ch);
            }
            Some(_) => out.push(' '),
            None => {
                if is_quote(ch) {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }
    out
}

/// An identifier token found by [`identifiers`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'a> {
    /// Byte offset of the token
    pub start: usize,
    pub text: &'a str,
    /// First non-whitespace character after the token
    pub next: Option<char>,
}

impl Identifier<'_> {
    /// True if the token is used as a function name or a selector name
    pub fn is_applied(&self) -> bool {
        matches!(self.next, Some('(') | Some('{'))
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == ':'
}

/// Scan `text` for metric-name shaped tokens (`[A-Za-z_:][A-Za-z0-9_:]*`)
///
/// Tokens must start a word: the `m` of `5m` is not an identifier.
pub fn identifiers(text: &str) -> Vec<Identifier<'_>> {
    let mut found = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if !is_ident_char(ch) {
            continue;
        }
        let mut end = start + ch.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            if !is_ident_char(next) {
                break;
            }
            end = idx + next.len_utf8();
            chars.next();
        }
        if ch.is_ascii_digit() {
            continue;
        }
        let next = text[end..].chars().find(|c| !c.is_whitespace());
        found.push(Identifier {
            start,
            text: &text[start..end],
            next,
        });
    }
    found
}
