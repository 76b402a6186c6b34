//! Template lexer.
//!
//! Splits a SQL template into a flat sequence of [`Token`]s. The lexer only knows
//! a handful of lexical forms layered on top of arbitrary SQL text:
//!
//! | Form             | Token                |
//! |------------------|----------------------|
//! | `:name`          | [`Token::Placeholder`] |
//! | `{name}`         | [`Token::Variable`]  |
//! | `::names`        | [`Token::Names`]     |
//! | `::values`       | [`Token::Values`]    |
//! | `::name=::value` | [`Token::NameValue`] |
//! | `::other`        | literal `:other`     |
//! | `"..."`          | copied verbatim      |
//!
//! Lexing never fails: anything that does not form one of the constructs above is
//! kept as plain SQL, except a `:` that starts no placeholder, which is dropped.

use std::mem;

const NAME_VALUE: &str = "name=::value";
const NAMES: &str = "names";
const VALUES: &str = "values";

/// One lexical unit of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Plain SQL text, emitted verbatim.
    Sql(String),
    /// A named parameter, without its leading colon.
    Placeholder(String),
    /// An inline variable, without its braces.
    Variable(String),
    /// `::names`
    Names,
    /// `::values`
    Values,
    /// `::name=::value`
    NameValue,
}

impl Token {
    /// Whether the token is one of the bulk directives expanded from the field-name list.
    pub fn is_bulk(&self) -> bool {
        matches!(self, Token::Names | Token::Values | Token::NameValue)
    }
}

/// The compiled form of a template string.
///
/// A `Template` does not depend on the placeholder style nor on the parameter
/// source, so the same instance is reused by every render of its text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    tokens: Vec<Token>,
    has_bulk: bool,
    has_variables: bool,
}

impl Template {
    /// The tokens in template order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether the template contains at least one bulk directive.
    pub fn has_bulk(&self) -> bool {
        self.has_bulk
    }

    /// Whether the template contains at least one inline variable.
    pub fn has_variables(&self) -> bool {
        self.has_variables
    }

    /// Named placeholders in order of appearance, repeats included.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Placeholder(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Compiles a template string into its token sequence.
///
/// # Examples
///
/// ```
/// use sqlx_sqlbind::lexer::{compile, Token};
///
/// let template = compile("SELECT * FROM users WHERE id = :id");
/// assert_eq!(
///     template.tokens(),
///     &[
///         Token::Sql("SELECT * FROM users WHERE id = ".into()),
///         Token::Placeholder("id".into()),
///     ]
/// );
/// ```
pub fn compile(template: &str) -> Template {
    Lexer::new(template).run()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    plain: String,
    template: Template,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            plain: String::new(),
            template: Template::default(),
        }
    }

    fn run(mut self) -> Template {
        while let Some(c) = self.rest().chars().next() {
            match c {
                ':' => self.colon(),
                '{' => self.variable(),
                '"' => self.quoted(),
                _ => {
                    self.plain.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        self.flush();
        self.template
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn colon(&mut self) {
        let after = &self.rest()[1..];

        if let Some(tail) = after.strip_prefix(':') {
            let directive = [
                (NAME_VALUE, Token::NameValue),
                (NAMES, Token::Names),
                (VALUES, Token::Values),
            ]
            .into_iter()
            .find(|(keyword, _)| tail.starts_with(keyword));

            match directive {
                Some((keyword, token)) => {
                    self.push(token);
                    self.pos += 2 + keyword.len();
                }
                // escaped colon: `::foo` is the literal `:foo`
                None => {
                    self.plain.push(':');
                    self.pos += 2;
                }
            }
            return;
        }

        let len = ident_len(after);
        if len == 0 {
            // a colon that starts nothing is a bare separator and is dropped
            self.pos += 1;
            return;
        }
        self.push(Token::Placeholder(after[..len].to_owned()));
        self.pos += 1 + len;
    }

    fn variable(&mut self) {
        let body = &self.rest()[1..];
        match body.find('}') {
            Some(end) => {
                self.push(Token::Variable(body[..end].to_owned()));
                self.pos += end + 2;
            }
            None => {
                self.plain.push_str(self.rest());
                self.pos = self.src.len();
            }
        }
    }

    fn quoted(&mut self) {
        let body = &self.rest()[1..];
        let len = body.find('"').map_or(body.len(), |end| end + 1);
        self.plain.push_str(&self.rest()[..1 + len]);
        self.pos += 1 + len;
    }

    fn push(&mut self, token: Token) {
        self.flush();
        match token {
            Token::Variable(_) => self.template.has_variables = true,
            ref t if t.is_bulk() => self.template.has_bulk = true,
            _ => {}
        }
        self.template.tokens.push(token);
    }

    fn flush(&mut self) {
        if !self.plain.is_empty() {
            let text = mem::take(&mut self.plain);
            self.template.tokens.push(Token::Sql(text));
        }
    }
}

/// Letters of any script, decimal digits and `_`. Other numeric characters
/// such as `²` end the identifier.
fn is_ident(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || c == '_'
}

fn ident_len(s: &str) -> usize {
    s.char_indices()
        .find(|&(_, c)| !is_ident(c))
        .map_or(s.len(), |(i, _)| i)
}
