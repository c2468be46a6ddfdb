//! Boolean query language over ChangeSpecs.
//!
//! ```text
//! Expr    := OrExpr
//! OrExpr  := AndExpr ( "OR" AndExpr )*
//! AndExpr := NotExpr ( ["AND"] NotExpr )*
//! NotExpr := ("!" | "NOT") NotExpr | Atom
//! Atom    := "(" Expr ")" | ["c"] '"' text '"' | bareword
//!          | "!!!" | "!!" | "!@$" | "@@@" | "$$$"
//! ```
//!
//! Keywords are case-insensitive. Terms match name, description and status
//! as substrings; `c"..."` makes the match case-sensitive.

mod eval;
mod lexer;
mod parser;

use crate::changespec::ChangeSpec;
use thiserror::Error;

pub use eval::EvalContext;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query syntax error at position {position}: {message}")]
pub struct QuerySyntaxError {
    pub message: String,
    /// Character offset into the query text.
    pub position: usize,
}

impl QuerySyntaxError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

// ---------------------------------------------------------------------------
// Expression tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Special {
    /// `!!!`: an unresolved error suffix somewhere on the record.
    Error,
    /// `@@@`: a background agent is working on the record.
    RunningAgent,
    /// `$$$`: a hook is currently running.
    RunningProcess,
    /// `!@$`: any of the above.
    Any,
}

impl Special {
    pub fn as_str(self) -> &'static str {
        match self {
            Special::Error => "!!!",
            Special::RunningAgent => "@@@",
            Special::RunningProcess => "$$$",
            Special::Any => "!@$",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term { text: String, case_sensitive: bool },
    Special(Special),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn term(text: impl Into<String>) -> Self {
        Expr::Term {
            text: text.into(),
            case_sensitive: false,
        }
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Or(..) => 1,
            Expr::And(..) => 2,
            Expr::Not(_) => 3,
            Expr::Term { .. } | Expr::Special(_) => 4,
        }
    }

    pub fn matches(&self, cs: &ChangeSpec) -> bool {
        EvalContext::new(cs).eval(self)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn parse(query: &str) -> Result<Expr, QuerySyntaxError> {
    let tokens = lexer::tokenize(query)?;
    parser::Parser::new(tokens, query.chars().count()).parse()
}

/// Render `expr` with explicit uppercase operators, quoted terms, and only
/// the parentheses precedence requires.
pub fn to_canonical_string(expr: &Expr) -> String {
    let mut out = String::new();
    render(expr, &mut out);
    out
}

/// Records in `specs` matching `expr`, in input order.
pub fn filter<'a>(expr: &Expr, specs: &'a [ChangeSpec]) -> Vec<&'a ChangeSpec> {
    specs.iter().filter(|cs| expr.matches(cs)).collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Term {
            text,
            case_sensitive,
        } => {
            if *case_sensitive {
                out.push('c');
            }
            out.push('"');
            escape_into(text, out);
            out.push('"');
        }
        Expr::Special(s) => out.push_str(s.as_str()),
        Expr::Not(inner) => {
            out.push_str("NOT ");
            render_operand(inner, expr.precedence(), false, out);
        }
        Expr::And(left, right) => {
            render_operand(left, expr.precedence(), false, out);
            out.push_str(" AND ");
            render_operand(right, expr.precedence(), true, out);
        }
        Expr::Or(left, right) => {
            render_operand(left, expr.precedence(), false, out);
            out.push_str(" OR ");
            render_operand(right, expr.precedence(), true, out);
        }
    }
}

// Operators are left-associative, so an equal-precedence right operand
// needs parentheses to keep its shape.
fn render_operand(child: &Expr, parent: u8, right: bool, out: &mut String) {
    let prec = child.precedence();
    let wrap = prec < parent || (right && prec == parent);
    if wrap {
        out.push('(');
    }
    render(child, out);
    if wrap {
        out.push(')');
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
