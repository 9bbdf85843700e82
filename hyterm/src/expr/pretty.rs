//! RcDoc-based pretty-printer with termcolor annotations for values and expressions.
//!
//! Role
//! - Convert a [`Value`] or [`Expression`] into an annotated document suitable for width-aware
//!   rendering.
//! - Provide colored output for terminals (TTY-aware) and plain strings for logs/tests.
//!
//! Notation
//! - free functions `f(a, b, key=c)`, methods `recv.name(a)`, class methods
//!   `Class[Arg].name(a)`;
//! - spreads `*source`; pattern wildcards `?x`, `?x:Selector` and `*?xs`;
//! - literals `none`, `true`, `3`, `1.5`, `"text"`, `[a, b]`, type objects `Type[T]` as `T`.

use std::io::{self, Write};

use pretty::{FmtWrite, RcDoc, RenderAnnotated};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{
    expr::{Expression, OperationKind, Value, placeholder},
    rules::pattern::{self, Wildcard},
};

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Punct, // commas, dots, brackets, `=`
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Keyword,  // none, true, false
    Operator, // `*` spreads and `?` wildcards
    Ident,    // operation, wildcard and keyword names
    Type,     // classes and type objects
    Literal,  // numbers, strings and native objects
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Punct => {
                s.set_dimmed(true);
            }
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Keyword => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Operator => {
                s.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Style::Ident => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Type => {
                s.set_fg(Some(Color::Magenta));
            }
            Style::Literal => {
                s.set_fg(Some(Color::Cyan));
            }
        }
        s
    }
}

fn styled(style: Style, s: impl ToString) -> RcDoc<'static, Style> {
    RcDoc::text(s.to_string()).annotate(style)
}

fn punct(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Punct, s)
}

#[inline]
fn lparen(depth: usize) -> RcDoc<'static, Style> {
    RcDoc::as_string("(").annotate(Style::Paren((depth % 6) as u8))
}

#[inline]
fn rparen(depth: usize) -> RcDoc<'static, Style> {
    RcDoc::as_string(")").annotate(Style::Paren((depth % 6) as u8))
}

fn kw(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Keyword, s)
}

fn op(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Operator, s)
}

fn ident(s: &str) -> RcDoc<'static, Style> {
    styled(Style::Ident, s)
}

fn comma_separated(
    docs: impl IntoIterator<Item = RcDoc<'static, Style>>,
) -> RcDoc<'static, Style> {
    RcDoc::intersperse(docs, punct(",").append(RcDoc::line()))
}

/// `(a, b, key=c)` with parentheses colored by `depth`.
fn arguments<'a>(
    args: impl IntoIterator<Item = &'a Value>,
    kwargs: impl IntoIterator<Item = (&'a str, &'a Value)>,
    depth: usize,
) -> RcDoc<'static, Style> {
    let positional = args.into_iter().map(|arg| value_doc(arg, depth + 1));
    let keyword = kwargs.into_iter().map(|(name, value)| {
        ident(name)
            .append(punct("="))
            .append(value_doc(value, depth + 1))
    });
    lparen(depth)
        .append(
            RcDoc::line_()
                .append(comma_separated(positional.chain(keyword)))
                .nest(2),
        )
        .append(RcDoc::line_())
        .append(rparen(depth))
        .group()
}

/// Nesting level past which compound values render as `...`.
pub const MAX_DEPTH: usize = 128;

fn value_doc(value: &Value, depth: usize) -> RcDoc<'static, Style> {
    if depth > MAX_DEPTH && matches!(value, Value::List(_) | Value::Expr(_)) {
        return punct("...");
    }
    match value {
        Value::None => kw("none"),
        Value::Bool(true) => kw("true"),
        Value::Bool(false) => kw("false"),
        Value::Int(i) => styled(Style::Literal, i),
        Value::Float(x) => styled(Style::Literal, format!("{x:?}")),
        Value::Str(s) => styled(Style::Literal, format!("{:?}", &**s)),
        Value::List(items) => punct("[")
            .append(
                RcDoc::line_()
                    .append(comma_separated(
                        items.iter().map(|item| value_doc(item, depth + 1)),
                    ))
                    .nest(2),
            )
            .append(RcDoc::line_())
            .append(punct("]"))
            .group(),
        Value::Type(ty) => styled(Style::Type, ty),
        Value::Native(native) => styled(Style::Literal, format!("{native:?}")),
        Value::Expr(expr) => expr_doc(expr, depth),
    }
}

fn expr_doc(expr: &Expression, depth: usize) -> RcDoc<'static, Style> {
    if let Some(wildcard) = pattern::classify(expr) {
        return match wildcard {
            Wildcard::Single(name) => op("?").append(ident(name)),
            Wildcard::Typed(name, selector) => {
                let selector = match selector {
                    Value::Type(ty) => styled(Style::Type, ty),
                    other => styled(Style::Ident, other.as_str().unwrap_or("?")),
                };
                op("?").append(ident(name)).append(punct(":")).append(selector)
            }
            Wildcard::Variadic(name, None) => op("*?").append(ident(name)),
            Wildcard::Variadic(name, Some(ty)) => op("*?")
                .append(ident(name))
                .append(punct(":"))
                .append(styled(Style::Type, ty)),
        };
    }
    if let Some(source) = placeholder::iterated_source(expr) {
        return op("*").append(expr_doc(source, depth));
    }

    let operation = expr.operation();
    let kwargs = expr.kwargs().iter().map(|(name, value)| (&**name, value));
    match (operation.kind(), expr.args().split_first()) {
        (OperationKind::ClassMethod, Some((Value::Type(class), rest))) => {
            styled(Style::Type, class)
                .append(punct("."))
                .append(ident(operation.name()))
                .append(arguments(rest, kwargs, depth))
        }
        (OperationKind::Method, Some((receiver, rest))) => value_doc(receiver, depth + 1)
            .append(punct("."))
            .append(ident(operation.name()))
            .append(arguments(rest, kwargs, depth))
            .group(),
        _ => ident(operation.qualified()).append(arguments(expr.args(), kwargs, depth)),
    }
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, 'w, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'w, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<'w, W: WriteColor + Write> pretty::Render for ColorWriter<'w, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

/// Render a document to a `termcolor::WriteColor` with width-aware layout.
fn render_to<W: WriteColor + Write>(
    doc: &RcDoc<'_, Style>,
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    let mut cw = ColorWriter { out };
    doc.render_raw(width, &mut cw)
}

/// Width of the terminal, or 80 if it cannot be determined.
fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Pretty-printing conveniences for values and expressions.
pub trait PrettyExpr {
    /// Build an RcDoc representation with style annotations.
    fn pretty_doc(&self) -> RcDoc<'static, Style>;

    /// Render with colors to any termcolor writer at the given width.
    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()> {
        render_to(&self.pretty_doc(), width, out)
    }

    /// Print to stdout with colors (TTY-aware), at the terminal width (or 80 if not a TTY).
    fn pretty_print(&self) -> io::Result<()> {
        let stdout = StandardStream::stdout(ColorChoice::Auto);
        let mut stdout = stdout.lock();
        self.pretty_render_to(terminal_width(), &mut stdout)
    }

    /// Format into a plain string (no colors) at the given width.
    fn pretty_string_width(&self, width: usize) -> String {
        let mut buf = String::new();
        let _ = self.pretty_doc().render_fmt(width, &mut buf);
        buf
    }

    /// Format into a plain string (no colors) at width 80.
    fn pretty_string(&self) -> String {
        self.pretty_string_width(80)
    }
}

impl PrettyExpr for Value {
    fn pretty_doc(&self) -> RcDoc<'static, Style> {
        value_doc(self, 0)
    }
}

impl PrettyExpr for Expression {
    fn pretty_doc(&self) -> RcDoc<'static, Style> {
        expr_doc(self, 0)
    }
}

macro_rules! impl_display_via_pretty {
    ($($t:ty),*) => {
        $(
            impl std::fmt::Display for $t {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    let mut w = FmtWrite::new(f);
                    self.pretty_doc().render_raw(80, &mut w)
                }
            }
        )*
    };
}

impl_display_via_pretty!(Value, Expression);
