//! Term formatting for display and debugging.

#![allow(clippy::format_push_string)] // Formatting prioritizes clarity over allocation

use std::fmt;

use super::Heap;
use crate::id::TermId;
use crate::term::{Condition, IteratorTerm, TermKind};

/// Output register of the formatter.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Style {
    /// Human-readable: `3`, `"foo"`, `{ "foo": 3 }`.
    Display,
    /// Machine-oriented: distinguishes symbols, timestamps and iterator shapes.
    Debug,
}

/// `fmt::Display` adapter returned by [`Heap::display`].
pub struct DisplayTerm<'h> {
    heap: &'h Heap,
    id: TermId,
}

impl fmt::Display for DisplayTerm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        self.heap.format_term_into(self.id, Style::Display, &mut buf);
        f.write_str(&buf)
    }
}

/// `fmt::Display` adapter returned by [`Heap::debug`].
pub struct DebugTerm<'h> {
    heap: &'h Heap,
    id: TermId,
}

impl fmt::Display for DebugTerm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::new();
        self.heap.format_term_into(self.id, Style::Debug, &mut buf);
        f.write_str(&buf)
    }
}

impl Heap {
    /// Human-readable rendering of a term.
    pub fn display(&self, id: TermId) -> DisplayTerm<'_> {
        DisplayTerm { heap: self, id }
    }

    /// Machine-oriented rendering of a term.
    pub fn debug(&self, id: TermId) -> DebugTerm<'_> {
        DebugTerm { heap: self, id }
    }

    fn format_term_into(&self, id: TermId, style: Style, buf: &mut String) {
        if id.is_none() {
            buf.push_str("<none>");
            return;
        }
        match *self.kind(id) {
            TermKind::Nil => buf.push_str("null"),
            TermKind::Boolean(b) => buf.push_str(if b { "true" } else { "false" }),
            TermKind::Int(n) => buf.push_str(&n.to_string()),
            TermKind::Float(x) => push_float(x, buf),
            TermKind::String(range) => push_quoted(self.get_str(range), buf),
            TermKind::Symbol(n) => match style {
                Style::Display => buf.push_str("<symbol>"),
                Style::Debug => buf.push_str(&format!("Symbol({n})")),
            },
            TermKind::Timestamp(ms) => match style {
                Style::Display => buf.push_str(&ms.to_string()),
                Style::Debug => buf.push_str(&format!("Timestamp({ms})")),
            },
            TermKind::Variable(index) => buf.push_str(&format!("${index}")),
            TermKind::Let { initializer, body } => {
                buf.push_str("Let(");
                self.format_term_into(initializer, style, buf);
                buf.push_str(", ");
                self.format_term_into(body, style, buf);
                buf.push(')');
            }
            TermKind::Lambda { arity, body } => match style {
                Style::Display => buf.push_str(&format!("<function:{arity}>")),
                Style::Debug => {
                    buf.push_str(&format!("Lambda({arity}, "));
                    self.format_term_into(body, style, buf);
                    buf.push(')');
                }
            },
            TermKind::Application { target, args } => {
                buf.push_str("Apply(");
                self.format_term_into(target, style, buf);
                buf.push_str(", ");
                self.format_seq(self.get_list(args), "[", "]", style, buf);
                buf.push(')');
            }
            TermKind::Partial { target, args } => match style {
                Style::Display => buf.push_str("<function:partial>"),
                Style::Debug => {
                    buf.push_str("Partial(");
                    self.format_term_into(target, style, buf);
                    buf.push_str(", ");
                    self.format_seq(self.get_list(args), "[", "]", style, buf);
                    buf.push(')');
                }
            },
            TermKind::Builtin(builtin) => match self.builtin_name(builtin) {
                Some(name) => buf.push_str(&format!("<builtin:{name}>")),
                None => buf.push_str(&format!("<builtin:#{}>", builtin.0)),
            },
            TermKind::Constructor { keys } => {
                buf.push_str("<constructor:");
                self.format_term_into(keys, style, buf);
                buf.push('>');
            }
            TermKind::Recursive { factory } => {
                buf.push_str("Recursive(");
                self.format_term_into(factory, style, buf);
                buf.push(')');
            }
            TermKind::List(range) => self.format_seq(self.get_list(range), "[", "]", style, buf),
            TermKind::Record { .. } => {
                let entries = self.record_entries(id);
                if entries.is_empty() {
                    buf.push_str("{}");
                    return;
                }
                buf.push_str("{ ");
                for (i, (key, value)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    self.format_term_into(key, style, buf);
                    buf.push_str(": ");
                    self.format_term_into(value, style, buf);
                }
                buf.push_str(" }");
            }
            TermKind::Hashmap(_) => {
                let entries = self.hashmap_entries(id);
                if entries.is_empty() {
                    buf.push_str("Map({})");
                    return;
                }
                buf.push_str("Map({ ");
                for (i, (key, value)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    self.format_term_into(key, style, buf);
                    buf.push_str(" => ");
                    self.format_term_into(value, style, buf);
                }
                buf.push_str(" })");
            }
            TermKind::Hashset(_) => {
                let items = self.hashset_items(id);
                if items.is_empty() {
                    buf.push_str("Set({})");
                } else {
                    self.format_seq(&items, "Set({ ", " })", style, buf);
                }
            }
            TermKind::Signal(range) => {
                self.format_seq(self.get_list(range), "Signal(", ")", style, buf);
            }
            TermKind::Condition(condition) => self.format_condition(condition, style, buf),
            TermKind::Iterator(iterator) => match style {
                Style::Display => buf.push_str(&format!("<iterator:{}>", iterator.name())),
                Style::Debug => self.format_iterator(iterator, buf),
            },
        }
    }

    fn format_seq(&self, items: &[TermId], open: &str, close: &str, style: Style, buf: &mut String) {
        buf.push_str(open);
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                buf.push_str(", ");
            }
            self.format_term_into(item, style, buf);
        }
        buf.push_str(close);
    }

    fn format_condition(&self, condition: Condition, style: Style, buf: &mut String) {
        match condition {
            Condition::Error(payload) => {
                buf.push_str("Error(");
                self.format_term_into(payload, style, buf);
                buf.push(')');
            }
            Condition::InvalidFunctionArgs { target, args } => {
                buf.push_str("InvalidFunctionArgs(");
                self.format_term_into(target, style, buf);
                buf.push_str(", ");
                self.format_term_into(args, style, buf);
                buf.push(')');
            }
            Condition::InvalidJson { source, offset } => {
                buf.push_str("InvalidJson(");
                self.format_term_into(source, style, buf);
                buf.push_str(&format!(", {offset})"));
            }
            Condition::Pending => buf.push_str("Pending"),
        }
    }

    fn format_iterator(&self, iterator: IteratorTerm, buf: &mut String) {
        let style = Style::Debug;
        let children: Vec<TermId> = {
            let mut children = Vec::new();
            self.for_each_child(&TermKind::Iterator(iterator), |c| children.push(c));
            children
        };
        buf.push_str("Iterator::");
        buf.push_str(iterator.name());
        buf.push('(');
        match iterator {
            IteratorTerm::Range { start, len } => buf.push_str(&format!("{start}, {len}")),
            IteratorTerm::Skip { source, count } | IteratorTerm::Take { source, count } => {
                self.format_term_into(source, style, buf);
                buf.push_str(&format!(", {count}"));
            }
            _ => {
                for (i, &child) in children.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    self.format_term_into(child, style, buf);
                }
            }
        }
        buf.push(')');
    }
}

fn push_float(x: f64, buf: &mut String) {
    if x.is_nan() {
        buf.push_str("NaN");
    } else if x.is_infinite() {
        buf.push_str(if x > 0.0 { "Infinity" } else { "-Infinity" });
    } else if x.fract() == 0.0 {
        buf.push_str(&format!("{x:.1}"));
    } else {
        buf.push_str(&x.to_string());
    }
}

/// Quote a string with JSON escapes.
fn push_quoted(s: &str, buf: &mut String) {
    buf.push('"');
    for ch in s.chars() {
        match ch {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if (c as u32) < 0x20 => buf.push_str(&format!("\\u{:04x}", c as u32)),
            c => buf.push(c),
        }
    }
    buf.push('"');
}
