//! Namespace-qualified path queries over an element tree.
//!
//! A small location-path subset: `/` and `//` steps, `prefix:name`,
//! `prefix:*` and `*` name tests, and `[@attr]` / `[@attr='value']`
//! predicates. Prefixes resolve through a [`NamespaceTable`] fixed at compile
//! time, so two tables never share prefix bindings.
//!
//! ```
//! use remoteroster_core::xml::{Element, Query, ROSTER_NAMESPACES};
//!
//! let push = Element::parse(
//!     r#"<iq type="set"><query xmlns="jabber:iq:roster"><item jid="a@gw"/></query></iq>"#,
//! ).unwrap();
//! let items = Query::compile(&ROSTER_NAMESPACES, "//roster:item").unwrap();
//! assert_eq!(items.count(&push), 1);
//! ```

use super::Element;
use crate::error::QueryError;
use crate::ns;

/// Prefix bindings for one family of queries.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceTable {
    bindings: &'static [(&'static str, &'static str)],
}

impl NamespaceTable {
    /// Create a table from static bindings.
    pub const fn new(bindings: &'static [(&'static str, &'static str)]) -> Self {
        Self { bindings }
    }

    /// Resolve a prefix to its namespace URI.
    pub fn resolve(&self, prefix: &str) -> Option<&'static str> {
        self.bindings
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, uri)| *uri)
    }
}

/// Roster and registration queries.
pub static ROSTER_NAMESPACES: NamespaceTable =
    NamespaceTable::new(&[("roster", ns::ROSTER), ("register", ns::REGISTER)]);

/// Discovery-info queries.
pub static DISCO_NAMESPACES: NamespaceTable = NamespaceTable::new(&[("disco", ns::DISCO_INFO)]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    /// `*`: any element.
    Any,
    /// `prefix:*`: any element in a namespace.
    AnyIn(String),
    /// `name` or `prefix:name`.
    Exact { ns: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Predicate {
    attr: String,
    value: Option<String>,
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

impl Step {
    fn matches(&self, element: &Element) -> bool {
        let name_ok = match &self.test {
            NameTest::Any => true,
            NameTest::AnyIn(ns) => element.ns() == ns,
            NameTest::Exact { ns, name } => element.is(name, ns),
        };
        name_ok
            && self.predicates.iter().all(|p| match (&p.value, element.attr(&p.attr)) {
                (None, found) => found.is_some(),
                (Some(expected), Some(found)) => expected == found,
                (Some(_), None) => false,
            })
    }
}

/// A compiled path query.
#[derive(Debug, Clone)]
pub struct Query {
    expression: String,
    steps: Vec<Step>,
}

impl Query {
    /// Compile an expression against a namespace table.
    pub fn compile(table: &NamespaceTable, expression: &str) -> Result<Self, QueryError> {
        let expr = expression.trim();
        if expr.is_empty() {
            return Err(QueryError::Empty);
        }
        if !expr.starts_with('/') {
            return Err(QueryError::NotAbsolute(expr.to_string()));
        }

        let mut steps = Vec::new();
        let mut rest = expr;
        while !rest.is_empty() {
            let axis = if let Some(r) = rest.strip_prefix("//") {
                rest = r;
                Axis::Descendant
            } else if let Some(r) = rest.strip_prefix('/') {
                rest = r;
                Axis::Child
            } else {
                return Err(QueryError::InvalidStep {
                    step: rest.to_string(),
                    expression: expr.to_string(),
                });
            };

            let end = step_end(rest);
            let (raw, tail) = rest.split_at(end);
            steps.push(parse_step(table, axis, raw, expr)?);
            rest = tail;
        }

        Ok(Self {
            expression: expr.to_string(),
            steps,
        })
    }

    /// The source expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Select matching elements in document order, treating `root` as the
    /// document element.
    pub fn select<'a>(&self, root: &'a Element) -> Vec<&'a Element> {
        let mut context: Vec<&'a Element> = Vec::new();

        for (i, step) in self.steps.iter().enumerate() {
            let candidates: Vec<&'a Element> = if i == 0 {
                match step.axis {
                    Axis::Child => vec![root],
                    Axis::Descendant => root.descendants().collect(),
                }
            } else {
                context
                    .iter()
                    .flat_map(|&ctx| -> Vec<&'a Element> {
                        match step.axis {
                            Axis::Child => ctx.children().collect(),
                            Axis::Descendant => ctx.descendants().skip(1).collect(),
                        }
                    })
                    .collect()
            };
            context = candidates.into_iter().filter(|e| step.matches(e)).collect();
            if context.is_empty() {
                return context;
            }
        }

        // Restore document order and drop duplicates from overlapping contexts.
        root.descendants()
            .filter(|e| context.iter().any(|c| std::ptr::eq(*c, *e)))
            .collect()
    }

    /// Number of matching elements.
    pub fn count(&self, root: &Element) -> usize {
        self.select(root).len()
    }

    /// Whether any element matches.
    pub fn exists(&self, root: &Element) -> bool {
        !self.select(root).is_empty()
    }
}

/// Index of the next unbracketed '/' (or the end).
fn step_end(s: &str) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '/') if depth == 0 => return i,
            _ => {}
        }
    }
    s.len()
}

fn parse_step(
    table: &NamespaceTable,
    axis: Axis,
    raw: &str,
    expr: &str,
) -> Result<Step, QueryError> {
    let invalid_step = || QueryError::InvalidStep {
        step: raw.to_string(),
        expression: expr.to_string(),
    };

    let (name_part, mut preds) = match raw.find('[') {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    };
    if name_part.is_empty() {
        return Err(invalid_step());
    }

    let test = match name_part.split_once(':') {
        Some((prefix, local)) => {
            let uri = table
                .resolve(prefix)
                .ok_or_else(|| QueryError::UnknownPrefix {
                    prefix: prefix.to_string(),
                    expression: expr.to_string(),
                })?;
            if local == "*" {
                NameTest::AnyIn(uri.to_string())
            } else if is_name(local) {
                NameTest::Exact {
                    ns: uri.to_string(),
                    name: local.to_string(),
                }
            } else {
                return Err(invalid_step());
            }
        }
        None if name_part == "*" => NameTest::Any,
        None if is_name(name_part) => NameTest::Exact {
            ns: String::new(),
            name: name_part.to_string(),
        },
        None => return Err(invalid_step()),
    };

    let mut predicates = Vec::new();
    while !preds.is_empty() {
        let close = preds.find(']').ok_or_else(|| QueryError::InvalidPredicate {
            predicate: preds.to_string(),
            expression: expr.to_string(),
        })?;
        let body = &preds[1..close];
        predicates.push(parse_predicate(body, expr)?);
        preds = &preds[close + 1..];
        if !preds.is_empty() && !preds.starts_with('[') {
            return Err(invalid_step());
        }
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn parse_predicate(body: &str, expr: &str) -> Result<Predicate, QueryError> {
    let invalid = || QueryError::InvalidPredicate {
        predicate: body.to_string(),
        expression: expr.to_string(),
    };

    let body = body.trim().strip_prefix('@').ok_or_else(invalid)?;
    match body.split_once('=') {
        None if is_name(body.trim()) => Ok(Predicate {
            attr: body.trim().to_string(),
            value: None,
        }),
        None => Err(invalid()),
        Some((attr, literal)) => {
            let attr = attr.trim();
            let literal = literal.trim();
            let value = literal
                .strip_prefix('\'')
                .and_then(|l| l.strip_suffix('\''))
                .or_else(|| literal.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
                .ok_or_else(invalid)?;
            if !is_name(attr) {
                return Err(invalid());
            }
            Ok(Predicate {
                attr: attr.to_string(),
                value: Some(value.to_string()),
            })
        }
    }
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}
