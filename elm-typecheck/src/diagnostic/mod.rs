//! Problems found while inferring a declaration.


use crate::unification::RecordDiff;
use elm_core::{Name, Ty};
use elm_diagnostic::{Location, Message, Source};
use std::fmt::Write;

#[derive(Debug, PartialEq, Clone)]
pub enum DiagnosticKind {
    TypeMismatch {
        found: Ty,
        required: Ty,
        record_diff: Option<RecordDiff>,
    },
    InvalidPattern {
        pattern_type: Ty,
        required_type: Ty,
        record_diff: Option<RecordDiff>,
    },
    /// Too many arguments in a call, or a call on something that isn't a function.
    ArgumentCount {
        actual: usize,
        expected: usize,
    },
    ParameterCount {
        actual: usize,
        expected: usize,
    },
    /// A type, or a constructor pattern, applied to the wrong number of arguments.
    TypeArgumentCount {
        actual: usize,
        expected: usize,
    },
    UnknownField {
        name: Name,
    },
    TypeMustBeRecord {
        found: Ty,
    },
    FieldAccessOnNonRecord {
        found: Ty,
    },
    InfiniteType,
    InfiniteRecursion,
    CyclicDefinition,
    ConflictingNameDeclaration,
    PartialPattern,
    NonAssociativeOperator {
        operator: Name,
    },
    /// Operators of equal precedence with different associativity, used next to each other.
    MixedAssociativity {
        left: Name,
        right: Name,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct Diagnostic {
    pub pos: usize,
    pub kind: DiagnosticKind,
}

fn pl(n: usize, singular: &str) -> String {
    if n == 1 {
        String::from(singular)
    } else {
        format!("{}s", singular)
    }
}

fn is_ambiguous_union(a: &Ty, b: &Ty) -> bool {
    match (a, b) {
        (Ty::Union(a), Ty::Union(b)) => a.name == b.name && a.module != b.module,
        _ => false,
    }
}

/// Render a pair of types, qualifying both when they would otherwise read the same.
fn render_pair(found: &Ty, required: &Ty) -> (String, String) {
    let found_text = found.rendered_text(false);
    let required_text = required.rendered_text(false);
    if found_text == required_text || is_ambiguous_union(found, required) {
        (found.rendered_text(true), required.rendered_text(true))
    } else {
        (found_text, required_text)
    }
}

fn render_record_diff(message: &mut String, diff: &RecordDiff) {
    if !diff.extra.is_empty() {
        message.push_str("\nExtra fields: ");
        message.push_str(&Ty::record(diff.extra.clone()).rendered_text(false));
    }
    if !diff.missing.is_empty() {
        message.push_str("\nMissing fields: ");
        message.push_str(&Ty::record(diff.missing.clone()).rendered_text(false));
    }
    if !diff.mismatched.is_empty() {
        message.push_str("\nMismatched fields:");
        for (name, found, required) in &diff.mismatched {
            let _ = write!(
                message,
                "\n  Field {}:\n    Required: {}\n    Found: {}",
                name,
                required.rendered_text(false),
                found.rendered_text(false)
            );
        }
    }
}

impl DiagnosticKind {
    pub fn message(&self) -> String {
        match self {
            DiagnosticKind::TypeMismatch {
                found,
                required,
                record_diff,
            } => {
                let (found, required) = render_pair(found, required);
                let mut message = format!("Type mismatch.\nRequired: {}\nFound: {}", required, found);
                if let Some(diff) = record_diff {
                    render_record_diff(&mut message, diff);
                }
                message
            }
            DiagnosticKind::InvalidPattern {
                pattern_type,
                required_type,
                record_diff,
            } => {
                let (found, required) = render_pair(pattern_type, required_type);
                let mut message = format!(
                    "Invalid pattern.\nRequired type: {}\nPattern type: {}",
                    required, found
                );
                if let Some(diff) = record_diff {
                    render_record_diff(&mut message, diff);
                }
                message
            }
            DiagnosticKind::ArgumentCount {
                actual,
                expected: 0,
            } => format!(
                "This value is not a function, but it was given {} {}.",
                actual,
                pl(*actual, "argument")
            ),
            DiagnosticKind::ArgumentCount { actual, expected } => format!(
                "The function expects {} {}, but it got {} instead.",
                expected,
                pl(*expected, "argument"),
                actual
            ),
            DiagnosticKind::ParameterCount { actual, expected } => format!(
                "The function expects {} {}, but it got {} instead.",
                expected,
                pl(*expected, "parameter"),
                actual
            ),
            DiagnosticKind::TypeArgumentCount { actual, expected } => format!(
                "The type expects {} {}, but it got {} instead.",
                expected,
                pl(*expected, "argument"),
                actual
            ),
            DiagnosticKind::UnknownField { name } => {
                format!("Record does not have field '{}'", name)
            }
            DiagnosticKind::TypeMustBeRecord { found } => {
                format!("Type must be a record.\nFound: {}", found.rendered_text(false))
            }
            DiagnosticKind::FieldAccessOnNonRecord { found } => format!(
                "Value is not a record, cannot access fields.\nType: {}",
                found.rendered_text(false)
            ),
            DiagnosticKind::InfiniteType => String::from("Infinite self-referential type"),
            DiagnosticKind::InfiniteRecursion => String::from("Infinite recursion"),
            DiagnosticKind::CyclicDefinition => {
                String::from("Value cannot be defined in terms of itself")
            }
            DiagnosticKind::ConflictingNameDeclaration => {
                String::from("Conflicting name declaration")
            }
            DiagnosticKind::PartialPattern => {
                String::from("Pattern does not cover all possibilities")
            }
            DiagnosticKind::NonAssociativeOperator { operator } => format!(
                "Operator ({}) is not associative, and so cannot be chained",
                operator
            ),
            DiagnosticKind::MixedAssociativity { left, right } => format!(
                "Operators ({}) and ({}) have the same precedence but different associativity, and so cannot be mixed",
                left, right
            ),
        }
    }

    /// Apply `f` to every type this diagnostic mentions.
    pub fn map_types(&self, f: &impl Fn(&Ty) -> Ty) -> DiagnosticKind {
        match self {
            DiagnosticKind::TypeMismatch {
                found,
                required,
                record_diff,
            } => DiagnosticKind::TypeMismatch {
                found: f(found),
                required: f(required),
                record_diff: record_diff.as_ref().map(|diff| diff.map_types(f)),
            },
            DiagnosticKind::InvalidPattern {
                pattern_type,
                required_type,
                record_diff,
            } => DiagnosticKind::InvalidPattern {
                pattern_type: f(pattern_type),
                required_type: f(required_type),
                record_diff: record_diff.as_ref().map(|diff| diff.map_types(f)),
            },
            DiagnosticKind::TypeMustBeRecord { found } => {
                DiagnosticKind::TypeMustBeRecord { found: f(found) }
            }
            DiagnosticKind::FieldAccessOnNonRecord { found } => {
                DiagnosticKind::FieldAccessOnNonRecord { found: f(found) }
            }
            kind => kind.clone(),
        }
    }
}

impl Diagnostic {
    pub fn message(&self) -> String {
        self.kind.message()
    }

    /// Add this diagnostic to a located report for `source`.
    pub fn report(&self, diagnostic: &mut elm_diagnostic::Diagnostic, source: &Source) {
        diagnostic.item(
            Some(Location {
                source: source.clone(),
                offset: Some(self.pos),
            }),
            Message::from_lines(&self.message()),
        )
    }
}
