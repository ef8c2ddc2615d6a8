//! The criterion DSL used by quota-order rules to match on applicant
//! characteristics (e.g. "age >= 5", "has_sibling = true").
//!
//! The synonym table below reproduces `Applicant.eval_dict` from the
//! original implementation character for character, including its two
//! surprising entries: the strings `"le"` and `"ge"` do NOT mean
//! less-or-equal / greater-or-equal. `"le"` means strictly-less and `"ge"`
//! means strictly-greater. `"leq"`/`"geq"` carry the equal-inclusive
//! meaning instead. This is not a typo to fix; rule tables authored against
//! the original engine rely on exactly this mapping.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Criterion {
    /// Parses the criterion token used in rule tables, preserving the
    /// original synonym quirks exactly.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "<" => Some(Criterion::Lt),
            "<=" => Some(Criterion::Le),
            ">" => Some(Criterion::Gt),
            ">=" => Some(Criterion::Ge),
            "=" | "==" => Some(Criterion::Eq),
            "!=" => Some(Criterion::Ne),
            "le" => Some(Criterion::Lt),
            "leq" => Some(Criterion::Le),
            "ge" => Some(Criterion::Gt),
            "geq" => Some(Criterion::Ge),
            "eq" => Some(Criterion::Eq),
            "neq" => Some(Criterion::Ne),
            _ => None,
        }
    }

    pub fn apply(&self, ordering: Ordering) -> bool {
        match self {
            Criterion::Lt => ordering == Ordering::Less,
            Criterion::Le => ordering != Ordering::Greater,
            Criterion::Gt => ordering == Ordering::Greater,
            Criterion::Ge => ordering != Ordering::Less,
            Criterion::Eq => ordering == Ordering::Equal,
            Criterion::Ne => ordering != Ordering::Equal,
        }
    }
}

/// A dynamic applicant characteristic value, as loaded from the
/// `applicant_characteristic_*` columns.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Real(f64),
    Str(String),
}

impl AttributeValue {
    /// Compares two values of the same conceptual kind. Numeric kinds
    /// compare across Int/Real transparently; string comparisons are
    /// lexicographic; mixed numeric/string comparisons are never equal and
    /// never ordered (`None`), matching Python's refusal to order `int` and
    /// `str` under the three-way comparisons this DSL needs.
    pub fn partial_compare(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::Int(a), AttributeValue::Int(b)) => a.partial_cmp(b),
            (AttributeValue::Real(a), AttributeValue::Real(b)) => a.partial_cmp(b),
            (AttributeValue::Int(a), AttributeValue::Real(b)) => (*a as f64).partial_cmp(b),
            (AttributeValue::Real(a), AttributeValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (AttributeValue::Str(a), AttributeValue::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Evaluates `attribute_value <criterion> reference_value`, mirroring
/// `Applicant.check_attribute_criteria`.
pub fn check_attribute_criteria(
    attribute_value: &AttributeValue,
    criterion: Criterion,
    reference_value: &AttributeValue,
) -> bool {
    match attribute_value.partial_compare(reference_value) {
        Some(ordering) => criterion.apply(ordering),
        None => false,
    }
}
