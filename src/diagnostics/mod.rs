//! Binding diagnostics: typed failure records embedded in rules and rendered for hosts.

mod formatter;

use std::fmt;

use serde::Serialize;

pub use formatter::{ErrorFormat, JSON_SCHEMA_VERSION, format_diagnostics};

use crate::types::Ty;

/// Stable codes for binding diagnostics.
pub mod codes {
    pub const MEMBER_NOT_FOUND: &str = "DYN001";
    pub const AMBIGUOUS_OVERLOAD: &str = "DYN002";
    pub const NO_APPLICABLE_OVERLOAD: &str = "DYN003";
    pub const INCORRECT_ARGUMENT_COUNT: &str = "DYN004";
    pub const DUPLICATE_KEYWORD: &str = "DYN005";
    pub const UNASSIGNABLE_KEYWORD: &str = "DYN006";
    pub const READ_ONLY_MEMBER: &str = "DYN007";
    pub const NOT_DELETABLE: &str = "DYN008";
    pub const NOT_CALLABLE: &str = "DYN009";
    pub const STATIC_INSTANCE_MISMATCH: &str = "DYN010";
    pub const GENERIC_PARAMETERS_UNRESOLVED: &str = "DYN011";
    pub const MISSING_INSTANCE: &str = "DYN012";
    pub const CONVERSION_NOT_POSSIBLE: &str = "DYN013";
    pub const BAD_OPERANDS: &str = "DYN014";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    MemberNotFound,
    AmbiguousOverload,
    NoApplicableOverload,
    IncorrectArgumentCount,
    DuplicateKeyword,
    UnassignableKeyword,
    ReadOnlyMember,
    NotDeletable,
    NotCallable,
    StaticInstanceMismatch,
    GenericParametersUnresolved,
    MissingInstance,
    ConversionNotPossible,
    BadOperands,
}

impl DiagnosticKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::MemberNotFound => codes::MEMBER_NOT_FOUND,
            DiagnosticKind::AmbiguousOverload => codes::AMBIGUOUS_OVERLOAD,
            DiagnosticKind::NoApplicableOverload => codes::NO_APPLICABLE_OVERLOAD,
            DiagnosticKind::IncorrectArgumentCount => codes::INCORRECT_ARGUMENT_COUNT,
            DiagnosticKind::DuplicateKeyword => codes::DUPLICATE_KEYWORD,
            DiagnosticKind::UnassignableKeyword => codes::UNASSIGNABLE_KEYWORD,
            DiagnosticKind::ReadOnlyMember => codes::READ_ONLY_MEMBER,
            DiagnosticKind::NotDeletable => codes::NOT_DELETABLE,
            DiagnosticKind::NotCallable => codes::NOT_CALLABLE,
            DiagnosticKind::StaticInstanceMismatch => codes::STATIC_INSTANCE_MISMATCH,
            DiagnosticKind::GenericParametersUnresolved => codes::GENERIC_PARAMETERS_UNRESOLVED,
            DiagnosticKind::MissingInstance => codes::MISSING_INSTANCE,
            DiagnosticKind::ConversionNotPossible => codes::CONVERSION_NOT_POSSIBLE,
            DiagnosticKind::BadOperands => codes::BAD_OPERANDS,
        }
    }

    /// Category reported alongside the code.
    #[must_use]
    pub fn category(self) -> &'static str {
        match self {
            DiagnosticKind::MemberNotFound
            | DiagnosticKind::ReadOnlyMember
            | DiagnosticKind::NotDeletable
            | DiagnosticKind::StaticInstanceMismatch
            | DiagnosticKind::GenericParametersUnresolved
            | DiagnosticKind::MissingInstance => "member",
            DiagnosticKind::AmbiguousOverload
            | DiagnosticKind::NoApplicableOverload
            | DiagnosticKind::IncorrectArgumentCount
            | DiagnosticKind::DuplicateKeyword
            | DiagnosticKind::UnassignableKeyword
            | DiagnosticKind::NotCallable => "call",
            DiagnosticKind::ConversionNotPossible => "conversion",
            DiagnosticKind::BadOperands => "operator",
        }
    }
}

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

/// Structured identifier for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DiagnosticCode {
    pub code: String,
    pub category: Option<String>,
}

impl DiagnosticCode {
    #[must_use]
    pub fn new(code: impl Into<String>, category: Option<String>) -> Self {
        Self {
            code: code.into(),
            category,
        }
    }
}

/// Binding failure with its stable code, notes and suggestions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub code: DiagnosticCode,
    pub message: String,
    pub notes: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            code: DiagnosticCode::new(kind.code(), Some(kind.category().to_string())),
            message: message.into(),
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    #[must_use]
    pub fn member_not_found(owner: &Ty, name: &str) -> Self {
        Self::new(
            DiagnosticKind::MemberNotFound,
            format!("`{owner}` has no member named `{name}`"),
        )
    }

    #[must_use]
    pub fn ambiguous_overload(signatures: &[String]) -> Self {
        Self::new(
            DiagnosticKind::AmbiguousOverload,
            format!("Multiple targets could match: {}", signatures.join(", ")),
        )
    }

    #[must_use]
    pub fn no_applicable_overload(name: &str, detail: Option<String>) -> Self {
        let message = match detail {
            Some(detail) => format!("no overload of `{name}` accepts these arguments: {detail}"),
            None => format!("no overload of `{name}` accepts these arguments"),
        };
        Self::new(DiagnosticKind::NoApplicableOverload, message)
    }

    #[must_use]
    pub fn incorrect_argument_count(
        name: &str,
        min: usize,
        max: Option<usize>,
        actual: usize,
    ) -> Self {
        let expected = match max {
            Some(max) if max == min => format!("{min}"),
            Some(max) => format!("{min} to {max}"),
            None => format!("at least {min}"),
        };
        Self::new(
            DiagnosticKind::IncorrectArgumentCount,
            format!("`{name}` takes {expected} arguments ({actual} given)"),
        )
    }

    #[must_use]
    pub fn duplicate_keyword(name: &str, keyword: &str) -> Self {
        Self::new(
            DiagnosticKind::DuplicateKeyword,
            format!("`{name}` got multiple values for argument `{keyword}`"),
        )
    }

    #[must_use]
    pub fn unassignable_keyword(name: &str, keyword: &str) -> Self {
        Self::new(
            DiagnosticKind::UnassignableKeyword,
            format!("`{name}` got an unexpected keyword argument `{keyword}`"),
        )
    }

    #[must_use]
    pub fn read_only_member(name: &str, detail: &str) -> Self {
        Self::new(
            DiagnosticKind::ReadOnlyMember,
            format!("cannot assign to `{name}`: {detail}"),
        )
    }

    #[must_use]
    pub fn not_deletable(owner: &Ty, name: &str) -> Self {
        Self::new(
            DiagnosticKind::NotDeletable,
            format!("cannot delete `{name}` from `{owner}`"),
        )
    }

    #[must_use]
    pub fn not_callable(ty: &Ty) -> Self {
        Self::new(
            DiagnosticKind::NotCallable,
            format!("`{ty}` object is not callable"),
        )
    }

    #[must_use]
    pub fn static_instance_mismatch(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::StaticInstanceMismatch, message)
    }

    #[must_use]
    pub fn generic_parameters_unresolved(owner: &Ty, name: &str) -> Self {
        Self::new(
            DiagnosticKind::GenericParametersUnresolved,
            format!("cannot access `{name}` on `{owner}`: generic parameters are unresolved"),
        )
    }

    #[must_use]
    pub fn missing_instance(owner: &Ty, name: &str) -> Self {
        Self::new(
            DiagnosticKind::MissingInstance,
            format!("`{owner}::{name}` is an instance member and requires an instance"),
        )
    }

    #[must_use]
    pub fn conversion_not_possible(from: &Ty, to: &Ty) -> Self {
        Self::new(
            DiagnosticKind::ConversionNotPossible,
            format!("cannot convert `{from}` to `{to}`"),
        )
    }

    #[must_use]
    pub fn bad_operands(operator: &str, operands: &[Ty]) -> Self {
        let operands = operands
            .iter()
            .map(|ty| format!("`{ty}`"))
            .collect::<Vec<_>>()
            .join(" and ");
        Self::new(
            DiagnosticKind::BadOperands,
            format!("unsupported operand types for {operator}: {operands}"),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {}",
            self.severity.as_str(),
            self.code.code,
            self.message
        )
    }
}
