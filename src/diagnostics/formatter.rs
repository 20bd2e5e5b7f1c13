use serde::Serialize;

use super::{Diagnostic, DiagnosticCode, DiagnosticKind};

pub const JSON_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorFormat {
    Human,
    Json,
    Short,
}

impl ErrorFormat {
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "human" | "text" => Some(Self::Human),
            "json" => Some(Self::Json),
            "short" => Some(Self::Short),
            _ => None,
        }
    }
}

/// Render a collection of diagnostics to a single string.
#[must_use]
pub fn format_diagnostics(diagnostics: &[Diagnostic], format: ErrorFormat) -> String {
    let mut rendered = String::new();
    for (index, diagnostic) in diagnostics.iter().enumerate() {
        if index > 0 {
            rendered.push('\n');
        }
        let chunk = match format {
            ErrorFormat::Human => render_human(diagnostic),
            ErrorFormat::Short => render_short(diagnostic),
            ErrorFormat::Json => render_json(diagnostic),
        };
        rendered.push_str(&chunk);
    }
    rendered
}

fn render_human(diagnostic: &Diagnostic) -> String {
    let mut out = diagnostic.to_string();
    for note in &diagnostic.notes {
        out.push_str(&format!("\n  = note: {note}"));
    }
    for suggestion in &diagnostic.suggestions {
        out.push_str(&format!("\n  = help: {suggestion}"));
    }
    out
}

fn render_short(diagnostic: &Diagnostic) -> String {
    let mut out = diagnostic.to_string();
    if !diagnostic.notes.is_empty() {
        out.push_str(&format!(" (notes: {})", diagnostic.notes.len()));
    }
    for suggestion in &diagnostic.suggestions {
        out.push_str(&format!("; suggestion: {suggestion}"));
    }
    out
}

fn render_json(diagnostic: &Diagnostic) -> String {
    let payload = JsonDiagnostic {
        version: JSON_SCHEMA_VERSION,
        severity: diagnostic.severity.as_str(),
        kind: diagnostic.kind,
        code: &diagnostic.code,
        message: &diagnostic.message,
        notes: diagnostic.notes.clone(),
        suggestions: diagnostic.suggestions.clone(),
    };
    serde_json::to_string(&payload).unwrap_or_else(|_| "{}".into())
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    version: &'static str,
    severity: &'static str,
    kind: DiagnosticKind,
    code: &'a DiagnosticCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<String>,
}
