//! Ariadne-based rendering of type errors.
//!
//! Each error is reported at the span of its origin node with its stable
//! code, a terse message, one label and a help line when a plausible fix
//! exists. `--json` tooling gets one JSON object per error instead.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde::Serialize;
use typec_common::{LineIndex, Span};

use crate::error::{TypeError, TypeErrorKind};
use crate::ty::Ty;

/// How diagnostics are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticOptions {
    pub color: bool,
    pub json: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions {
            color: true,
            json: false,
        }
    }
}

impl DiagnosticOptions {
    /// Plain text without escape codes, for snapshots and pipes.
    pub fn colorless() -> Self {
        DiagnosticOptions {
            color: false,
            json: false,
        }
    }

    pub fn json_mode() -> Self {
        DiagnosticOptions {
            color: false,
            json: true,
        }
    }
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    code: &'static str,
    severity: &'static str,
    message: String,
    file: &'a str,
    spans: Vec<JsonSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

#[derive(Serialize)]
struct JsonSpan {
    start: usize,
    end: usize,
    line: u32,
    column: u32,
    label: String,
}

/// Text of the primary label.
fn label_text(kind: &TypeErrorKind) -> String {
    match kind {
        TypeErrorKind::UnresolvedReference { .. } => "not found in scope".to_string(),
        TypeErrorKind::CircularInference => "depends on its own type".to_string(),
        TypeErrorKind::Mismatch { expected, found } => {
            format!("expected `{}`, found `{}`", expected, found)
        }
        TypeErrorKind::ConstraintViolation { generic, .. } => {
            format!("bound to `{}` here", generic)
        }
        TypeErrorKind::ArityMismatch { expected, .. } => {
            format!("expected {} argument(s)", expected)
        }
        TypeErrorKind::StructuralMismatch { scrutinee, .. } => {
            format!("this value has type `{}`", scrutinee)
        }
        TypeErrorKind::UnknownMember { name, .. } => format!("no member `{}`", name),
        TypeErrorKind::DuplicateField { .. } => "initialized again here".to_string(),
        TypeErrorKind::NotCallable { ty } => format!("`{}` is not a function", ty),
        TypeErrorKind::UnsupportedConstruct { .. } => "here".to_string(),
    }
}

/// A help line for errors with an obvious fix.
fn fix_suggestion(kind: &TypeErrorKind) -> Option<String> {
    match kind {
        TypeErrorKind::Mismatch { expected, found } => match (expected, found) {
            (Ty::Int(e), Ty::Int(f)) if e.signed && !f.signed => {
                Some(format!("negating needs a signed type; cast to `{}` first", expected))
            }
            (Ty::Nullable(inner), other) if **inner == *other => None,
            (_, Ty::Nullable(inner)) if **inner == *expected => {
                Some("assert the value is present with `!`".to_string())
            }
            _ => None,
        },
        TypeErrorKind::ArityMismatch { expected, found } if expected > found => {
            Some(format!("missing {} argument(s)", expected - found))
        }
        TypeErrorKind::ArityMismatch { expected, found } => {
            Some(format!("{} extra argument(s)", found - expected))
        }
        TypeErrorKind::ConstraintViolation { constraint, .. } => {
            Some(format!("the argument must be assignable to `{}`", constraint))
        }
        TypeErrorKind::UnknownMember { ty: Ty::Nullable(_), .. }
        | TypeErrorKind::NotCallable { ty: Ty::Nullable(_) } => {
            Some("use `?.` to access a nullable value".to_string())
        }
        TypeErrorKind::DuplicateField { name } => {
            Some(format!("remove one of the `{}` initializers", name))
        }
        _ => None,
    }
}

/// Clamp to the source and widen empty ranges to one character, staying
/// inside the source; only an empty source yields an empty range.
fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    if range.start != range.end {
        range
    } else if range.end < len {
        range.start..range.end + 1
    } else {
        len.saturating_sub(1)..len
    }
}

/// Render one error located at `span` of `source`.
pub fn render_diagnostic(
    error: &TypeError,
    span: Span,
    source: &str,
    filename: &str,
    options: &DiagnosticOptions,
) -> String {
    let range = clamp(span.to_range(source.len()), source.len());
    let label = label_text(&error.kind);
    let help = fix_suggestion(&error.kind);

    if options.json {
        let index = LineIndex::new(source);
        let (line, column) = index.line_col(range.start as u32);
        let diag = JsonDiagnostic {
            code: error.code(),
            severity: "error",
            message: error.kind.to_string(),
            file: filename,
            spans: vec![JsonSpan {
                start: range.start,
                end: range.end,
                line,
                column,
                label,
            }],
            help,
        };
        return serde_json::to_string(&diag).unwrap_or_default();
    }

    let config = Config::default().with_color(options.color);
    let mut builder = Report::build(ReportKind::Error, (filename, range.clone()))
        .with_code(error.code())
        .with_message(error.kind.to_string())
        .with_config(config)
        .with_label(
            Label::new((filename, range))
                .with_message(label)
                .with_color(Color::Red),
        );
    if let Some(help) = help {
        builder.set_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    if report.write((filename, Source::from(source)), &mut buf).is_err() {
        return format!("error[{}]: {}", error.code(), error.kind);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use typec_ast::NodeId;

    #[test]
    fn json_output_is_one_line() {
        let err = TypeError::new(
            TypeErrorKind::DuplicateField { name: "x".into() },
            Some(NodeId(4)),
        );
        let source = "let p = {x: 1,\n  x: 2}";
        let out = render_diagnostic(
            &err,
            Span::new(17, 21),
            source,
            "p.tc",
            &DiagnosticOptions::json_mode(),
        );
        insta::assert_snapshot!(out, @r#"{"code":"E0007","severity":"error","message":"field `x` is initialized more than once","file":"p.tc","spans":[{"start":17,"end":21,"line":2,"column":3,"label":"initialized again here"}],"help":"remove one of the `x` initializers"}"#);
    }

    #[test]
    fn text_output_names_code_and_label() {
        let err = TypeError::new(
            TypeErrorKind::NotCallable { ty: Ty::Bool },
            Some(NodeId(1)),
        );
        let out = render_diagnostic(
            &err,
            Span::new(0, 4),
            "flag()",
            "f.tc",
            &DiagnosticOptions::colorless(),
        );
        assert!(out.contains("[E0008]"));
        assert!(out.contains("f.tc:1:1"), "got: {out}");
        assert!(out.contains("`bool` is not callable"));
        assert!(out.contains("`bool` is not a function"));
    }

    #[test]
    fn empty_spans_are_widened() {
        assert_eq!(clamp(3..3, 10), 3..4);
        assert_eq!(clamp(2..5, 10), 2..5);
    }

    #[test]
    fn empty_span_at_end_of_source_stays_inside() {
        assert_eq!(clamp(10..10, 10), 9..10);
        assert_eq!(clamp(0..0, 0), 0..0);
    }
}
