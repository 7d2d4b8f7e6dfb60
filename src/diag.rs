//! Diagnostics reported back to the Strata host.
//!
//! Providers never fail an RPC with a transport error. Every response object
//! carries a [`Diagnostics`] collection, and a failed operation is simply a
//! response with one or more error entries accumulated onto it. The host
//! surfaces diagnostics to the end user, pointing at the offending attribute
//! when a path is attached.

use serde::{Deserialize, Serialize};

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A single warning or error annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The dotted attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        matches!(self.severity, DiagnosticSeverity::Error)
    }
}

impl From<Diagnostic> for crate::generated::Diagnostic {
    fn from(d: Diagnostic) -> Self {
        Self {
            severity: match d.severity {
                DiagnosticSeverity::Error => {
                    crate::generated::diagnostic::Severity::Error as i32
                }
                DiagnosticSeverity::Warning => {
                    crate::generated::diagnostic::Severity::Warning as i32
                }
            },
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        }
    }
}

/// An accumulating, append-only collection of [`Diagnostic`] entries.
///
/// Response objects own one of these. Handlers and helpers add to it; the
/// dispatch layer converts the accumulated entries to protocol diagnostics
/// once the handler returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error diagnostic with a summary and detail.
    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic::error(summary).with_detail(detail));
    }

    /// Append a warning diagnostic with a summary and detail.
    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic::warning(summary).with_detail(detail));
    }

    /// Append an error diagnostic tied to an attribute path.
    pub fn add_attribute_error(
        &mut self,
        attribute: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.0.push(
            Diagnostic::error(summary)
                .with_detail(detail)
                .with_attribute(attribute),
        );
    }

    /// Append a single diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Move every entry of `other` onto the end of this collection.
    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Whether any entry is an error.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Whether the collection holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries, errors and warnings alike.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Iterate over the error entries only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    /// Iterate over the warning entries only.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_error())
    }

    /// Convert the collection into protocol diagnostics.
    pub(crate) fn into_proto(self) -> Vec<crate::generated::Diagnostic> {
        self.0.into_iter().map(Into::into).collect()
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(entries: Vec<Diagnostic>) -> Self {
        Self(entries)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}
