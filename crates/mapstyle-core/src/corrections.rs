//! Correction log.
//!
//! Every silent fix the engine applies (a corrected typo, a rewritten filter
//! attribute) and every recoverable problem it works around (an unknown layer
//! type, an unresolvable attribute) is recorded here. The log is advisory: it
//! never turns a build into a failure.
//!
//! Each entry has a stable code in the `MS-<component>-<n>` scheme:
//!
//! | prefix | component |
//! |--------|-----------|
//! | MS-1   | layer resolution |
//! | MS-2   | filter compilation |
//! | MS-3   | paint synthesis |
//! | MS-4   | style assembly |

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionKind {
    /// Input was changed to something the engine believes was meant
    Correction,
    /// Input was ignored or passed through despite looking wrong
    Warning,
}

impl CorrectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionKind::Correction => "correction",
            CorrectionKind::Warning => "warning",
        }
    }
}

/// What a log entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrectionCode {
    LayerTypeCorrected,
    LayerNotFound,
    ValueCorrected,
    ValueOutOfEnumeratedSet,
    ValueOutOfRange,
    AttributeRewritten,
    RewrittenPairDropped,
    FilterAttributeUnresolvable,
    MalformedFilter,
    MalformedExpression,
    OpacityClamped,
    InvalidWidth,
    SlotReplaced,
    SlotIgnored,
}

impl CorrectionCode {
    pub fn code(&self) -> &'static str {
        match self {
            CorrectionCode::LayerTypeCorrected => "MS-1-1",
            CorrectionCode::LayerNotFound => "MS-1-2",
            CorrectionCode::ValueCorrected => "MS-2-1",
            CorrectionCode::ValueOutOfEnumeratedSet => "MS-2-2",
            CorrectionCode::ValueOutOfRange => "MS-2-3",
            CorrectionCode::AttributeRewritten => "MS-2-4",
            CorrectionCode::RewrittenPairDropped => "MS-2-5",
            CorrectionCode::FilterAttributeUnresolvable => "MS-2-6",
            CorrectionCode::MalformedFilter => "MS-2-7",
            CorrectionCode::MalformedExpression => "MS-3-1",
            CorrectionCode::OpacityClamped => "MS-3-2",
            CorrectionCode::InvalidWidth => "MS-3-3",
            CorrectionCode::SlotReplaced => "MS-4-1",
            CorrectionCode::SlotIgnored => "MS-4-2",
        }
    }

    /// Kind implied by the code.
    pub fn kind(&self) -> CorrectionKind {
        match self {
            CorrectionCode::LayerTypeCorrected
            | CorrectionCode::ValueCorrected
            | CorrectionCode::AttributeRewritten
            | CorrectionCode::OpacityClamped
            | CorrectionCode::SlotReplaced => CorrectionKind::Correction,
            CorrectionCode::LayerNotFound
            | CorrectionCode::ValueOutOfEnumeratedSet
            | CorrectionCode::ValueOutOfRange
            | CorrectionCode::RewrittenPairDropped
            | CorrectionCode::FilterAttributeUnresolvable
            | CorrectionCode::MalformedFilter
            | CorrectionCode::MalformedExpression
            | CorrectionCode::InvalidWidth
            | CorrectionCode::SlotIgnored => CorrectionKind::Warning,
        }
    }
}

/// One entry of the correction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub code: CorrectionCode,
    /// Requested layer type the entry belongs to
    pub layer: String,
    pub message: String,
    pub hint: Option<String>,
}

impl Correction {
    pub fn new(code: CorrectionCode, layer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            layer: layer.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn kind(&self) -> CorrectionKind {
        self.code.kind()
    }
}

impl std::fmt::Display for Correction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.kind().as_str(),
            self.code.code(),
            self.layer,
            self.message
        )?;
        if let Some(hint) = &self.hint {
            write!(f, " ({})", hint)?;
        }
        Ok(())
    }
}

/// Ordered collection of corrections and warnings for one build.
///
/// Serializes as a list of human-readable strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionLog {
    entries: Vec<Correction>,
}

impl CorrectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Correction) {
        match entry.kind() {
            CorrectionKind::Warning => tracing::warn!(code = entry.code.code(), "{}", entry),
            CorrectionKind::Correction => tracing::debug!(code = entry.code.code(), "{}", entry),
        }
        self.entries.push(entry);
    }

    pub fn record(&mut self, code: CorrectionCode, layer: &str, message: impl Into<String>) {
        self.push(Correction::new(code, layer, message));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Correction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of the given kind.
    pub fn count(&self, kind: CorrectionKind) -> usize {
        self.entries.iter().filter(|e| e.kind() == kind).count()
    }

    /// Whether any entry carries the given code.
    pub fn contains(&self, code: CorrectionCode) -> bool {
        self.entries.iter().any(|e| e.code == code)
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl Serialize for CorrectionLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(ToString::to_string))
    }
}
