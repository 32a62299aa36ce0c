/// Types for the skip-calculation report
use crate::portal::SubjectRecord;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Four-level classification of an attendance percentage.
///
/// Ordered, inclusive lower bounds: >= 85 safe, >= 75 caution,
/// >= 70 warning, else critical. A boundary value belongs to the higher
/// tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Safe,
    Caution,
    Warning,
    Critical,
}

impl Severity {
    pub fn level(&self) -> &'static str {
        match self {
            Severity::Safe => "safe",
            Severity::Caution => "caution",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Dashboard color for this tier.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Safe => "green",
            Severity::Caution => "yellow",
            Severity::Warning => "orange",
            Severity::Critical => "red",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Safe => "Safe",
            Severity::Caution => "Caution",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }
}

// Serialized as the `{level, color, label}` object the dashboard expects.
impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Severity", 3)?;
        s.serialize_field("level", self.level())?;
        s.serialize_field("color", self.color())?;
        s.serialize_field("label", self.label())?;
        s.end()
    }
}

/// A subject row plus its derived skip/severity fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSubject {
    #[serde(flatten)]
    pub record: SubjectRecord,

    /// Computed percentage, rounded to 2 decimals
    pub percentage_num: f64,

    /// >= 0: that many further absences stay above the subject threshold;
    /// < 0: that many consecutive presences are still required
    pub skippable: i64,

    pub severity: Severity,
}

/// Aggregate across all rows, lectures and labs alike.
#[derive(Debug, Clone, Serialize)]
pub struct OverallTotals {
    pub present: u32,
    pub total: u32,
    pub percentage: f64,
    pub skippable: i64,
    pub severity: Severity,
}

/// Display-only subtotal for one class type; no skip or severity is
/// derived for these.
#[derive(Debug, Clone, Serialize)]
pub struct GroupTotals {
    pub present: u32,
    pub total: u32,
    pub percentage: f64,
}

/// Threshold percentages rendered for presentation; decisions always use
/// the float constants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdLabels {
    pub per_subject: String,
    pub overall: String,
}

/// The decision-ready report: the sole artifact returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub subjects: Vec<EnrichedSubject>,
    pub overall: OverallTotals,
    pub lecture_gross: GroupTotals,
    pub lab_gross: GroupTotals,
    pub semester: String,
    pub thresholds: ThresholdLabels,
}
