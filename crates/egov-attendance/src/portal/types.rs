/// Types for scraped attendance data
use serde::{Deserialize, Serialize, Serializer};

/// Kind of class a row refers to, as printed by the portal.
///
/// The portal currently only emits `LECT` and `LAB`; any other token is
/// carried through verbatim so the row still counts toward the overall
/// aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassType {
    Lecture,
    Lab,
    Other(String),
}

impl ClassType {
    pub fn parse(s: &str) -> Self {
        match s {
            "LECT" => ClassType::Lecture,
            "LAB" => ClassType::Lab,
            other => ClassType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClassType::Lecture => "LECT",
            ClassType::Lab => "LAB",
            ClassType::Other(s) => s,
        }
    }
}

impl Serialize for ClassType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ClassType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ClassType::parse(&s))
    }
}

/// One row of the attendance table, as rendered by the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub course_code: String,

    /// Resolved from the lookup table; empty when the code had no match
    /// (display falls back to the code)
    pub course_name: String,

    pub class_type: ClassType,

    pub present: u32,

    pub total: u32,

    /// Percentage string exactly as the portal printed it; may diverge
    /// slightly from the computed value due to rounding
    pub percentage: String,
}

/// Raw scraper output: parsed rows plus header metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttendance {
    pub data: Vec<SubjectRecord>,

    /// The portal's own gross figure (lectures only), or a value computed
    /// from the lecture rows when the header didn't carry one
    pub lecture_gross: String,

    /// Always computed from the lab rows; the header never carries it
    pub lab_gross: String,

    /// Semester number from the header, empty if not found
    pub semester: String,
}
