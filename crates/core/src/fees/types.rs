//! Fee rule types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use scholaris_shared::types::{
    AcademicSessionId, ClassId, FeeId, SchoolId, SectionId, StudentId, TermId,
};

/// Largest amount a `DECIMAL(12,2)` money column holds (9,999,999,999.99).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);


/// Storage name of each fee scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeScopeKind {
    /// Charged to every student of the school.
    School,
    /// Charged to members of the fee's section.
    Section,
    /// Charged to students of one class.
    Class,
    /// Charged to a single student.
    Student,
}

impl FeeScopeKind {
    /// Every scope kind, broadest first.
    pub const ALL: [Self; 4] = [Self::School, Self::Section, Self::Class, Self::Student];

    /// Returns the storage string for this scope.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Section => "section",
            Self::Class => "class",
            Self::Student => "student",
        }
    }
}

impl std::str::FromStr for FeeScopeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "school" => Ok(Self::School),
            "section" => Ok(Self::Section),
            "class" => Ok(Self::Class),
            "student" => Ok(Self::Student),
            other => Err(format!("unknown fee scope: {other}")),
        }
    }
}

impl std::fmt::Display for FeeScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a fee is charged to.
///
/// Each variant carries exactly the key it needs, so a fee row can never
/// match a student through two scopes at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "target", rename_all = "snake_case")]
pub enum FeeScope {
    /// Every student of the school.
    School,
    /// Students enrolled in the section.
    Section(SectionId),
    /// Students whose class matches.
    Class(ClassId),
    /// One student.
    Student(StudentId),
}

impl FeeScope {
    /// Builds a scope from the stored columns of a fee row.
    ///
    /// Returns `None` for rows whose scope column names a key that is null,
    /// e.g. a `class` fee without `class_id`. Such rows never apply.
    #[must_use]
    pub fn from_columns(
        kind: FeeScopeKind,
        section_id: SectionId,
        class_id: Option<ClassId>,
        student_id: Option<StudentId>,
    ) -> Option<Self> {
        match kind {
            FeeScopeKind::School => Some(Self::School),
            FeeScopeKind::Section => Some(Self::Section(section_id)),
            FeeScopeKind::Class => class_id.map(Self::Class),
            FeeScopeKind::Student => student_id.map(Self::Student),
        }
    }

    /// Returns the storage kind of this scope.
    #[must_use]
    pub const fn kind(&self) -> FeeScopeKind {
        match self {
            Self::School => FeeScopeKind::School,
            Self::Section(_) => FeeScopeKind::Section,
            Self::Class(_) => FeeScopeKind::Class,
            Self::Student(_) => FeeScopeKind::Student,
        }
    }

    /// Returns true if a fee with this scope is charged to the student.
    #[must_use]
    pub fn applies_to(&self, student: &StudentProfile) -> bool {
        match self {
            Self::School => true,
            Self::Section(section_id) => student.section_ids.contains(section_id),
            Self::Class(class_id) => student.class_id == Some(*class_id),
            Self::Student(student_id) => student.id == *student_id,
        }
    }
}

/// The parts of a student that fee resolution looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProfile {
    /// Student ID.
    pub id: StudentId,
    /// Owning school.
    pub school_id: SchoolId,
    /// Current class, if assigned.
    pub class_id: Option<ClassId>,
    /// Sections the student is enrolled in.
    pub section_ids: Vec<SectionId>,
}

/// An active or inactive fee record reduced to what billing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRule {
    /// Fee ID.
    pub id: FeeId,
    /// Owning school.
    pub school_id: SchoolId,
    /// Academic session the fee is billed in.
    pub session_id: AcademicSessionId,
    /// Term the fee is billed in.
    pub term_id: TermId,
    /// Amount charged.
    pub amount: Decimal,
    /// Who is charged.
    pub scope: FeeScope,
    /// Inactive fees are never charged.
    pub is_active: bool,
}

impl FeeRule {
    /// Returns true if this fee is charged to the student.
    #[must_use]
    pub fn applies_to(&self, student: &StudentProfile) -> bool {
        self.is_active && self.school_id == student.school_id && self.scope.applies_to(student)
    }
}

/// Optional academic period restriction for totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFilter {
    /// Restrict to one session.
    pub session_id: Option<AcademicSessionId>,
    /// Restrict to one term.
    pub term_id: Option<TermId>,
}

impl PeriodFilter {
    /// Filter that accepts every period.
    pub const ALL: Self = Self {
        session_id: None,
        term_id: None,
    };

    /// Returns true if a record billed in the given period passes the filter.
    ///
    /// Records without a session or term only pass when the filter does not
    /// restrict that dimension.
    #[must_use]
    pub fn matches(&self, session_id: Option<AcademicSessionId>, term_id: Option<TermId>) -> bool {
        let session_ok = self.session_id.is_none_or(|wanted| session_id == Some(wanted));
        let term_ok = self.term_id.is_none_or(|wanted| term_id == Some(wanted));
        session_ok && term_ok
    }
}
