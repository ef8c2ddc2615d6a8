//! Newtype identifiers for the entities the matching engine reasons about.
//!
//! Every id in the source tables is an integer key (applicant id, program
//! id, quota id, institution id, grade id). Wrapping them keeps a program
//! id from being accidentally compared against a quota id even though both
//! are `i64` underneath.

use std::fmt;
use std::str::FromStr;

macro_rules! def_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub i64);

        impl $name {
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map($name)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                $name(v)
            }
        }
    };
}

def_id!(ApplicantId);
def_id!(ProgramId);
def_id!(QuotaId);
def_id!(InstitutionId);
def_id!(GradeId);

/// A program is keyed by (program_id, quota_id) throughout the source
/// tables; grouping the pair keeps lookups from drifting into tuple soup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramKey {
    pub program_id: ProgramId,
    pub quota_id: QuotaId,
}

impl ProgramKey {
    pub fn new(program_id: ProgramId, quota_id: QuotaId) -> Self {
        Self {
            program_id,
            quota_id,
        }
    }
}

impl fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.program_id, self.quota_id)
    }
}
