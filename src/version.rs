//! Two-component platform version handling.

use std::fmt;
use std::str::FromStr;

use crate::error::CpupError;

/// First release line that ships without a standalone KSQL service.
///
/// Environments starting at or past this line have no dedicated KSQL
/// upgrade to run; the comparison is strictly less-than, so a start at
/// exactly this version skips the step.
pub const KSQL_REMOVED_VERSION: PlatformVersion = PlatformVersion { major: 5, minor: 4 };

/// A `<major>.<minor>` platform release line.
///
/// Ordering is component-wise numeric: majors compare first, minors break
/// ties. `4.9 < 5.3 < 5.4 < 6.0` regardless of string length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformVersion {
    pub major: u32,
    pub minor: u32,
}

impl PlatformVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Whether an upgrade starting from this release line still has a
    /// standalone KSQL service to upgrade.
    pub fn needs_standalone_ksql_upgrade(&self) -> bool {
        *self < KSQL_REMOVED_VERSION
    }
}

impl FromStr for PlatformVersion {
    type Err = CpupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn invalid(s: &str) -> CpupError {
            CpupError::InvalidVersion(s.to_string())
        }

        let (major, minor) = s.split_once('.').ok_or_else(|| invalid(s))?;
        if major.is_empty()
            || minor.is_empty()
            || !major.bytes().all(|b| b.is_ascii_digit())
            || !minor.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid(s));
        }

        Ok(Self {
            major: major.parse().map_err(|_| invalid(s))?,
            minor: minor.parse().map_err(|_| invalid(s))?,
        })
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
