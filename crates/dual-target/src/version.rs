//! Numeric engine versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A `major.minor.patch` engine version compared numerically.
///
/// Missing components default to zero, so `"61"`, `"61.0"` and `"61.0.0"`
/// are equal. A range such as `"11.0-11.2"` parses as its lower bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The largest version strictly below this one, if any.
    ///
    /// Steps the lowest non-zero component down by one.
    pub fn predecessor(self) -> Option<Self> {
        if self.patch > 0 {
            Some(Self::new(self.major, self.minor, self.patch - 1))
        } else if self.minor > 0 {
            Some(Self::new(self.major, self.minor - 1, u32::MAX))
        } else if self.major > 0 {
            Some(Self::new(self.major - 1, u32::MAX, u32::MAX))
        } else {
            None
        }
    }
}

impl FromStr for EngineVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().split('-').next().unwrap_or_default().trim();
        if lower.is_empty() {
            return Err(format!("empty version `{s}`"));
        }

        let mut parts = [0u32; 3];
        let mut count = 0;
        for part in lower.split('.') {
            if count == parts.len() {
                return Err(format!("too many components in `{s}`"));
            }
            parts[count] = part
                .parse()
                .map_err(|_| format!("non-numeric component `{part}` in `{s}`"))?;
            count += 1;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl TryFrom<String> for EngineVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EngineVersion> for String {
    fn from(version: EngineVersion) -> Self {
        version.to_string()
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_versions() {
        assert_eq!("61".parse::<EngineVersion>().unwrap(), EngineVersion::new(61, 0, 0));
        assert_eq!("10.1".parse::<EngineVersion>().unwrap(), EngineVersion::new(10, 1, 0));
        assert_eq!("10.3.2".parse::<EngineVersion>().unwrap(), EngineVersion::new(10, 3, 2));
    }

    #[test]
    fn ranges_use_lower_bound() {
        assert_eq!(
            "11.0-11.2".parse::<EngineVersion>().unwrap(),
            EngineVersion::new(11, 0, 0)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("TP".parse::<EngineVersion>().is_err());
        assert!("".parse::<EngineVersion>().is_err());
        assert!("1.2.3.4".parse::<EngineVersion>().is_err());
    }

    #[test]
    fn comparison_is_numeric() {
        let nine: EngineVersion = "9.0.0".parse().unwrap();
        let ten: EngineVersion = "10.0.0".parse().unwrap();
        assert!(nine < ten);
        assert!(EngineVersion::new(10, 1, 0) > EngineVersion::new(10, 0, 9));
    }

    #[test]
    fn predecessor_steps_down() {
        let v = EngineVersion::new(61, 0, 0);
        let below = v.predecessor().unwrap();
        assert!(below < v);
        assert_eq!(below.major, 60);
        assert_eq!(EngineVersion::new(0, 0, 0).predecessor(), None);
    }
}
