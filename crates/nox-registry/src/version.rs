//! Semantic versions and version constraints.
//!
//! Versions are `major[.minor[.patch]][-pre]` with an optional leading `v`.
//! Omitted components default to zero.
//!
//! Pre-release suffixes compare byte-wise, so `1.0.0-10` sorts before
//! `1.0.0-9`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{RegistryError, RegistryResult};

/// A parsed semantic version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release suffix, `None` for stable releases.
    pub pre: Option<String>,
}

impl Version {
    /// Stable version from components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Parse a version string.
    ///
    /// ```
    /// use nox_registry::Version;
    ///
    /// let v = Version::parse("v1.2").unwrap();
    /// assert_eq!(v.to_string(), "1.2.0");
    ///
    /// let beta = Version::parse("2.0.0-beta.1").unwrap();
    /// assert_eq!(beta.pre.as_deref(), Some("beta.1"));
    /// ```
    pub fn parse(input: &str) -> RegistryResult<Self> {
        let s = input.strip_prefix('v').unwrap_or(input);
        if s.is_empty() {
            return Err(RegistryError::validation("version", "empty version string"));
        }

        let (core, pre) = match s.split_once('-') {
            Some((_, "")) => {
                return Err(RegistryError::validation(
                    "version",
                    format!("empty pre-release suffix in {:?}", input),
                ))
            }
            Some((core, pre)) => (core, Some(pre.to_string())),
            None => (s, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(RegistryError::validation(
                "version",
                format!("{:?}: expected major[.minor[.patch]]", input),
            ));
        }

        let mut nums = [0_u64; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = parse_component(part).ok_or_else(|| {
                RegistryError::validation(
                    "version",
                    format!("{:?}: invalid component {:?}", input, part),
                )
            })?;
        }

        Ok(Self {
            major: nums[0],
            minor: nums[1],
            patch: nums[2],
            pre,
        })
    }

    /// Whether this is a pre-release.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl FromStr for Version {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| compare_pre(self.pre.as_deref(), other.pre.as_deref()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Stable outranks any pre-release; two pre-releases compare byte-wise.
fn compare_pre(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.as_bytes().cmp(b.as_bytes()),
    }
}

/// A version range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `*`
    Any,
    /// `1.2.3`
    Exact(Version),
    /// `>=1.2.3`
    AtLeast(Version),
    /// `^1.2.3`: at least the reference, same major (same minor when major is 0).
    Caret(Version),
    /// `~1.2.3`: at least the reference, same major and minor.
    Tilde(Version),
}

impl Constraint {
    /// Parse a constraint string.
    pub fn parse(input: &str) -> RegistryResult<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Err(RegistryError::validation(
                "constraint",
                "empty constraint string",
            ));
        }
        if s == "*" {
            return Ok(Self::Any);
        }

        let (make, rest): (fn(Version) -> Self, &str) = if let Some(rest) = s.strip_prefix(">=") {
            (Self::AtLeast, rest)
        } else if let Some(rest) = s.strip_prefix('^') {
            (Self::Caret, rest)
        } else if let Some(rest) = s.strip_prefix('~') {
            (Self::Tilde, rest)
        } else if s.starts_with(|c: char| c.is_ascii_digit() || c == 'v') {
            (Self::Exact, s)
        } else {
            return Err(RegistryError::validation(
                "constraint",
                format!("{:?}: unrecognized operator", input),
            ));
        };

        let version = Version::parse(rest.trim()).map_err(|e| {
            RegistryError::validation("constraint", format!("{:?}: {}", input, e))
        })?;
        Ok(make(version))
    }

    /// Whether `v` satisfies this constraint.
    pub fn matches(&self, v: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(r) => v == r,
            Self::AtLeast(r) => v >= r,
            Self::Caret(r) => {
                if v < r {
                    return false;
                }
                if r.major == 0 {
                    v.major == 0 && v.minor == r.minor
                } else {
                    v.major == r.major
                }
            }
            Self::Tilde(r) => v >= r && v.major == r.major && v.minor == r.minor,
        }
    }

    /// Reference version, `None` for `*`.
    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::Any => None,
            Self::Exact(v) | Self::AtLeast(v) | Self::Caret(v) | Self::Tilde(v) => Some(v),
        }
    }
}

impl FromStr for Constraint {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(v) => write!(f, "{}", v),
            Self::AtLeast(v) => write!(f, ">={}", v),
            Self::Caret(v) => write!(f, "^{}", v),
            Self::Tilde(v) => write!(f, "~{}", v),
        }
    }
}
