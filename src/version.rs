//! Version specifier matching.
//!
//! A specifier is interpreted as a semantic-version range when it parses as
//! one, and as a regular expression anchored at the start of the candidate
//! otherwise. The specifier alone decides which interpretation applies; a
//! candidate that is not a valid semantic version simply never satisfies a
//! range.

use crate::error::{RegistryError, Result};
use regex::Regex;
use semver::{Comparator, Op, Version, VersionReq};

/// A parsed version specifier.
#[derive(Debug, Clone)]
pub enum Specifier {
    /// Semantic-version range, pre-releases included in the match set
    Range(VersionReq),
    /// Fallback for labels a range cannot describe (branch names, shas)
    Pattern(Regex),
}

impl Specifier {
    /// Parse a specifier string.
    ///
    /// # Returns
    /// * `Ok(Specifier::Range)` - If the string is a valid semver range
    /// * `Ok(Specifier::Pattern)` - If it is not a range but a valid regex
    /// * `Err(InvalidSpecifier)` - If it is neither
    pub fn parse(specifier: &str) -> Result<Self> {
        if let Ok(req) = VersionReq::parse(specifier) {
            return Ok(Specifier::Range(req));
        }

        Regex::new(&format!("^(?:{})", specifier))
            .map(Specifier::Pattern)
            .map_err(|e| RegistryError::InvalidSpecifier {
                specifier: specifier.to_string(),
                reason: e.to_string(),
            })
    }

    /// Test whether a version label is a member of this specifier.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Specifier::Range(req) => match Version::parse(candidate) {
                Ok(version) => range_includes(req, &version),
                Err(_) => false,
            },
            Specifier::Pattern(re) => re.is_match(candidate),
        }
    }
}

/// Parse `specifier` and test `candidate` against it in one step.
pub fn matches(specifier: &str, candidate: &str) -> Result<bool> {
    Ok(Specifier::parse(specifier)?.matches(candidate))
}

/// Range membership with pre-release versions included.
///
/// Applies the comparator rules of the semver crate but without its rule
/// that a pre-release only matches comparators on the same
/// `major.minor.patch`. For versions without a pre-release tag the result is
/// identical to [`VersionReq::matches`].
fn range_includes(req: &VersionReq, version: &Version) -> bool {
    req.comparators
        .iter()
        .all(|cmp| comparator_includes(cmp, version))
}

fn comparator_includes(cmp: &Comparator, ver: &Version) -> bool {
    match cmp.op {
        Op::Exact | Op::Wildcard => matches_exact(cmp, ver),
        Op::Greater => matches_greater(cmp, ver),
        Op::GreaterEq => matches_exact(cmp, ver) || matches_greater(cmp, ver),
        Op::Less => matches_less(cmp, ver),
        Op::LessEq => matches_exact(cmp, ver) || matches_less(cmp, ver),
        Op::Tilde => matches_tilde(cmp, ver),
        Op::Caret => matches_caret(cmp, ver),
        // Op is non-exhaustive; defer to the library for anything newer.
        _ => cmp.matches(ver),
    }
}

fn matches_exact(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return false;
    }
    if let Some(minor) = cmp.minor {
        if ver.minor != minor {
            return false;
        }
    }
    match cmp.patch {
        Some(patch) => ver.patch == patch && ver.pre == cmp.pre,
        // Partial comparators ("=1.2", "1.2.*") cover every patch and pre-release.
        None => true,
    }
}

fn matches_greater(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return ver.major > cmp.major;
    }
    match cmp.minor {
        None => return false,
        Some(minor) if ver.minor != minor => return ver.minor > minor,
        Some(_) => {}
    }
    match cmp.patch {
        None => return false,
        Some(patch) if ver.patch != patch => return ver.patch > patch,
        Some(_) => {}
    }
    ver.pre > cmp.pre
}

fn matches_less(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return ver.major < cmp.major;
    }
    match cmp.minor {
        None => return false,
        Some(minor) if ver.minor != minor => return ver.minor < minor,
        Some(_) => {}
    }
    match cmp.patch {
        None => return false,
        Some(patch) if ver.patch != patch => return ver.patch < patch,
        Some(_) => {}
    }
    ver.pre < cmp.pre
}

fn matches_tilde(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return false;
    }
    if let Some(minor) = cmp.minor {
        if ver.minor != minor {
            return false;
        }
    }
    if let Some(patch) = cmp.patch {
        if ver.patch != patch {
            return ver.patch > patch;
        }
    }
    ver.pre >= cmp.pre
}

fn matches_caret(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return false;
    }

    let minor = match cmp.minor {
        None => return true,
        Some(minor) => minor,
    };

    let patch = match cmp.patch {
        None => {
            return if cmp.major > 0 {
                ver.minor >= minor
            } else {
                ver.minor == minor
            };
        }
        Some(patch) => patch,
    };

    if cmp.major > 0 {
        if ver.minor != minor {
            return ver.minor > minor;
        } else if ver.patch != patch {
            return ver.patch > patch;
        }
    } else if minor > 0 {
        if ver.minor != minor {
            return false;
        } else if ver.patch != patch {
            return ver.patch > patch;
        }
    } else if ver.minor != minor || ver.patch != patch {
        return false;
    }

    ver.pre >= cmp.pre
}
