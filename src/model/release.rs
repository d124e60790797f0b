use crate::error::{Error, Result};
use semver::Version;
use std::fmt;

/// A release tag such as `v1.8.2`, kept verbatim alongside its parsed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    raw: String,
    version: Version,
}

impl ReleaseTag {
    /// Parses a tag, accepting an optional leading `v`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTag`] if the remainder is not a semantic version.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let version = Version::parse(strip_prefix(trimmed)).map_err(|source| Error::InvalidTag {
            tag: raw.to_string(),
            source,
        })?;

        Ok(Self {
            raw: trimmed.to_string(),
            version,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The tag without its prefix, as used in bucket paths and git refs.
    pub fn unprefixed(&self) -> &str {
        strip_prefix(&self.raw)
    }

    /// The `(major, minor)` pair identifying this tag's minor-version group.
    pub fn minor_line(&self) -> (u64, u64) {
        (self.version.major, self.version.minor)
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn strip_prefix(tag: &str) -> &str {
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixed_tag() {
        let tag = ReleaseTag::parse("v1.8.2").unwrap();
        assert_eq!(tag.raw(), "v1.8.2");
        assert_eq!(tag.unprefixed(), "1.8.2");
        assert_eq!(tag.version(), &Version::new(1, 8, 2));
        assert_eq!(tag.minor_line(), (1, 8));
    }

    #[test]
    fn test_parse_bare_tag() {
        let tag = ReleaseTag::parse("1.6.9").unwrap();
        assert_eq!(tag.unprefixed(), "1.6.9");
        assert_eq!(tag.to_string(), "1.6.9");
    }

    #[test]
    fn test_parse_prerelease_tag() {
        let tag = ReleaseTag::parse("v1.7.0-beta3").unwrap();
        assert_eq!(tag.minor_line(), (1, 7));
        assert!(tag.version() < &Version::new(1, 7, 0));
    }

    #[test]
    fn test_parse_invalid_tag() {
        let err = ReleaseTag::parse("v1.8").unwrap_err();
        assert!(matches!(err, Error::InvalidTag { ref tag, .. } if tag == "v1.8"));

        assert!(ReleaseTag::parse("latest").is_err());
        assert!(ReleaseTag::parse("").is_err());
    }
}
