//! Normalization of Ruby version identifiers
//!
//! The same Ruby release is spelled three ways depending on who is asking:
//!
//! - The download server separates a pre-release with a dash:
//!   `ruby-3.3.0-preview2.tar.gz`
//! - `ruby -v` drops the separator entirely: `ruby 3.3.0preview2`
//! - Bundler (and therefore `Gemfile.lock`) uses a dot: `ruby 3.3.0.preview2`
//!
//! Source tarballs must be fetched with the download form, while the produced
//! artifact must be named with the bundler form because that is what the
//! buildpack derives from `bundle platform`. [`VersionParts`] accepts either
//! pre-release spelling and emits both.

use crate::error::{BuilderError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

const VERSION_PATTERN: &str =
    r"(?s)^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?P<separator>[-.])?(?P<pre>.*)$";

/// Character that separated the pre-release from `major.minor.patch` in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    None,
    Dash,
    Dot,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::None => "",
            Separator::Dash => "-",
            Separator::Dot => ".",
        }
    }
}

/// Structured form of a Ruby release identifier
///
/// Equality ignores [`Separator`]: `3.3.0-rc1` and `3.3.0.rc1` name the same release.
#[derive(Debug, Clone)]
pub struct VersionParts {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub separator: Separator,
    pub pre: Option<String>,
}

impl VersionParts {
    /// Parse a version string with an optional pre-release
    ///
    /// Accepts `M.m.p`, `M.m.p-pre` and `M.m.p.pre`. Everything after the
    /// separator is kept verbatim as the pre-release.
    ///
    /// # Examples
    /// ```
    /// use ruby_builder::domain::VersionParts;
    ///
    /// let parts = VersionParts::parse("3.3.0.preview2").unwrap();
    /// assert_eq!(parts.download_format(), "3.3.0-preview2");
    /// assert_eq!(parts.bundler_format(), "3.3.0.preview2");
    /// ```
    pub fn parse(version: &str) -> Result<Self> {
        let re = Regex::new(VERSION_PATTERN)
            .map_err(|e| BuilderError::invalid_version(version, e.to_string()))?;

        let captures = re.captures(version).ok_or_else(|| {
            BuilderError::invalid_version(version, "expected <major>.<minor>.<patch>")
        })?;

        let number = |name: &str| -> Result<u32> {
            let text = captures.name(name).map(|m| m.as_str()).unwrap_or("");
            text.parse::<u32>().map_err(|e| {
                BuilderError::invalid_version(version, format!("invalid {} '{}': {}", name, text, e))
            })
        };

        let major = number("major")?;
        let minor = number("minor")?;
        let patch = number("patch")?;

        let separator = match captures.name("separator").map(|m| m.as_str()) {
            Some("-") => Separator::Dash,
            Some(".") => Separator::Dot,
            _ => Separator::None,
        };
        let pre = captures
            .name("pre")
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty());

        let pre = match (separator, pre) {
            (Separator::None, Some(pre)) => {
                return Err(BuilderError::invalid_version(
                    version,
                    format!("pre-release '{}' must follow '-' or '.'", pre),
                ));
            }
            (Separator::Dash | Separator::Dot, None) => {
                return Err(BuilderError::invalid_version(
                    version,
                    "separator is not followed by a pre-release",
                ));
            }
            (_, pre) => pre.map(str::to_string),
        };

        Ok(VersionParts {
            major,
            minor,
            patch,
            separator,
            pre,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// `M.m.p` without any pre-release
    pub fn major_minor_patch(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// Form used on the download server, `M.m.p-pre`
    pub fn download_format(&self) -> String {
        self.join_pre("-")
    }

    /// Form used by bundler and `Gemfile.lock`, `M.m.p.pre`
    pub fn bundler_format(&self) -> String {
        self.join_pre(".")
    }

    fn join_pre(&self, separator: &str) -> String {
        match &self.pre {
            Some(pre) => format!("{}{}{}", self.major_minor_patch(), separator, pre),
            None => self.major_minor_patch(),
        }
    }
}

impl PartialEq for VersionParts {
    fn eq(&self, other: &Self) -> bool {
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.pre == other.pre
    }
}

impl Eq for VersionParts {}

impl FromStr for VersionParts {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self> {
        VersionParts::parse(s)
    }
}

impl fmt::Display for VersionParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.download_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release() {
        let parts = VersionParts::parse("3.3.0").unwrap();
        assert_eq!(parts.major, 3);
        assert_eq!(parts.minor, 3);
        assert_eq!(parts.patch, 0);
        assert_eq!(parts.separator, Separator::None);
        assert_eq!(parts.pre, None);
        assert!(!parts.is_prerelease());
    }

    #[test]
    fn test_parse_download_form() {
        let parts = VersionParts::parse("3.3.0-preview2").unwrap();
        assert_eq!(parts.separator, Separator::Dash);
        assert_eq!(parts.pre.as_deref(), Some("preview2"));
        assert_eq!(parts.download_format(), "3.3.0-preview2");
        assert_eq!(parts.bundler_format(), "3.3.0.preview2");
    }

    #[test]
    fn test_parse_bundler_form() {
        let parts = VersionParts::parse("3.3.0.preview2").unwrap();
        assert_eq!(parts.separator, Separator::Dot);
        assert_eq!(parts.pre.as_deref(), Some("preview2"));
        assert_eq!(parts.download_format(), "3.3.0-preview2");
        assert_eq!(parts.bundler_format(), "3.3.0.preview2");
    }

    #[test]
    fn test_trailing_garbage_preserved() {
        let parts = VersionParts::parse("3.3.0-rc1+build~2").unwrap();
        assert_eq!(parts.pre.as_deref(), Some("rc1+build~2"));
        assert_eq!(parts.bundler_format(), "3.3.0.rc1+build~2");
    }

    #[test]
    fn test_pre_keeps_every_remaining_character() {
        let parts = VersionParts::parse("3.3.0-rc1\nlocal").unwrap();
        assert_eq!(parts.pre.as_deref(), Some("rc1\nlocal"));
        assert_eq!(parts.download_format(), "3.3.0-rc1\nlocal");
    }

    #[test]
    fn test_equality_ignores_separator() {
        let dash = VersionParts::parse("3.1.0-rc1").unwrap();
        let dot = VersionParts::parse("3.1.0.rc1").unwrap();
        assert_eq!(dash, dot);
        assert_ne!(dash.separator, dot.separator);
    }

    #[test]
    fn test_invalid_versions() {
        assert!(VersionParts::parse("3.-1.2-preview1").is_err());
        assert!(VersionParts::parse("3.1").is_err());
        assert!(VersionParts::parse("3").is_err());
        assert!(VersionParts::parse("3-1").is_err());
        assert!(VersionParts::parse("").is_err());
        assert!(VersionParts::parse("ruby-3.1.2").is_err());
    }

    #[test]
    fn test_pre_without_separator_rejected() {
        let err = VersionParts::parse("3.3.0preview2").unwrap_err();
        assert!(err.to_string().contains("must follow"));
    }

    #[test]
    fn test_separator_without_pre_rejected() {
        assert!(VersionParts::parse("3.3.0-").is_err());
        assert!(VersionParts::parse("3.3.0.").is_err());
    }

    #[test]
    fn test_number_overflow_rejected() {
        assert!(VersionParts::parse("99999999999.0.0").is_err());
    }
}
