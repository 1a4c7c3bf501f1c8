use crate::domain::version_parts::{Separator, VersionParts};
use crate::error::{BuilderError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const DOWNLOAD_HOST: &str = "https://ftp.ruby-lang.org/pub/ruby";

/// A Ruby release together with the build-facing names derived from it
///
/// Ordering compares `major.minor.patch` numerically first. Any pre-release
/// sorts before the release it precedes, so `3.3.0.preview2` and `3.3.0.1`
/// are both below `3.3.0`. Two pre-releases compare like rubygems'
/// `Gem::Version` segments: numbers numerically, text before numbers, missing
/// segments as zero.
#[derive(Debug, Clone)]
pub struct RubyVersion {
    raw: String,
    parts: VersionParts,
}

impl RubyVersion {
    pub fn new(version: impl Into<String>) -> Result<Self> {
        let raw = version.into();
        let parts = VersionParts::parse(&raw)?;
        Ok(RubyVersion { raw, parts })
    }

    /// A released `major.minor.patch`, used for threshold comparisons
    pub fn release(major: u32, minor: u32, patch: u32) -> Self {
        let parts = VersionParts {
            major,
            minor,
            patch,
            separator: Separator::None,
            pre: None,
        };
        RubyVersion {
            raw: parts.major_minor_patch(),
            parts,
        }
    }

    pub fn parts(&self) -> &VersionParts {
        &self.parts
    }

    /// The input string, byte for byte
    pub fn raw_version(&self) -> &str {
        &self.raw
    }

    pub fn major_minor_patch(&self) -> String {
        self.parts.major_minor_patch()
    }

    pub fn preview(&self) -> bool {
        self.parts.is_prerelease()
    }

    pub fn download_url(&self) -> String {
        format!(
            "{host}/{major}.{minor}/{file}.tar.gz",
            host = DOWNLOAD_HOST,
            major = self.parts.major,
            minor = self.parts.minor,
            file = self.ruby_source_dir_name(),
        )
    }

    /// Top level directory inside the upstream source tarball
    pub fn ruby_source_dir_name(&self) -> String {
        format!("ruby-{}", self.parts.download_format())
    }

    /// File name the buildpack requests, derived from the bundler form
    pub fn tar_file_name_output(&self) -> String {
        format!("ruby-{}.tgz", self.parts.bundler_format())
    }

    fn release_triple(&self) -> (u32, u32, u32) {
        (self.parts.major, self.parts.minor, self.parts.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Decimal digits with leading zeros stripped
    Number(String),
    Text(String),
}

impl Segment {
    fn number(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        Segment::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    }

    fn zero() -> Self {
        Segment::Number("0".to_string())
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split a pre-release into runs of digits and runs of letters, dropping anything else
fn tokenize(pre: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, segments: &mut Vec<Segment>| {
        if current.is_empty() {
            return;
        }
        if current.starts_with(|c: char| c.is_ascii_digit()) {
            segments.push(Segment::number(current));
        } else {
            segments.push(Segment::Text(current.clone()));
        }
        current.clear();
    };

    for c in pre.chars() {
        if c.is_ascii_digit() {
            if current.starts_with(|c: char| c.is_ascii_alphabetic()) {
                flush(&mut current, &mut segments);
            }
            current.push(c);
        } else if c.is_ascii_alphabetic() {
            if current.starts_with(|c: char| c.is_ascii_digit()) {
                flush(&mut current, &mut segments);
            }
            current.push(c);
        } else {
            flush(&mut current, &mut segments);
        }
    }
    flush(&mut current, &mut segments);

    segments
}

impl Ord for RubyVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release_triple()
            .cmp(&other.release_triple())
            .then_with(|| match (&self.parts.pre, &other.parts.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(lhs), Some(rhs)) => compare_pre(lhs, rhs),
            })
    }
}

/// Segment-wise comparison of two pre-releases, shorter side padded with zeros
fn compare_pre(lhs: &str, rhs: &str) -> Ordering {
    let a = tokenize(lhs);
    let b = tokenize(rhs);

    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).cloned().unwrap_or_else(Segment::zero);
        let y = b.get(i).cloned().unwrap_or_else(Segment::zero);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            ordering => return ordering,
        }
    }

    // Pre-releases that only differ in punctuation still need a stable order
    lhs.cmp(rhs)
}

impl PartialOrd for RubyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RubyVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RubyVersion {}

impl FromStr for RubyVersion {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self> {
        RubyVersion::new(s)
    }
}

impl fmt::Display for RubyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> RubyVersion {
        RubyVersion::new(s).unwrap()
    }

    #[test]
    fn test_raw_version_is_verbatim() {
        assert_eq!(v("3.3.0.preview2").raw_version(), "3.3.0.preview2");
        assert_eq!(v("3.3.0-preview2").raw_version(), "3.3.0-preview2");
    }

    #[test]
    fn test_preview() {
        assert!(v("3.3.0-preview1").preview());
        assert!(v("3.1.0.rc1").preview());
        assert!(!v("3.1.2").preview());
    }

    #[test]
    fn test_download_url() {
        assert_eq!(
            v("3.0.2").download_url(),
            "https://ftp.ruby-lang.org/pub/ruby/3.0/ruby-3.0.2.tar.gz"
        );
        assert_eq!(
            v("2.5.7").download_url(),
            "https://ftp.ruby-lang.org/pub/ruby/2.5/ruby-2.5.7.tar.gz"
        );
        assert_eq!(
            v("3.3.0.preview2").download_url(),
            "https://ftp.ruby-lang.org/pub/ruby/3.3/ruby-3.3.0-preview2.tar.gz"
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(v("3.0.2").ruby_source_dir_name(), "ruby-3.0.2");
        assert_eq!(v("3.3.0.rc1").ruby_source_dir_name(), "ruby-3.3.0-rc1");
        assert_eq!(v("3.0.2").tar_file_name_output(), "ruby-3.0.2.tgz");
        assert_eq!(
            v("3.3.0-preview1").tar_file_name_output(),
            "ruby-3.3.0.preview1.tgz"
        );
        assert_eq!(v("3.3.0-preview1").major_minor_patch(), "3.3.0");
    }

    #[test]
    fn test_compare_against_thresholds() {
        assert!(v("3.3.0") >= RubyVersion::release(3, 2, 0));
        assert!(v("3.2.0") >= RubyVersion::release(3, 2, 0));
        assert!(v("3.1.0") < RubyVersion::release(3, 2, 0));
    }

    #[test]
    fn test_prerelease_sorts_before_release() {
        assert!(v("3.3.0-preview2") < v("3.3.0"));
        assert!(v("3.3.0.rc1") < v("3.3.0"));
        assert!(v("3.3.0-preview2") > v("3.2.9"));
    }

    #[test]
    fn test_digit_led_prerelease_sorts_before_release() {
        for pre in ["3.3.0.1", "3.3.0-1rc", "3.3.0.0", "3.3.0-99"] {
            assert!(v(pre).preview());
            assert!(v(pre) < v("3.3.0"), "{} should sort before 3.3.0", pre);
            assert!(v(pre) > v("3.2.9"));
        }
    }

    #[test]
    fn test_prerelease_ordering() {
        assert!(v("3.3.0-preview1") < v("3.3.0-preview2"));
        assert!(v("3.3.0-preview2") < v("3.3.0-preview10"));
        assert!(v("3.3.0-preview3") < v("3.3.0-rc1"));
    }

    #[test]
    fn test_numeric_segments_compare_numerically() {
        assert!(v("3.10.0") > v("3.9.0"));
        assert!(v("2.7.10") > v("2.7.9"));
    }

    #[test]
    fn test_equality_across_separators() {
        assert_eq!(v("3.3.0-preview2"), v("3.3.0.preview2"));
        assert_eq!(
            v("3.3.0-preview2").cmp(&v("3.3.0.preview2")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("preview2"),
            vec![
                Segment::Text("preview".to_string()),
                Segment::Number("2".to_string())
            ]
        );
        assert_eq!(
            tokenize("rc.01"),
            vec![
                Segment::Text("rc".to_string()),
                Segment::Number("1".to_string())
            ]
        );
    }
}
