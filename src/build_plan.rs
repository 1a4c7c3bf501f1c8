//! The configure / make / make install commands that compile Ruby
//!
//! Flag order is fixed so that two builds of the same version produce the
//! same command line.

use crate::domain::RubyVersion;
use crate::error::{BuilderError, Result};
use std::fmt;
use std::num::NonZeroU32;
use std::path::Path;
use std::process::Command;

/// Environment prefix for `./configure`, keeps debug symbols in the build
pub const CONFIGURE_ENV: &str = "debugflags=\"-g\"";

/// Parallelism passed to `make -j`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jobs(NonZeroU32);

impl Jobs {
    pub fn new(jobs: u32) -> Result<Self> {
        NonZeroU32::new(jobs)
            .map(Jobs)
            .ok_or_else(|| BuilderError::InvalidJobs(jobs.to_string()))
    }

    /// Parse a `JOBS` value; anything but a positive integer is rejected
    pub fn parse(value: &str) -> Result<Self> {
        value
            .trim()
            .parse::<NonZeroU32>()
            .map(Jobs)
            .map_err(|_| BuilderError::InvalidJobs(value.to_string()))
    }

    /// Number of processors reported by `nproc`, or by the OS when `nproc` is unavailable
    pub fn detect() -> Self {
        let probed = Command::new("nproc")
            .output()
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| Jobs::parse(&String::from_utf8_lossy(&output.stdout)).ok());

        match probed {
            Some(jobs) => jobs,
            None => {
                tracing::debug!("nproc unavailable, asking the OS for the CPU count");
                let cpus = u32::try_from(num_cpus::get()).unwrap_or(1);
                Jobs(NonZeroU32::new(cpus).unwrap_or(NonZeroU32::MIN))
            }
        }
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Jobs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Configure,
    Make,
    Install,
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Configure => "configure",
            StageKind::Make => "make",
            StageKind::Install => "make install",
        }
    }
}

/// One shell command of the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub kind: StageKind,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    configure_flags: Vec<String>,
    stages: Vec<Stage>,
}

impl BuildPlan {
    pub fn new(prefix: &Path, ruby_version: &RubyVersion, jobs: Jobs) -> Self {
        let configure_flags = configure_flags(prefix, ruby_version);
        let stages = vec![
            Stage {
                kind: StageKind::Configure,
                command: format!("{} ./configure {}", CONFIGURE_ENV, configure_flags.join(" ")),
            },
            Stage {
                kind: StageKind::Make,
                command: format!("make -j{}", jobs),
            },
            Stage {
                kind: StageKind::Install,
                command: "make install".to_string(),
            },
        ];

        BuildPlan {
            configure_flags,
            stages,
        }
    }

    pub fn configure_flags(&self) -> &[String] {
        &self.configure_flags
    }

    /// Stages in execution order: configure, make, install
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The whole plan as a single `&&`-joined shell command
    pub fn command(&self) -> String {
        self.stages
            .iter()
            .map(|stage| stage.command.as_str())
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

fn configure_flags(prefix: &Path, ruby_version: &RubyVersion) -> Vec<String> {
    let mut flags = vec![
        "--disable-install-doc".to_string(),
        format!("--prefix {}", prefix.display()),
        "--enable-load-relative".to_string(),
        "--enable-shared".to_string(),
    ];

    if *ruby_version >= RubyVersion::release(3, 2, 0) {
        flags.push("--enable-yjit".to_string());
    }

    flags
}

/// Shorthand for `BuildPlan::new(..).command()`
pub fn command(prefix: &Path, ruby_version: &RubyVersion, jobs: Jobs) -> String {
    BuildPlan::new(prefix, ruby_version, jobs).command()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(version: &str) -> BuildPlan {
        BuildPlan::new(
            Path::new("/tmp/prefix"),
            &RubyVersion::new(version).unwrap(),
            Jobs::new(4).unwrap(),
        )
    }

    #[test]
    fn test_flags_order() {
        assert_eq!(
            plan("3.1.2").configure_flags(),
            &[
                "--disable-install-doc",
                "--prefix /tmp/prefix",
                "--enable-load-relative",
                "--enable-shared",
            ]
        );
    }

    #[test]
    fn test_yjit_threshold() {
        assert!(!plan("3.1.4").command().contains("--enable-yjit"));
        assert!(!plan("3.2.0-preview3").command().contains("--enable-yjit"));
        assert!(plan("3.2.0").command().contains("--enable-yjit"));
        assert!(plan("3.3.0-preview2").command().contains("--enable-yjit"));
        assert_eq!(
            plan("3.3.0").configure_flags().last().map(String::as_str),
            Some("--enable-yjit")
        );
    }

    #[test]
    fn test_stages_order() {
        let kinds: Vec<StageKind> = plan("3.3.0").stages().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![StageKind::Configure, StageKind::Make, StageKind::Install]
        );
    }

    #[test]
    fn test_jobs_parse() {
        assert_eq!(Jobs::parse("16").unwrap().get(), 16);
        assert_eq!(Jobs::parse(" 8\n").unwrap().get(), 8);
        assert!(matches!(Jobs::parse("0"), Err(BuilderError::InvalidJobs(_))));
        assert!(matches!(Jobs::parse("four"), Err(BuilderError::InvalidJobs(_))));
        assert!(matches!(Jobs::parse("-2"), Err(BuilderError::InvalidJobs(_))));
    }

    #[test]
    fn test_jobs_detect_is_positive() {
        assert!(Jobs::detect().get() >= 1);
    }
}
