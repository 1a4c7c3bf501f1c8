use crate::error::{BuilderError, Result};
use std::fmt;
use std::process::Command;
use std::str::FromStr;

/// Named base OS image the interpreter is compiled on, e.g. `heroku-24`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stack(String);

impl Stack {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BuilderError::config("stack name must not be empty"));
        }
        Ok(Stack(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl FromStr for Stack {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self> {
        Stack::new(s)
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CPU architecture an artifact is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    Amd64,
    Arm64,
}

impl Architecture {
    /// Map the output of `arch` to an architecture
    ///
    /// `x86_64` is `amd64` and `aarch64` is `arm64`; anything else is rejected.
    pub fn from_probe_output(output: &str) -> Result<Self> {
        match output.trim() {
            "x86_64" => Ok(Architecture::Amd64),
            "aarch64" => Ok(Architecture::Arm64),
            _ => Err(BuilderError::UnknownArchitecture(output.to_string())),
        }
    }

    /// Probe the host by running `arch`
    pub fn detect() -> Result<Self> {
        let output = Command::new("arch")
            .output()
            .map_err(|e| BuilderError::ArchProbeFailed(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuilderError::ArchProbeFailed(format!(
                "{}{}",
                stdout, stderr
            )));
        }

        Architecture::from_probe_output(&stdout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl FromStr for Architecture {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "amd64" => Ok(Architecture::Amd64),
            "arm64" => Ok(Architecture::Arm64),
            other => Architecture::from_probe_output(other),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
