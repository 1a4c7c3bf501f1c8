//! Smoke test for a produced artifact
//!
//! Unpacks the tarball into a scratch directory and asks the interpreter inside
//! for its own version and the bundled rubygems version.

use std::io::Write;
use std::path::Path;

use crate::archive;
use crate::domain::{Architecture, RubyVersion, Stack};
use crate::error::{BuilderError, Result};
use crate::runner;

const RUBYGEMS_VERSION_COMMAND: &str = "./bin/ruby ./bin/gem -v";
const RUBY_VERSION_COMMAND: &str = "./bin/ruby -v";

/// What the unpacked interpreter reported about itself
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub ruby_version: String,
    pub rubygems_version: String,
}

impl CheckReport {
    /// Markdown block suitable for a release note or CI summary
    pub fn summary(&self, version: &RubyVersion, stack: &Stack, architecture: Architecture) -> String {
        format!(
            "## Ruby {} linux/{} for {}\n\n- Rubygems version: {}\n- Ruby version: {}\n",
            version, architecture, stack, self.rubygems_version, self.ruby_version
        )
    }
}

/// Unpack `artifact` and run its `ruby -v` and `gem -v`
///
/// Command output goes to `io` as it runs. Either command failing is a
/// [`BuilderError::CheckFailed`].
pub fn check_artifact<W: Write>(artifact: &Path, io: &mut W) -> Result<CheckReport> {
    if !artifact.is_file() {
        return Err(BuilderError::extract(artifact, "artifact not found"));
    }

    let unpacked = tempfile::Builder::new().prefix("ruby-check-").tempdir()?;
    writeln!(io, "Unpacking {}", artifact.display())?;
    archive::untar_to_dir(artifact, unpacked.path())?;

    let rubygems_version = capture(RUBYGEMS_VERSION_COMMAND, unpacked.path(), io)?;
    let ruby_version = capture(RUBY_VERSION_COMMAND, unpacked.path(), io)?;

    Ok(CheckReport {
        ruby_version,
        rubygems_version,
    })
}

/// Last non-empty line the command printed
fn capture<W: Write>(command: &str, cwd: &Path, io: &mut W) -> Result<String> {
    writeln!(io, "Running {}", command)?;
    let mut output = Vec::new();
    runner::stream_command(command, cwd, &mut output).map_err(BuilderError::CheckFailed)?;
    io.write_all(&output)?;

    let output = String::from_utf8_lossy(&output);
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or_default()
        .to_string())
}
