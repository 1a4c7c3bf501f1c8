//! Main build workflow orchestration logic
//!
//! Separates the build from CLI argument parsing: `main.rs` resolves inputs,
//! this module turns them into an artifact. Every step writes its progress to
//! a caller-provided sink so the workflow can run against a buffer in tests.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::binstub;
use crate::build_plan::{BuildPlan, Jobs, StageKind};
use crate::check::{self, CheckReport};
use crate::config::InventoryConfig;
use crate::domain::{Architecture, RubyVersion, Stack};
use crate::error::{BuilderError, Result};
use crate::fetch;
use crate::guard::VersionGuard;
use crate::inventory::{self, InventoryTarget};
use crate::layout::ArtifactLayout;
use crate::runner;
use crate::shutdown;
use crate::ui;

/// Everything a single build needs to know
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub version: RubyVersion,
    pub stack: Stack,
    pub architecture: Architecture,
    pub jobs: Jobs,

    /// Parent of the temporary source and prefix directories
    pub workspace_dir: PathBuf,

    /// Root of the stack/architecture artifact tree
    pub output_dir: PathBuf,

    /// Shared across runs; source tarballs found here are reused
    pub cache_dir: PathBuf,
}

/// What a dry run reports
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBuild {
    pub plan: BuildPlan,
    pub download_url: String,
    pub artifact: PathBuf,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The archive that was written
    pub artifact: PathBuf,
    pub version: RubyVersion,
    pub stack: Stack,
    pub architecture: Architecture,

    /// Binstubs whose shebang was rewritten, relative to the prefix
    pub binstubs: Vec<PathBuf>,

    /// Hex sha256 of the archive
    pub sha256: String,

    /// Copy of the archive named after its checksum, the one the inventory lists
    pub sha_artifact: PathBuf,
    pub inventory: PathBuf,
}

/// Runs builds with a given layout table, guard rules and inventory settings
#[derive(Debug, Clone, Default)]
pub struct Builder {
    layout: ArtifactLayout,
    guard: VersionGuard,
    inventory: InventoryConfig,
}

impl Builder {
    pub fn new(layout: ArtifactLayout, guard: VersionGuard) -> Self {
        Builder {
            layout,
            guard,
            inventory: InventoryConfig::default(),
        }
    }

    pub fn with_inventory(mut self, inventory: InventoryConfig) -> Self {
        self.inventory = inventory;
        self
    }

    /// Where `request` puts its archive
    pub fn artifact_path(&self, request: &BuildRequest) -> Result<PathBuf> {
        let output_dir = std::path::absolute(&request.output_dir)?;
        Ok(self
            .layout
            .directory(&request.stack, request.architecture, &output_dir)
            .join(request.version.tar_file_name_output()))
    }

    /// Validate the request and describe the build without touching the filesystem
    pub fn plan(&self, request: &BuildRequest) -> Result<PlannedBuild> {
        self.guard.check(&request.stack, &request.version)?;

        let prefix = std::path::absolute(&request.workspace_dir)?.join("<tmp>").join("prefix");
        let artifact = self.artifact_path(request)?;

        Ok(PlannedBuild {
            plan: BuildPlan::new(&prefix, &request.version, request.jobs),
            download_url: request.version.download_url(),
            artifact,
        })
    }

    /// Download, compile and package Ruby
    ///
    /// The temporary build directory is removed on every exit path, including
    /// a termination signal. A failed archive step leaves its partial `.tgz`
    /// behind. The finished archive is checksummed and recorded in the
    /// inventory.
    pub fn build<W: Write>(&self, request: &BuildRequest, io: &mut W) -> Result<BuildOutcome> {
        let BuildRequest {
            version,
            stack,
            architecture,
            jobs,
            workspace_dir,
            output_dir,
            cache_dir,
        } = request;

        tracing::info!(
            "building Ruby {} for {} on {}",
            version,
            stack,
            architecture
        );
        self.guard.check(stack, version)?;

        shutdown::check("download")?;
        let tar_file = fetch::download_to_cache(cache_dir, &version.download_url(), io)?;

        fs::create_dir_all(workspace_dir)?;
        let workspace_dir = std::path::absolute(workspace_dir)?;
        let tmp_dir = tempfile::Builder::new()
            .prefix("ruby-build-")
            .tempdir_in(&workspace_dir)?;
        tracing::debug!("build directory {}", tmp_dir.path().display());

        shutdown::check("extract")?;
        let source_dir = extract_source(&tar_file, tmp_dir.path(), version)?;

        let prefix = tmp_dir.path().join("prefix");
        let plan = BuildPlan::new(&prefix, version, *jobs);
        run_plan(&plan, &source_dir, io)?;

        let binstubs = binstub::fix_binstubs_in_dir(&prefix.join("bin"), io)?
            .into_iter()
            .filter_map(|path| path.strip_prefix(&prefix).ok().map(Path::to_path_buf))
            .collect();

        let artifact = self.layout.path(
            stack,
            *architecture,
            output_dir,
            &version.tar_file_name_output(),
        )?;
        shutdown::check("archive")?;
        writeln!(io, "Writing {}", artifact.display())?;
        archive::tar_dir(&prefix, &artifact)?;
        drop(tmp_dir);

        let output_dir = std::path::absolute(output_dir)?;
        let inventory_path = self.inventory.inventory_path(&output_dir);
        let recorded = inventory::record_artifact(
            &artifact,
            &InventoryTarget {
                version,
                stack,
                architecture: *architecture,
                output_root: &output_dir,
                base_url: &self.inventory.base_url,
                inventory_path: &inventory_path,
            },
            io,
        )?;

        Ok(BuildOutcome {
            artifact,
            version: version.clone(),
            stack: stack.clone(),
            architecture: *architecture,
            binstubs,
            sha256: recorded.sha256,
            sha_artifact: recorded.sha_artifact,
            inventory: inventory_path,
        })
    }

    /// Run the interpreter inside the archive `request` would produce
    pub fn check<W: Write>(&self, request: &BuildRequest, io: &mut W) -> Result<CheckReport> {
        let artifact = self.artifact_path(request)?;
        tracing::info!("checking {}", artifact.display());
        check::check_artifact(&artifact, io)
    }
}

/// Unpack the source tarball and return the directory `./configure` lives in
fn extract_source(tar_file: &Path, build_dir: &Path, version: &RubyVersion) -> Result<PathBuf> {
    let source_root = build_dir.join("source");
    archive::untar_to_dir(tar_file, &source_root)?;

    let source_dir = source_root.join(version.ruby_source_dir_name());
    if !source_dir.is_dir() {
        return Err(BuilderError::extract(
            tar_file,
            format!(
                "expected top level directory {}",
                version.ruby_source_dir_name()
            ),
        ));
    }
    Ok(source_dir)
}

fn run_plan<W: Write>(plan: &BuildPlan, source_dir: &Path, io: &mut W) -> Result<()> {
    for line in ui::format_configure_summary(plan) {
        writeln!(io, "{}", line)?;
    }

    for stage in plan.stages() {
        writeln!(io, "Running {}", stage.command)?;
        runner::stream_command(&stage.command, source_dir, io).map_err(|failure| {
            if shutdown::requested() {
                return BuilderError::Interrupted(stage.kind.name().to_string());
            }
            match stage.kind {
                StageKind::Configure => BuilderError::ConfigureFailed(failure),
                StageKind::Make => BuilderError::MakeFailed(failure),
                StageKind::Install => BuilderError::InstallFailed(failure),
            }
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(version: &str, stack: &str, root: &Path) -> BuildRequest {
        BuildRequest {
            version: RubyVersion::new(version).unwrap(),
            stack: Stack::new(stack).unwrap(),
            architecture: Architecture::Arm64,
            jobs: Jobs::new(2).unwrap(),
            workspace_dir: root.join("workspace"),
            output_dir: root.join("output"),
            cache_dir: root.join("cache"),
        }
    }

    #[test]
    fn test_plan_does_not_touch_filesystem() {
        let root = tempfile::tempdir().unwrap();
        let planned = Builder::default()
            .plan(&request("3.3.0-preview2", "heroku-24", root.path()))
            .unwrap();

        assert_eq!(
            planned.download_url,
            "https://ftp.ruby-lang.org/pub/ruby/3.3/ruby-3.3.0-preview2.tar.gz"
        );
        assert_eq!(
            planned.artifact,
            root.path().join("output/heroku-24/arm64/ruby-3.3.0.preview2.tgz")
        );
        assert!(planned.plan.command().contains("--enable-yjit"));
        assert!(!root.path().join("output").exists());
        assert!(!root.path().join("cache").exists());
    }

    #[test]
    fn test_plan_applies_guard() {
        let root = tempfile::tempdir().unwrap();
        let err = Builder::default()
            .plan(&request("3.0.0", "heroku-22", root.path()))
            .unwrap_err();
        assert!(matches!(err, BuilderError::IncompatibleStack { .. }));
    }

    #[test]
    fn test_build_rejects_before_any_io() {
        let root = tempfile::tempdir().unwrap();
        let mut io = Vec::new();
        let err = Builder::default()
            .build(&request("2.7.8", "heroku-22", root.path()), &mut io)
            .unwrap_err();

        assert!(matches!(err, BuilderError::IncompatibleStack { .. }));
        assert!(io.is_empty());
        assert!(!root.path().join("cache").exists());
        assert!(!root.path().join("workspace").exists());
    }
}
