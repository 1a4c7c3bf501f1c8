//! Local manifest of produced artifacts
//!
//! Every build records its artifact in a TOML inventory next to the output
//! tree. The artifact is also copied to a name carrying the first seven hex
//! digits of its sha256 (`ruby-3.1.2-abcdef1.tgz`), and that immutable name is
//! what the inventory points at.
//!
//! ```toml
//! [[artifacts]]
//! version = "3.1.2"
//! os = "linux"
//! arch = "amd64"
//! url = "https://heroku-buildpack-ruby.s3.us-east-1.amazonaws.com/heroku-24/amd64/ruby-3.1.2-abcdef1.tgz"
//! checksum = "sha256:abcdef1..."
//!
//! [artifacts.metadata]
//! stack = "heroku-24"
//! timestamp = "2024-07-24T16:17:35.341413Z"
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{Architecture, RubyVersion, Stack};
use crate::error::{BuilderError, Result};

pub const INVENTORY_FILE_NAME: &str = "ruby_inventory.toml";

/// Where published artifacts are served from; the inventory URL is this plus the path under the output root
pub const DEFAULT_BASE_URL: &str = "https://heroku-buildpack-ruby.s3.us-east-1.amazonaws.com";

const ARTIFACT_EXTENSION: &str = ".tgz";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub artifacts: Vec<InventoryArtifact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryArtifact {
    /// Bundler form of the version
    pub version: String,
    pub os: String,
    pub arch: String,
    pub url: String,

    /// `sha256:<hex>`
    pub checksum: String,
    pub metadata: ArtifactMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub stack: String,
    pub timestamp: DateTime<Utc>,
}

impl InventoryArtifact {
    /// Same version, platform and stack; a newer build replaces the older entry
    fn same_slot(&self, other: &InventoryArtifact) -> bool {
        self.version == other.version
            && self.os == other.os
            && self.arch == other.arch
            && self.metadata.stack == other.metadata.stack
    }
}

impl Inventory {
    /// Read the inventory at `path`; a missing or blank file is an empty inventory
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Inventory::default());
        }
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Inventory::default());
        }
        toml::from_str(&contents).map_err(|e| BuilderError::inventory(path, e))
    }

    /// Add `artifact`, replacing any entry for the same version, platform and stack
    ///
    /// Fails if another entry already claims the same URL with a different checksum.
    pub fn record(&mut self, artifact: InventoryArtifact) -> Result<()> {
        if let Some(prior) = self
            .artifacts
            .iter()
            .find(|prior| prior.url == artifact.url && prior.checksum != artifact.checksum)
        {
            return Err(BuilderError::InventoryConflict {
                url: artifact.url.clone(),
                existing: prior.checksum.clone(),
                checksum: artifact.checksum.clone(),
            });
        }

        self.artifacts.retain(|prior| !prior.same_slot(&artifact));
        self.artifacts.push(artifact);
        Ok(())
    }

    /// Write through a sibling temp file and rename, so readers never see a partial inventory
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string(self).map_err(|e| BuilderError::inventory(path, e))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(path).map_err(|e| BuilderError::Io(e.error))?;
        Ok(())
    }
}

/// Hex sha256 of the file at `path`
pub fn sha256_from_path(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// `dir/ruby-3.1.2.tgz` becomes `dir/ruby-3.1.2-<sha7>.tgz`
pub fn sha_copy_path(artifact: &Path, sha256: &str) -> Result<PathBuf> {
    let file_name = artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| BuilderError::archive(artifact, "artifact path has no file name"))?;
    let stem = file_name.strip_suffix(ARTIFACT_EXTENSION).ok_or_else(|| {
        BuilderError::archive(
            artifact,
            format!("file name does not end with {}", ARTIFACT_EXTENSION),
        )
    })?;

    let sha_seven: String = sha256.chars().take(7).collect();
    Ok(artifact.with_file_name(format!("{}-{}{}", stem, sha_seven, ARTIFACT_EXTENSION)))
}

/// Public URL of `path`, which must live under `output_root`
pub fn artifact_url(base_url: &str, output_root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(output_root).map_err(|_| {
        BuilderError::archive(
            path,
            format!("not inside output directory {}", output_root.display()),
        )
    })?;
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    Ok(format!("{}/{}", base_url.trim_end_matches('/'), relative))
}

/// Where [`Inventory`] entries for an artifact come from
#[derive(Debug, Clone)]
pub struct InventoryTarget<'a> {
    pub version: &'a RubyVersion,
    pub stack: &'a Stack,
    pub architecture: Architecture,
    pub output_root: &'a Path,
    pub base_url: &'a str,
    pub inventory_path: &'a Path,
}

/// What [`record_artifact`] produced
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedArtifact {
    pub sha256: String,
    pub sha_artifact: PathBuf,
    pub entry: InventoryArtifact,
}

/// Checksum `artifact`, write its sha-named copy and record it in the inventory
///
/// The sha-named copy is removed again if the inventory refuses the entry.
pub fn record_artifact<W: Write>(
    artifact: &Path,
    target: &InventoryTarget<'_>,
    io: &mut W,
) -> Result<RecordedArtifact> {
    let output_root = std::path::absolute(target.output_root)?;
    let artifact = std::path::absolute(artifact)?;
    let sha256 = sha256_from_path(&artifact)?;
    let sha_artifact = sha_copy_path(&artifact, &sha256)?;

    let entry = InventoryArtifact {
        version: target.version.parts().bundler_format(),
        os: "linux".to_string(),
        arch: target.architecture.as_str().to_string(),
        url: artifact_url(target.base_url, &output_root, &sha_artifact)?,
        checksum: format!("sha256:{}", sha256),
        metadata: ArtifactMetadata {
            stack: target.stack.name().to_string(),
            timestamp: Utc::now(),
        },
    };

    writeln!(io, "Copying SHA tgz {}", sha_artifact.display())?;
    fs::copy(&artifact, &sha_artifact)?;

    writeln!(io, "Updating manifest {}", target.inventory_path.display())?;
    let updated = Inventory::load(target.inventory_path).and_then(|mut inventory| {
        inventory.record(entry.clone())?;
        inventory.save(target.inventory_path)
    });
    if let Err(e) = updated {
        let _ = fs::remove_file(&sha_artifact);
        return Err(e);
    }

    tracing::info!("recorded {} as {}", artifact.display(), entry.url);
    Ok(RecordedArtifact {
        sha256,
        sha_artifact,
        entry,
    })
}
