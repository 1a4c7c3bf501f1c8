//! Where produced artifacts land on disk
//!
//! The output directory mirrors the object store layout the buildpack reads
//! from. Stacks that ship more than one CPU architecture get an extra
//! architecture segment; older single-architecture stacks must not have one
//! because buildpack clients build the URL with the same rule.

use crate::domain::{Architecture, Stack};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Stacks that are built for both `amd64` and `arm64`
pub const DEFAULT_ARCH_SEGMENTED_STACKS: &[&str] = &["heroku-24"];

/// How the directory for a stack is formed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRule {
    /// `<output_root>/<stack>/`
    Stack,
    /// `<output_root>/<stack>/<architecture>/`
    StackArchitecture,
}

/// Stack to directory rule table with a `DirectoryRule::Stack` default
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactLayout {
    rules: Vec<(String, DirectoryRule)>,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        ArtifactLayout::with_arch_segmented_stacks(DEFAULT_ARCH_SEGMENTED_STACKS.iter().copied())
    }
}

impl ArtifactLayout {
    pub fn with_arch_segmented_stacks<I, S>(stacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArtifactLayout {
            rules: stacks
                .into_iter()
                .map(|stack| (stack.into(), DirectoryRule::StackArchitecture))
                .collect(),
        }
    }

    pub fn rule_for(&self, stack: &Stack) -> DirectoryRule {
        self.rules
            .iter()
            .find(|(name, _)| name == stack.name())
            .map(|(_, rule)| *rule)
            .unwrap_or(DirectoryRule::Stack)
    }

    /// Directory for the stack, without touching the filesystem
    pub fn directory(&self, stack: &Stack, architecture: Architecture, output_root: &Path) -> PathBuf {
        let stack_dir = output_root.join(stack.name());
        match self.rule_for(stack) {
            DirectoryRule::Stack => stack_dir,
            DirectoryRule::StackArchitecture => stack_dir.join(architecture.as_str()),
        }
    }

    /// Absolute artifact path; its parent directory exists once this returns
    pub fn path(
        &self,
        stack: &Stack,
        architecture: Architecture,
        output_root: &Path,
        tar_file_name: &str,
    ) -> Result<PathBuf> {
        let output_root = std::path::absolute(output_root)?;
        let directory = self.directory(stack, architecture, &output_root);
        fs::create_dir_all(&directory)?;
        tracing::debug!("artifact directory {}", directory.display());

        Ok(directory.join(tar_file_name))
    }
}
