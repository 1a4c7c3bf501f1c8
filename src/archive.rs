//! Gzipped tar handling
//!
//! Upstream source tarballs wrap everything in one directory
//! (`ruby-3.1.2/configure`, `ruby-3.1.2/array.c`, ...), so extraction keeps
//! paths as they are and the caller steps into that directory.
//!
//! Produced artifacts are the opposite: the buildpack unpacks them straight
//! onto its ruby path, so the archive's top level is the install prefix's
//! contents (`bin/`, `lib/`, `include/`, `share/`) with no wrapping directory.

use crate::error::{BuilderError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::path::Path;

/// Unpack `tar_file` into `dest_directory`, creating the directory if needed
pub fn untar_to_dir(tar_file: &Path, dest_directory: &Path) -> Result<()> {
    fs::create_dir_all(dest_directory).map_err(|e| BuilderError::extract(tar_file, e))?;

    let file = fs::File::open(tar_file).map_err(|e| BuilderError::extract(tar_file, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.set_preserve_mtime(true);
    archive
        .unpack(dest_directory)
        .map_err(|e| BuilderError::extract(tar_file, e))?;

    tracing::debug!(
        "extracted {} into {}",
        tar_file.display(),
        dest_directory.display()
    );
    Ok(())
}

/// Pack the contents of `dir_to_tar` into `destination_file`
///
/// Symlinks are stored as links; following them would duplicate files inside the prefix.
pub fn tar_dir(dir_to_tar: &Path, destination_file: &Path) -> Result<()> {
    let file =
        fs::File::create(destination_file).map_err(|e| BuilderError::archive(destination_file, e))?;
    let encoder = GzEncoder::new(file, Compression::best());

    let mut tar = tar::Builder::new(encoder);
    tar.follow_symlinks(false);
    tar.append_dir_all("", dir_to_tar)
        .map_err(|e| BuilderError::archive(destination_file, e))?;

    tar.into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| BuilderError::archive(destination_file, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filenames_in_path(path: &Path) -> Vec<String> {
        let mut filenames = fs::read_dir(path)
            .unwrap()
            .filter_map(|entry| {
                entry
                    .ok()
                    .and_then(|e| e.file_name().to_str().map(String::from))
            })
            .collect::<Vec<String>>();

        filenames.sort();
        filenames
    }

    #[test]
    fn test_tar_dir_has_no_wrapping_directory() {
        let prefix = tempfile::tempdir().unwrap();
        fs::create_dir_all(prefix.path().join("bin")).unwrap();
        fs::create_dir_all(prefix.path().join("lib")).unwrap();
        fs::write(prefix.path().join("bin/gem"), "#!/usr/bin/env ruby\n").unwrap();

        let out = tempfile::tempdir().unwrap();
        let tgz = out.path().join("ruby-3.1.2.tgz");
        tar_dir(prefix.path(), &tgz).unwrap();

        let unpacked = tempfile::tempdir().unwrap();
        untar_to_dir(&tgz, unpacked.path()).unwrap();

        assert_eq!(filenames_in_path(unpacked.path()), vec!["bin", "lib"]);
        assert_eq!(
            fs::read_to_string(unpacked.path().join("bin/gem")).unwrap(),
            "#!/usr/bin/env ruby\n"
        );
    }

    #[test]
    fn test_untar_keeps_source_directory() {
        let source = tempfile::tempdir().unwrap();
        let ruby_dir = source.path().join("ruby-3.3.1");
        fs::create_dir_all(&ruby_dir).unwrap();
        fs::write(ruby_dir.join("array.c"), "").unwrap();

        let out = tempfile::tempdir().unwrap();
        let tgz = out.path().join("ruby-3.3.1.tar.gz");
        tar_dir(source.path(), &tgz).unwrap();

        let dest = tempfile::tempdir().unwrap();
        let target = dest.path().join("source");
        untar_to_dir(&tgz, &target).unwrap();

        assert_eq!(filenames_in_path(&target), vec!["ruby-3.3.1"]);
        assert_eq!(filenames_in_path(&target.join("ruby-3.3.1")), vec!["array.c"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_kept_as_links() {
        let prefix = tempfile::tempdir().unwrap();
        fs::create_dir_all(prefix.path().join("lib")).unwrap();
        fs::write(prefix.path().join("lib/libruby.so.3.3.0"), "elf").unwrap();
        std::os::unix::fs::symlink("libruby.so.3.3.0", prefix.path().join("lib/libruby.so")).unwrap();

        let out = tempfile::tempdir().unwrap();
        let tgz = out.path().join("ruby.tgz");
        tar_dir(prefix.path(), &tgz).unwrap();

        let unpacked = tempfile::tempdir().unwrap();
        untar_to_dir(&tgz, unpacked.path()).unwrap();

        let link = unpacked.path().join("lib/libruby.so");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    #[test]
    fn test_untar_missing_file() {
        let dest = tempfile::tempdir().unwrap();
        let err = untar_to_dir(Path::new("/nonexistent/ruby.tgz"), dest.path()).unwrap_err();
        assert!(matches!(err, BuilderError::ExtractFailed { .. }));
    }

    #[test]
    fn test_untar_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.tar.gz");
        fs::write(&bogus, "not a tarball").unwrap();

        let err = untar_to_dir(&bogus, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, BuilderError::ExtractFailed { .. }));
    }
}
