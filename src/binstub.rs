//! Portable shebangs for installed executables
//!
//! `make install` writes the absolute path of the build prefix into the
//! shebang of every script in `bin/`. That prefix is a temporary directory
//! that will not exist on the machine the artifact is unpacked on, so ruby
//! shebangs are rewritten to `#!/usr/bin/env ruby`.

use crate::error::Result;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PORTABLE_SHEBANG: &str = "#!/usr/bin/env ruby";

const RUBY_SHEBANG_PATTERN: &str = r"^#!.*/ruby";

/// Return the rewritten contents if the first line is a ruby shebang
///
/// The first line must be valid UTF-8. Only the shebang text is replaced; its
/// line terminator (`\n` or `\r\n`) and the rest of the file are kept byte for byte.
pub fn rewrite_shebang(contents: &[u8]) -> Option<Vec<u8>> {
    let mut line_end = contents
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(contents.len());
    if line_end > 0 && contents[line_end - 1] == b'\r' {
        line_end -= 1;
    }
    let first_line = std::str::from_utf8(&contents[..line_end]).ok()?;

    let re = Regex::new(RUBY_SHEBANG_PATTERN).ok()?;
    if !re.is_match(first_line) {
        return None;
    }

    let mut rewritten = Vec::with_capacity(contents.len());
    rewritten.extend_from_slice(PORTABLE_SHEBANG.as_bytes());
    rewritten.extend_from_slice(&contents[line_end..]);
    Some(rewritten)
}

/// Rewrite every regular file directly under `dir`, reporting each one to `log`
///
/// Returns the files that were changed.
pub fn fix_binstubs_in_dir<W: Write>(dir: &Path, log: &mut W) -> Result<Vec<PathBuf>> {
    let mut updated = Vec::new();
    if !dir.is_dir() {
        writeln!(log, "No binstubs to update in {}", dir.display())?;
        return Ok(updated);
    }

    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        let metadata = fs::symlink_metadata(&path)?;
        if !metadata.is_file() {
            continue;
        }

        let contents = fs::read(&path)?;
        if let Some(rewritten) = rewrite_shebang(&contents) {
            writeln!(log, "Updating binstub for {}", path.display())?;
            // Overwriting in place keeps the executable bit
            fs::write(&path, rewritten)?;
            updated.push(path);
        }
    }

    Ok(updated)
}
