//! Domain logic - pure version and platform rules independent of any I/O

pub mod platform;
pub mod ruby_version;
pub mod version_parts;

pub use platform::{Architecture, Stack};
pub use ruby_version::RubyVersion;
pub use version_parts::{Separator, VersionParts};
