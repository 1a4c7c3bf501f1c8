//! Known-bad stack and version combinations, rejected before any work starts

use crate::domain::{RubyVersion, Stack};
use crate::error::{BuilderError, Result};

/// One incompatibility: both predicates matching means the build is refused
#[derive(Clone, Copy)]
pub struct GuardRule {
    pub stack: fn(&Stack) -> bool,
    pub version: fn(&RubyVersion) -> bool,
    pub message: &'static str,
}

impl std::fmt::Debug for GuardRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardRule")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

fn is_heroku_22(stack: &Stack) -> bool {
    stack.name() == "heroku-22"
}

fn at_most_3_0(version: &RubyVersion) -> bool {
    *version <= RubyVersion::release(3, 0, 0)
}

// https://bugs.ruby-lang.org/issues/18658
const HEROKU_22_OPENSSL_3: GuardRule = GuardRule {
    stack: is_heroku_22,
    version: at_most_3_0,
    message: "Ruby 3.0 and older do not build against OpenSSL 3",
};

#[derive(Debug, Clone)]
pub struct VersionGuard {
    rules: Vec<GuardRule>,
}

impl Default for VersionGuard {
    fn default() -> Self {
        VersionGuard {
            rules: vec![HEROKU_22_OPENSSL_3],
        }
    }
}

impl VersionGuard {
    /// A guard that accepts everything
    pub fn empty() -> Self {
        VersionGuard { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: GuardRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn check(&self, stack: &Stack, version: &RubyVersion) -> Result<()> {
        match self
            .rules
            .iter()
            .find(|rule| (rule.stack)(stack) && (rule.version)(version))
        {
            Some(rule) => Err(BuilderError::IncompatibleStack {
                stack: stack.to_string(),
                version: version.raw_version().to_string(),
                reason: rule.message.to_string(),
            }),
            None => Ok(()),
        }
    }
}
