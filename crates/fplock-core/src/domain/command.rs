//! Verifier command construction.
//!
//! The locker runs in one of two modes:
//!
//! - **Any enrolled user** – the verifier is run without arguments and
//!   `fprintd-verify` falls back to the calling user.
//! - **Specific user** – the user name is appended as the single argument,
//!   e.g. `fprintd-verify alice`.
//!
//! Both modes go through the same [`VerifierCommand`]; the mode is just the
//! [`VerifierTarget`] value threaded in from configuration.

use std::fmt;
use std::path::{Path, PathBuf};

/// Whose fingerprint the verifier should check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VerifierTarget {
    /// No explicit user; the verifier decides.
    #[default]
    AnyEnrolled,
    /// Verify against this user's enrolled prints.
    User(String),
}

impl VerifierTarget {
    /// Builds a target from an optional user name.  Blank names are ignored.
    pub fn from_user(user: Option<&str>) -> Self {
        match user.map(str::trim) {
            Some(name) if !name.is_empty() => VerifierTarget::User(name.to_string()),
            _ => VerifierTarget::AnyEnrolled,
        }
    }

    /// Resolves the session user from `USER`, falling back to `LOGNAME`.
    ///
    /// `lookup` abstracts the environment so callers and tests can supply
    /// their own source.  Returns `None` when neither variable is set.
    pub fn current_user<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        ["USER", "LOGNAME"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .map(|name| Self::from_user(Some(&name)))
            .find(|target| matches!(target, VerifierTarget::User(_)))
    }

    /// The targeted user name, if any.
    pub fn user(&self) -> Option<&str> {
        match self {
            VerifierTarget::AnyEnrolled => None,
            VerifierTarget::User(name) => Some(name),
        }
    }
}

/// A program plus its arguments, ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl VerifierCommand {
    /// Builds the command for `program` aimed at `target`.
    pub fn new(program: impl Into<PathBuf>, target: &VerifierTarget) -> Self {
        let args = target.user().map(|u| vec![u.to_string()]).unwrap_or_default();
        Self {
            program: program.into(),
            args,
        }
    }

    /// The executable path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The argument list (empty or a single user name).
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for VerifierCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_without_target_user_has_no_arguments() {
        let cmd = VerifierCommand::new("/usr/bin/fprintd-verify", &VerifierTarget::AnyEnrolled);
        assert!(cmd.args().is_empty());
        assert_eq!(cmd.to_string(), "/usr/bin/fprintd-verify");
    }

    #[test]
    fn test_command_with_target_user_appends_user_name() {
        let target = VerifierTarget::User("alice".to_string());
        let cmd = VerifierCommand::new("/usr/bin/fprintd-verify", &target);
        assert_eq!(cmd.args(), ["alice".to_string()]);
        assert_eq!(cmd.to_string(), "/usr/bin/fprintd-verify alice");
    }

    #[test]
    fn test_from_user_ignores_blank_names() {
        assert_eq!(VerifierTarget::from_user(Some("  ")), VerifierTarget::AnyEnrolled);
        assert_eq!(VerifierTarget::from_user(None), VerifierTarget::AnyEnrolled);
        assert_eq!(
            VerifierTarget::from_user(Some(" bob ")),
            VerifierTarget::User("bob".to_string())
        );
    }

    #[test]
    fn test_current_user_prefers_user_over_logname() {
        let lookup = |key: &str| match key {
            "USER" => Some("alice".to_string()),
            "LOGNAME" => Some("bob".to_string()),
            _ => None,
        };
        assert_eq!(
            VerifierTarget::current_user(lookup),
            Some(VerifierTarget::User("alice".to_string()))
        );
    }

    #[test]
    fn test_current_user_falls_back_to_logname() {
        let lookup = |key: &str| (key == "LOGNAME").then(|| "bob".to_string());
        assert_eq!(
            VerifierTarget::current_user(lookup),
            Some(VerifierTarget::User("bob".to_string()))
        );
    }

    #[test]
    fn test_current_user_is_none_when_environment_is_empty() {
        assert_eq!(VerifierTarget::current_user(|_| None), None);
    }
}
