//! Password references.
//!
//! The admin password in `config.toml` may name where the secret lives
//! instead of holding it:
//!
//! - `pass::bmlt/jdoe` reads the first line of `pass show bmlt/jdoe`
//! - `env::BMLT_PW` reads `$BMLT_PW`
//!
//! Any other value is the password itself.

use std::process::Command;

/// Where a configured secret comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    Pass(&'a str),
    Env(&'a str),
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(entry) = value.strip_prefix("pass::") {
            Self::Pass(entry)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }
}

/// Resolves a configured value to the secret it refers to.
pub fn resolve(value: &str) -> Result<String, String> {
    match SecretRef::parse(value) {
        SecretRef::Pass(entry) => from_pass(entry),
        SecretRef::Env(var) => {
            std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
        }
        SecretRef::Plain(plain) => Ok(plain.to_string()),
    }
}

fn from_pass(entry: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", entry])
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", entry, e))?;
    if !output.status.success() {
        return Err(format!(
            "`pass show {}` exited with {}: {}",
            entry,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` printed nothing", entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixes() {
        assert_eq!(SecretRef::parse("pass::bmlt/jdoe"), SecretRef::Pass("bmlt/jdoe"));
        assert_eq!(SecretRef::parse("env::PW"), SecretRef::Env("PW"));
        assert_eq!(SecretRef::parse("hunter2"), SecretRef::Plain("hunter2"));
        assert_eq!(SecretRef::parse(""), SecretRef::Plain(""));
    }

    #[test]
    fn env_reference_resolves() {
        unsafe {
            std::env::set_var("_BMLT_TEST_ADMIN_PW", "s3cret");
        }
        assert_eq!(resolve("env::_BMLT_TEST_ADMIN_PW").unwrap(), "s3cret");
        unsafe {
            std::env::remove_var("_BMLT_TEST_ADMIN_PW");
        }
        let err = resolve("env::_BMLT_TEST_UNSET_VAR_98765").unwrap_err();
        assert!(err.contains("not set"));
    }

    #[test]
    fn missing_pass_entry_errors() {
        assert!(resolve("pass::bmlt/entry/that/does/not/exist/98765").is_err());
    }
}
