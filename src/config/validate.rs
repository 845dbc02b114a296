//! Document validation.
//!
//! Each check looks at one concern and returns the first [`FieldError`] it
//! finds. [`Validator::validate`] runs them in a fixed order and stops at the
//! first failure.

use std::env;
use std::path::{Path, PathBuf};

use super::alias::validate_alias;
use super::document::{Document, Provider, CONFIRM_POLICIES};
use super::error::FieldError;
use crate::fs::FileSystem;

type Check = fn(&Validator<'_>, &Document) -> Result<(), FieldError>;

const CHECKS: &[Check] = &[
    check_branch,
    check_editor,
    check_confirm_policy,
    check_providers,
    check_aliases,
];

const GITHUB_TOKEN_PREFIXES: &[&str] = &["ghp_", "gho_", "ghu_", "ghs_", "ghr_", "github_pat_"];
const GITHUB_TOKEN_MIN_LEN: usize = 40;
const GITLAB_TOKEN_PREFIX: &str = "glpat-";
const GITLAB_TOKEN_MIN_LEN: usize = 26;

/// Directories searched for executables, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories from the `PATH` environment variable.
    pub fn from_env() -> Self {
        let dirs = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find `program` as an executable file. Names containing a path
    /// separator are checked as given rather than searched.
    pub fn resolve(&self, fs: &dyn FileSystem, program: &str) -> Option<PathBuf> {
        let is_executable =
            |path: &Path| fs.stat(path).map(|info| info.is_executable()).unwrap_or(false);

        if program.contains('/') || program.contains(std::path::MAIN_SEPARATOR) {
            let path = PathBuf::from(program);
            return is_executable(&path).then_some(path);
        }

        self.dirs
            .iter()
            .flat_map(|dir| executable_names(program).map(move |name| dir.join(name)))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(windows)]
fn executable_names(program: &str) -> impl Iterator<Item = String> + '_ {
    ["", ".exe", ".cmd", ".bat"]
        .into_iter()
        .map(move |ext| format!("{program}{ext}"))
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(program.to_string())
}

/// Runs every document check against a filesystem and search path.
pub struct Validator<'a> {
    fs: &'a dyn FileSystem,
    search_path: &'a SearchPath,
}

impl<'a> Validator<'a> {
    pub fn new(fs: &'a dyn FileSystem, search_path: &'a SearchPath) -> Self {
        Self { fs, search_path }
    }

    /// Return the first failing check, if any.
    pub fn validate(&self, document: &Document) -> Result<(), FieldError> {
        CHECKS.iter().try_for_each(|check| check(self, document))
    }
}

fn has_whitespace(s: &str) -> bool {
    s.chars().any(char::is_whitespace)
}

fn check_branch(_: &Validator<'_>, document: &Document) -> Result<(), FieldError> {
    let branch = &document.default.branch;
    if branch.is_empty() {
        return Err(FieldError::new("default.branch", branch, "branch name must not be empty"));
    }
    if has_whitespace(branch) {
        return Err(FieldError::new(
            "default.branch",
            branch,
            "branch name must not contain whitespace",
        ));
    }
    Ok(())
}

fn check_editor(validator: &Validator<'_>, document: &Document) -> Result<(), FieldError> {
    let editor = &document.default.editor;
    // `code --wait` resolves `code`.
    let Some(program) = editor.split_whitespace().next() else {
        return Err(FieldError::new("default.editor", editor, "editor must not be empty"));
    };
    if validator.search_path.resolve(validator.fs, program).is_none() {
        return Err(FieldError::new(
            "default.editor",
            editor,
            format!("'{program}' was not found on PATH"),
        ));
    }
    Ok(())
}

fn check_confirm_policy(_: &Validator<'_>, document: &Document) -> Result<(), FieldError> {
    let policy = &document.behavior.confirm_destructive;
    if !CONFIRM_POLICIES.contains(&policy.as_str()) {
        return Err(FieldError::new(
            "behavior.confirm-destructive",
            policy,
            format!("must be one of {}", CONFIRM_POLICIES.join(", ")),
        ));
    }
    Ok(())
}

fn check_remote(field: &str, remote: &str) -> Result<(), FieldError> {
    if remote.is_empty() {
        return Err(FieldError::new(field, remote, "remote name must not be empty"));
    }
    if has_whitespace(remote) || remote.contains('/') || remote.contains('\\') {
        return Err(FieldError::new(
            field,
            remote,
            "remote name must not contain whitespace or path separators",
        ));
    }
    Ok(())
}

fn check_github(provider: &Provider) -> Result<(), FieldError> {
    let token = &provider.token;
    if !token.is_empty() {
        // Never echo a rejected token back.
        let shown = "<redacted>";
        if !GITHUB_TOKEN_PREFIXES.iter().any(|p| token.starts_with(p)) {
            return Err(FieldError::new(
                "integration.github.token",
                shown,
                format!(
                    "token must start with one of {}",
                    GITHUB_TOKEN_PREFIXES.join(", ")
                ),
            ));
        }
        if token.len() < GITHUB_TOKEN_MIN_LEN || has_whitespace(token) {
            return Err(FieldError::new(
                "integration.github.token",
                shown,
                format!(
                    "token must be at least {GITHUB_TOKEN_MIN_LEN} characters without whitespace"
                ),
            ));
        }
    }
    check_remote("integration.github.default-remote", &provider.default_remote)
}

fn check_gitlab(provider: &Provider) -> Result<(), FieldError> {
    let token = &provider.token;
    if !token.is_empty() {
        let shown = "<redacted>";
        if !token.starts_with(GITLAB_TOKEN_PREFIX) {
            return Err(FieldError::new(
                "integration.gitlab.token",
                shown,
                format!("token must start with {GITLAB_TOKEN_PREFIX}"),
            ));
        }
        if token.len() < GITLAB_TOKEN_MIN_LEN || has_whitespace(token) {
            return Err(FieldError::new(
                "integration.gitlab.token",
                shown,
                format!(
                    "token must be at least {GITLAB_TOKEN_MIN_LEN} characters without whitespace"
                ),
            ));
        }
    }
    check_remote("integration.gitlab.default-remote", &provider.default_remote)
}

fn check_providers(_: &Validator<'_>, document: &Document) -> Result<(), FieldError> {
    check_github(&document.integration.github)?;
    check_gitlab(&document.integration.gitlab)
}

fn check_aliases(_: &Validator<'_>, document: &Document) -> Result<(), FieldError> {
    document
        .aliases
        .iter()
        .try_for_each(|(name, value)| validate_alias(name, value))
}
