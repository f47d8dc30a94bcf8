//! Command template resolution.

use crate::error::{Error, Result};
use crate::providers::{system_look_path, LookPath};
use std::path::PathBuf;

const PROMPT_PLACEHOLDER: &str = "{prompt}";
const BRANCH_PLACEHOLDER: &str = "{branch}";

/// A command template resolved into an executable and its argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    /// Absolute path of the executable.
    pub binary: PathBuf,
    /// Full argv; `args[0]` is the resolved binary path.
    pub args: Vec<String>,
}

/// Resolves `template` against `PATH`, substituting `{prompt}` and `{branch}`.
///
/// Each placeholder becomes exactly one argument, so multi-line prompts and
/// branch names with spaces survive intact. An empty branch yields an empty
/// argument rather than dropping it.
///
/// # Errors
///
/// Returns [`Error::EmptyTemplate`] for a blank template and
/// [`Error::BinaryNotFound`] when the first token cannot be resolved.
pub fn parse_command(template: &str, prompt: &str, branch: &str) -> Result<ResolvedCommand> {
    parse_command_with(&system_look_path(), template, prompt, branch)
}

/// Like [`parse_command`], with a custom binary lookup.
///
/// # Errors
///
/// Returns [`Error::EmptyTemplate`] for a blank template and
/// [`Error::BinaryNotFound`] when the first token cannot be resolved.
pub fn parse_command_with(
    look_path: &LookPath,
    template: &str,
    prompt: &str,
    branch: &str,
) -> Result<ResolvedCommand> {
    let mut tokens = template.split_whitespace();
    let binary_token = tokens.next().ok_or(Error::EmptyTemplate)?;
    let binary = look_path(binary_token).map_err(|source| Error::BinaryNotFound {
        binary: binary_token.to_string(),
        source,
    })?;

    let mut args = vec![binary.to_string_lossy().into_owned()];
    args.extend(tokens.map(|token| match token {
        PROMPT_PLACEHOLDER => prompt.to_string(),
        BRANCH_PLACEHOLDER => branch.to_string(),
        other => other.to_string(),
    }));

    Ok(ResolvedCommand { binary, args })
}
