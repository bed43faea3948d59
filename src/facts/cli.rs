//! Cloud CLI command execution.
//!
//! Provides utilities for running cloud CLI commands and capturing their output.

use crate::config::MAX_COMMAND_OUTPUT;
use crate::error::FactsError;
use colored::Colorize;
use regex::Regex;
use std::process::Command;
use std::sync::OnceLock;

/// Regex for splitting command strings while preserving quoted substrings.
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|\"([^\"]*)\"\s*|([^'\s]*)\s*"#).expect("Invalid Regex")
    })
}

/// Something that can run a command line and hand back its stdout.
pub trait CommandRunner: Send + Sync {
    fn run(&self, cmd: &str) -> Result<String, FactsError>;
}

/// Runs commands as local processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, cmd: &str) -> Result<String, FactsError> {
        run(cmd)
    }
}

/// Run a shell command and return its stdout.
///
/// The command string is split on spaces, with quoted substrings preserved.
///
/// # Returns
/// * `Ok(String)` - The stdout output on success
/// * `Err` - If the command fails, is empty or produces too much output
pub fn run(cmd: &str) -> Result<String, FactsError> {
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let cmds: Vec<&str> = split_and_strip(cmd)
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect();
    log::trace!("split cmds={:?}", cmds);

    let Some((program, args)) = cmds.split_first() else {
        return Err(FactsError::Command("empty command".to_string()));
    };
    let output = Command::new(program).args(args).output().map_err(|e| {
        log::error!("Command execution failed: {}", e);
        FactsError::Command(format!("Failed to execute {program}: {e}"))
    })?;

    if output.status.success() {
        log::debug!("Success cmd: {cmd}");
        log::debug!("Success output.stdout.len(): {}", output.stdout.len());

        if output.stdout.len() > MAX_COMMAND_OUTPUT {
            return Err(FactsError::Command(format!(
                "Response too large: {} bytes for command: {:?}",
                output.stdout.len(),
                cmds
            )));
        }
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!(
            "{failed} to run {cmd}",
            failed = "failed".on_red(),
            cmd = cmd.on_blue()
        );
        return Err(FactsError::Command(format!("ERROR running: {}", stderr.trim())));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| FactsError::Command(format!("Invalid UTF-8: {}", e)))
}

/// Split a command string on spaces, preserving quoted substrings.
fn split_and_strip(input: &str) -> Vec<&str> {
    get_command_regex()
        .find_iter(input)
        .map(|m| m.as_str().trim().trim_matches('\'').trim_matches('"'))
        .collect()
}
