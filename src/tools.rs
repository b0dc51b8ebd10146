//! Invocations of the external FSL and PALM command-line tools.
//!
//! Commands are built as argument vectors and run without a shell, so paths with
//! whitespace or shell metacharacters are passed through unchanged.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GroupMapsError, Result};
use crate::traits::ToolRunner;

/// Axis along which `fslmerge` concatenates its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeAxis {
    Time,
    X,
    Y,
    Z,
    /// Take one volume (component) of every input and concatenate those in time (`-n`).
    Component,
}

impl MergeAxis {
    pub fn flag(self) -> &'static str {
        match self {
            MergeAxis::Time => "-t",
            MergeAxis::X => "-x",
            MergeAxis::Y => "-y",
            MergeAxis::Z => "-z",
            MergeAxis::Component => "-n",
        }
    }
}

impl Default for MergeAxis {
    fn default() -> Self {
        MergeAxis::Component
    }
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new<S: Into<String>>(program: S) -> ToolCommand {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> ToolCommand {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> ToolCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Renders the command the way it could be pasted into a POSIX shell.
impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// `fslmerge <axis> [component] <output> <inputs...>`
pub fn merge_command(program: &str, axis: MergeAxis, component: u32, output: &Path, inputs: &[PathBuf]) -> ToolCommand {
    let mut cmd = ToolCommand::new(program).arg(axis.flag());
    if axis == MergeAxis::Component {
        cmd = cmd.arg(component.to_string());
    }
    cmd.arg(output).args(inputs)
}

/// `fslmaths <input> -Tmean <output>`: voxel-wise mean over the concatenated axis.
pub fn mean_command(program: &str, input: &Path, output: &Path) -> ToolCommand {
    ToolCommand::new(program).arg(input).arg("-Tmean").arg(output)
}

/// `palm -i <input> -o <prefix> -zstat -n <permutations>`: one-sample group mean test.
pub fn one_sample_command(program: &str, input: &Path, output_prefix: &Path, permutations: u32) -> ToolCommand {
    ToolCommand::new(program)
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output_prefix)
        .arg("-zstat")
        .arg("-n")
        .arg(permutations.to_string())
}

/// Runs commands as child processes and waits for each to exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<()> {
        info!("Running {}", command);
        let status = command
            .to_command()
            .status()
            .map_err(|e| GroupMapsError::ToolLaunch(command.program().to_string(), e))?;
        if status.success() {
            Ok(())
        } else {
            Err(GroupMapsError::ExternalTool(command.program().to_string(), status.to_string()))
        }
    }
}

/// Logs and records commands instead of running them.
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner {
    pub commands: Vec<ToolCommand>,
}

impl ToolRunner for DryRunRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<()> {
        info!("Would run {}", command);
        self.commands.push(command.clone());
        Ok(())
    }

    fn executes(&self) -> bool {
        false
    }
}
