//! External post-processing run against the saved ledger.
//!
//! The hook never affects the append itself: by the time it runs the ledger
//! is already on disk, so every outcome is only reported.

use crate::config::HookConfig;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Nothing configured to run.
    Skipped,
    Success,
    /// The tool could not be started at all.
    Unavailable(String),
    /// The tool ran and reported an error.
    Failed(String),
}

impl fmt::Display for HookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOutcome::Skipped => write!(f, "post-processing skipped"),
            HookOutcome::Success => write!(f, "post-processing completed"),
            HookOutcome::Unavailable(reason) => {
                write!(f, "post-processing tool unavailable: {}", reason)
            }
            HookOutcome::Failed(reason) => write!(f, "post-processing failed: {}", reason),
        }
    }
}

pub trait PostProcessHook {
    fn run(&self, saved: &Path) -> HookOutcome;
}

pub struct NoHook;

impl PostProcessHook for NoHook {
    fn run(&self, _saved: &Path) -> HookOutcome {
        HookOutcome::Skipped
    }
}

/// Runs `<program> <args>... [macro] <saved file>`.
#[derive(Debug, Clone)]
pub struct CommandHook {
    program: String,
    args: Vec<String>,
    macro_name: Option<String>,
}

impl CommandHook {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            macro_name: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_macro(mut self, macro_name: Option<String>) -> Self {
        self.macro_name = macro_name;
        self
    }

    /// `None` when no command is configured.
    pub fn from_config(config: &HookConfig) -> Option<Self> {
        let program = config.command.as_ref()?;
        Some(
            Self::new(program.clone())
                .with_args(config.args.clone())
                .with_macro(config.macro_name.clone()),
        )
    }
}

impl PostProcessHook for CommandHook {
    fn run(&self, saved: &Path) -> HookOutcome {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(name) = &self.macro_name {
            command.arg(name);
        }
        command.arg(saved);

        tracing::debug!(program = %self.program, file = %saved.display(), "running post-processing");

        match command.output() {
            Ok(output) if output.status.success() => HookOutcome::Success,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let reason = if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    format!("{} ({})", stderr, output.status)
                };
                HookOutcome::Failed(reason)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                HookOutcome::Unavailable(format!("{}: {}", self.program, e))
            }
            Err(e) => HookOutcome::Failed(format!("{}: {}", self.program, e)),
        }
    }
}
