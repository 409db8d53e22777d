//! Desktop notifier command sink (`notify-send` by default).

use std::sync::atomic::AtomicU64;

use crate::error::DispatchError;
use crate::sink::{Notification, NotificationId, NotificationSink};

pub const DEFAULT_NOTIFY_COMMAND: &str = "notify-send";

/// Runs an external program and returns its stdout. Enables mock injection
/// for testing.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<String, DispatchError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &str, args: &[String]) -> Result<String, DispatchError> {
        (**self).run(program, args)
    }
}

/// Real runner using `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, DispatchError> {
        let output = std::process::Command::new(program)
            .args(args)
            .output()
            .map_err(|source| DispatchError::Spawn {
                program: program.to_owned(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DispatchError::CommandFailed {
                program: program.to_owned(),
                detail: format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Shows notifications by running `<program> [--icon <url>] --print-id <title> <message>`.
pub struct CommandSink<R: CommandRunner = SystemCommandRunner> {
    program: String,
    runner: R,
    seq: AtomicU64,
}

impl CommandSink<SystemCommandRunner> {
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_runner(program, SystemCommandRunner)
    }
}

impl<R: CommandRunner> CommandSink<R> {
    pub fn with_runner(program: impl Into<String>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
            seq: AtomicU64::new(0),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn args(notification: &Notification) -> Vec<String> {
        let mut args = vec!["--app-name=zepwatch".to_owned()];
        if !notification.icon_url.is_empty() {
            args.push("--icon".to_owned());
            args.push(notification.icon_url.clone());
        }
        args.push("--print-id".to_owned());
        // "--" keeps a title starting with '-' from being read as a flag.
        args.push("--".to_owned());
        args.push(notification.title.clone());
        args.push(notification.message.clone());
        args
    }
}

impl<R: CommandRunner> NotificationSink for CommandSink<R> {
    fn create(&self, notification: &Notification) -> Result<NotificationId, DispatchError> {
        let stdout = self.runner.run(&self.program, &Self::args(notification))?;
        // notify-send prints the server-assigned id; other notifiers may not.
        match stdout.trim() {
            "" => Ok(NotificationId::generate(&self.seq)),
            id => Ok(NotificationId(id.to_owned())),
        }
    }
}
