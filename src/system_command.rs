//! Side effects on the host system (print spooler, external viewer)
//! behind a trait so the viewer can be tested without running them.

use std::any::Any;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use log::{debug, info};

pub trait SystemCommandExecutor {
    /// Run `program` with `args` and wait for it to exit successfully
    fn run(&self, program: &str, args: &[String]) -> Result<(), String>;

    /// Open a file with the system's default application
    fn open_file(&self, path: &Path) -> Result<(), String>;

    fn as_any(&self) -> &dyn Any;
}

pub struct RealSystemCommandExecutor;

impl SystemCommandExecutor for RealSystemCommandExecutor {
    fn run(&self, program: &str, args: &[String]) -> Result<(), String> {
        info!("Running {program} {}", args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| format!("cannot run {program}: {e}"))?;

        if output.status.success() {
            debug!(
                "{program} finished: {}",
                String::from_utf8_lossy(&output.stdout).trim()
            );
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!("{program} exited with {}: {}", output.status, stderr.trim()))
        }
    }

    fn open_file(&self, path: &Path) -> Result<(), String> {
        info!("Opening {path:?} with the system viewer");
        open::that(path).map_err(|e| e.to_string())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Records commands instead of running them
#[derive(Default)]
pub struct MockSystemCommandExecutor {
    executed_commands: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl MockSystemCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor whose every command fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            executed_commands: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    pub fn get_executed_commands(&self) -> Vec<String> {
        self.executed_commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn record(&self, command: String) -> Result<(), String> {
        if let Ok(mut commands) = self.executed_commands.lock() {
            commands.push(command);
        }
        match &self.failure {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }
}

impl SystemCommandExecutor for MockSystemCommandExecutor {
    fn run(&self, program: &str, args: &[String]) -> Result<(), String> {
        let mut command = program.to_string();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        self.record(command)
    }

    fn open_file(&self, path: &Path) -> Result<(), String> {
        self.record(format!("open {}", path.display()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_records_commands_in_order() {
        let mock = MockSystemCommandExecutor::new();
        mock.run("lp", &["-d".into(), "office".into(), "a.pdf".into()])
            .unwrap();
        mock.open_file(Path::new("/tmp/b.pdf")).unwrap();

        assert_eq!(
            mock.get_executed_commands(),
            vec!["lp -d office a.pdf", "open /tmp/b.pdf"]
        );
    }

    #[test]
    fn failing_mock_still_records() {
        let mock = MockSystemCommandExecutor::failing("no printers");
        assert_eq!(mock.run("lp", &[]).unwrap_err(), "no printers");
        assert_eq!(mock.get_executed_commands().len(), 1);
    }
}
