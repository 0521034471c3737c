use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use sounder_common::config::PingConfig;
use sounder_common::error::ConfigError;
use sounder_common::network::target::Target;
use sounder_common::outcome::Outcome;

use super::{Probe, ProbeError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The echo-request command line for one platform, minus the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingCommand {
    program: String,
    args: Vec<String>,
}

impl PingCommand {
    /// One echo request with a one-second wait on the given OS
    /// (as named by [`std::env::consts::OS`]).
    pub fn for_platform(os: &str) -> Result<Self, ConfigError> {
        let args: &[&str] = match os {
            "linux" | "android" => &["-c", "1", "-w", "1"],
            // Windows takes the wait in milliseconds.
            "windows" => &["-n", "1", "-w", "1000"],
            "macos" | "freebsd" => &["-c", "1", "-t", "1"],
            other => return Err(ConfigError::UnsupportedPlatform(other.to_string())),
        };
        Ok(Self::custom("ping", args.iter().copied()))
    }

    /// The command for the platform this binary was built for.
    pub fn native() -> Result<Self, ConfigError> {
        Self::for_platform(std::env::consts::OS)
    }

    /// Any program that takes the target as its last argument and exits 0
    /// when the target answered.
    pub fn custom<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn spawn(&self, target: &Target) -> Result<Child, ProbeError> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

/// Reachability check through the operating system's `ping`.
///
/// Only the exit status is looked at. A child that outlives the configured
/// deadline is killed and counted as unreachable.
#[derive(Debug, Clone)]
pub struct PingProbe {
    command: PingCommand,
    deadline: Duration,
}

impl PingProbe {
    pub fn new(config: PingConfig) -> Result<Self, ConfigError> {
        Self::with_command(PingCommand::native()?, config)
    }

    pub fn with_command(command: PingCommand, config: PingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            command,
            deadline: config.deadline,
        })
    }

    pub fn command(&self) -> &PingCommand {
        &self.command
    }
}

impl Probe for PingProbe {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn probe(&self, target: &Target) -> Result<Outcome, ProbeError> {
        // A leading dash would be parsed by ping as an option.
        if target.as_str().is_empty() || target.as_str().starts_with('-') {
            return Err(ProbeError::InvalidTarget(target.to_string()));
        }

        let mut child = self.command.spawn(target)?;
        let status = wait_with_deadline(&mut child, self.deadline).map_err(ProbeError::Wait)?;

        let outcome = match status {
            Some(status) if status.success() => Outcome::Reachable,
            Some(_) => Outcome::Unreachable,
            None => {
                debug!("{} did not answer within {:?}", target, self.deadline);
                Outcome::Unreachable
            }
        };
        Ok(outcome)
    }

    fn fault_outcome(&self) -> Outcome {
        Outcome::Unreachable
    }
}

/// Waits for `child`, killing it once `deadline` has passed.
///
/// Returns `None` when the child had to be killed. The child is always reaped
/// before this returns, error paths included.
fn wait_with_deadline(child: &mut Child, deadline: Duration) -> std::io::Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) if started.elapsed() >= deadline => {
                reap(child);
                return Ok(None);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                reap(child);
                return Err(e);
            }
        }
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
