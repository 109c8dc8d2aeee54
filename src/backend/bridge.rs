//! Automation session hosted by a helper process.
//!
//! The helper owns the word processor's automation object and speaks a
//! line protocol on stdin/stdout, one tab-separated request per line:
//!
//! ```text
//! (startup)                    -> READY | ERR<TAB>reason
//! OPEN<TAB>source              -> OK | ERR<TAB>reason
//! SAVE<TAB>destination<TAB>fmt -> OK | ERR<TAB>reason
//! CLEAR                        -> OK | ERR<TAB>reason
//! QUIT                         -> OK, then the helper exits
//! ```
//!
//! Replies are awaited without a deadline.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use base64::{engine::general_purpose, Engine as _};
use log::{debug, warn};
use crate::backend::automation::{AutomationConnector, AutomationSession};
use crate::error::{AutomationFault, InitError};
use crate::utils::utils::hide_console_window;

pub const DEFAULT_BRIDGE_PROGRAM: &str = "powershell.exe";

/// Helper script shipped inside the binary.
pub const BRIDGE_SCRIPT: &str = include_str!("../../assets/bridge/hwp_automation.ps1");

/// PowerShell arguments that run the embedded helper script.
///
/// The script travels as `-EncodedCommand` (base64 of its UTF-16LE text), so
/// the helper starts the same way from any working directory.
pub fn default_bridge_args() -> Vec<String> {
    vec![
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-EncodedCommand".to_string(),
        encode_command(BRIDGE_SCRIPT),
    ]
}

pub fn encode_command(script: &str) -> String {
    let utf16: Vec<u8> = script.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect();
    general_purpose::STANDARD.encode(utf16)
}

const QUIT_GRACE: Duration = Duration::from_secs(5);

pub struct BridgeConnector {
    program: String,
    args: Vec<String>,
}

impl BridgeConnector {
    pub fn new(program: &str, args: &[String]) -> Self {
        BridgeConnector {
            program: program.to_string(),
            args: args.to_vec(),
        }
    }
}

impl AutomationConnector for BridgeConnector {
    fn describe(&self) -> String {
        format!("bridge {}", self.program)
    }

    fn connect(&mut self) -> Result<Box<dyn AutomationSession>, InitError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        hide_console_window(&mut cmd);

        let mut child = cmd.spawn().map_err(|source| InitError::BridgeLaunch {
            program: self.program.clone(),
            source,
        })?;
        debug!("automation bridge started, pid {}", child.id());

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InitError::Automation(AutomationFault::Protocol(
                    "bridge pipes unavailable".to_string(),
                )));
            }
        };

        let mut session = BridgeSession {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            closed: false,
        };
        match session.read_reply()? {
            Reply::Ready => Ok(Box::new(session)),
            Reply::Err(reason) => Err(AutomationFault::Rejected(reason).into()),
            Reply::Ok => Err(AutomationFault::Protocol("OK before READY".to_string()).into()),
        }
    }
}

enum Reply {
    Ready,
    Ok,
    Err(String),
}

pub struct BridgeSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    closed: bool,
}

impl BridgeSession {
    fn request(&mut self, fields: &[&str]) -> Result<(), AutomationFault> {
        if let Some(bad) = fields.iter().find(|f| f.contains(['\t', '\n', '\r'])) {
            return Err(AutomationFault::Rejected(format!(
                "argument cannot be sent to the bridge: {:?}",
                bad
            )));
        }
        writeln!(self.stdin, "{}", fields.join("\t"))?;
        self.stdin.flush()?;

        match self.read_reply()? {
            Reply::Ok => Ok(()),
            Reply::Err(reason) => Err(AutomationFault::Rejected(reason)),
            Reply::Ready => Err(AutomationFault::Protocol("READY".to_string())),
        }
    }

    fn read_reply(&mut self) -> Result<Reply, AutomationFault> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(AutomationFault::Disconnected);
        }
        let line = line.trim_end_matches(['\r', '\n']);
        let (head, rest) = line.split_once('\t').unwrap_or((line, ""));
        match head {
            "READY" => Ok(Reply::Ready),
            "OK" => Ok(Reply::Ok),
            "ERR" => Ok(Reply::Err(rest.to_string())),
            _ => Err(AutomationFault::Protocol(line.to_string())),
        }
    }

    fn reap(&mut self) {
        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("automation bridge exited ({})", status);
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(50)),
                _ => break,
            }
        }
        warn!("automation bridge still running after quit, killing pid {}", self.child.id());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// The protocol is UTF-8 text; a lossy path would name a different file.
fn line_safe(path: &Path) -> Result<&str, AutomationFault> {
    path.to_str().ok_or_else(|| {
        AutomationFault::Rejected(format!("path is not valid Unicode: {}", path.display()))
    })
}

impl AutomationSession for BridgeSession {
    fn open(&mut self, source: &Path) -> Result<(), AutomationFault> {
        self.request(&["OPEN", line_safe(source)?])
    }

    fn save_as(&mut self, destination: &Path, format_token: &str) -> Result<(), AutomationFault> {
        self.request(&["SAVE", line_safe(destination)?, format_token])
    }

    fn clear(&mut self) -> Result<(), AutomationFault> {
        self.request(&["CLEAR"])
    }

    fn quit(&mut self) -> Result<(), AutomationFault> {
        if self.closed {
            return Ok(());
        }
        let sent = self.request(&["QUIT"]);
        self.closed = true;
        self.reap();
        sent
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
