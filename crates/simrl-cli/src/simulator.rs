//! External-process simulator adapter
//!
//! Talks to a simulator bridge over line-delimited JSON. Each request is one
//! line on the bridge's stdin:
//!
//! ```text
//! {"op":"load","filename":"MaterialHandling.spp","modelname":"Model"}
//! {"op":"set","path":"Models.Modelo.espera","value":60}
//! {"op":"start","modelname":"Model"}
//! {"op":"get","path":"Models.Modelo.buffers","column":3,"row":1}
//! ```
//!
//! and each response one line on its stdout: `{"ok":true,"value":12.5}` or
//! `{"ok":false,"error":"..."}`. `value` is only read for `get`.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use simrl_core::{Result, SimError, Simulator};

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request<'a> {
    Load {
        filename: &'a str,
        modelname: &'a str,
    },
    Set {
        path: &'a str,
        value: i64,
    },
    Start {
        modelname: &'a str,
    },
    Get {
        path: &'a str,
        column: usize,
        row: usize,
    },
}

#[derive(Debug, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Line protocol over any reader/writer pair.
pub struct LineProtocol<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    line: String,
}

impl<R: BufRead, W: Write> LineProtocol<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    /// Send one request and wait for its response.
    pub fn request(&mut self, request: &Request<'_>) -> Result<Response> {
        let mut payload = serde_json::to_string(request)?;
        payload.push('\n');
        self.writer.write_all(payload.as_bytes())?;
        self.writer.flush()?;

        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Err(SimError::Plant(
                "simulator closed its output before responding".into(),
            ));
        }

        let response: Response = serde_json::from_str(self.line.trim_end())?;
        if response.ok {
            Ok(response)
        } else {
            Err(SimError::Plant(
                response
                    .error
                    .unwrap_or_else(|| "simulator reported an unspecified error".into()),
            ))
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: BufRead, W: Write> Simulator for LineProtocol<R, W> {
    fn load_model(&mut self, filename: &str, modelname: &str) -> Result<()> {
        self.request(&Request::Load {
            filename,
            modelname,
        })
        .map(drop)
    }

    fn set_value(&mut self, path: &str, value: i64) -> Result<()> {
        self.request(&Request::Set { path, value }).map(drop)
    }

    fn start_simulation(&mut self, modelname: &str) -> Result<()> {
        self.request(&Request::Start { modelname }).map(drop)
    }

    fn get_value(&mut self, path: &str, column: usize, row: usize) -> Result<f64> {
        let response = self.request(&Request::Get { path, column, row })?;
        response.value.ok_or_else(|| {
            SimError::Plant(format!("no value returned for {path}[{column},{row}]"))
        })
    }
}

/// Simulator bridge running as a child process.
pub struct ProcessSimulator {
    child: Child,
    protocol: LineProtocol<BufReader<ChildStdout>, ChildStdin>,
}

impl ProcessSimulator {
    pub fn spawn(command: &str, args: &[String]) -> Result<Self> {
        if command.is_empty() {
            return Err(SimError::Config("simulator command is empty".into()));
        }

        info!("Starting simulator bridge: {} {:?}", command, args);
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SimError::Plant("simulator stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SimError::Plant("simulator stdout unavailable".into()))?;

        Ok(Self {
            child,
            protocol: LineProtocol::new(BufReader::new(stdout), stdin),
        })
    }
}

impl Simulator for ProcessSimulator {
    fn load_model(&mut self, filename: &str, modelname: &str) -> Result<()> {
        self.protocol.load_model(filename, modelname)
    }

    fn set_value(&mut self, path: &str, value: i64) -> Result<()> {
        self.protocol.set_value(path, value)
    }

    fn start_simulation(&mut self, modelname: &str) -> Result<()> {
        self.protocol.start_simulation(modelname)
    }

    fn get_value(&mut self, path: &str, column: usize, row: usize) -> Result<f64> {
        self.protocol.get_value(path, column, row)
    }
}

impl Drop for ProcessSimulator {
    fn drop(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => debug!("Simulator bridge exited: {}", status),
            _ => {
                if let Err(e) = self.child.kill() {
                    warn!("Failed to stop simulator bridge: {}", e);
                }
                let _ = self.child.wait();
            }
        }
    }
}
