use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::display::domain::display_updater::{DisplayError, DisplayUpdater};
use crate::display::infrastructure::process_info::ProcessInfo;
use crate::shared::constants::{DISPLAY_UPDATE_TIMEOUT, UPDATE_DISPLAY_PATH};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

enum OutputEvent {
    Line(String),
    Closed,
}

/// Runs the panel helper once per update: `update-display -v <vcom> [-f <file>]`.
///
/// The helper's stdout and stderr are merged into one report. A helper that
/// outlives the timeout is inspected with [`ProcessInfo`] and killed.
pub struct UpdateDisplayProcess {
    program: PathBuf,
    vcom: f64,
    timeout: Duration,
    process_info: ProcessInfo,
}

impl UpdateDisplayProcess {
    pub fn new(vcom: f64) -> Self {
        Self {
            program: PathBuf::from(UPDATE_DISPLAY_PATH),
            vcom,
            timeout: DISPLAY_UPDATE_TIMEOUT,
            process_info: ProcessInfo::new(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_process_info(mut self, process_info: ProcessInfo) -> Self {
        self.process_info = process_info;
        self
    }

    fn args(&self, frame_path: Option<&Path>) -> Vec<OsString> {
        let mut args = vec![OsString::from("-v"), OsString::from(self.vcom.to_string())];
        if let Some(path) = frame_path {
            args.push(OsString::from("-f"));
            args.push(path.as_os_str().to_owned());
        }
        args
    }

    fn run(&self, frame_path: Option<&Path>) -> Result<(), DisplayError> {
        let started = Instant::now();
        let deadline = started + self.timeout;

        let mut child = Command::new(&self.program)
            .args(self.args(frame_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DisplayError::Spawn {
                path: self.program.clone(),
                source,
            })?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut open_pipes = 0;
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, tx.clone());
            open_pipes += 1;
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, tx.clone());
            open_pipes += 1;
        }
        drop(tx);

        let mut output = String::new();
        while open_pipes > 0 {
            match rx.recv_deadline(deadline) {
                Ok(OutputEvent::Line(line)) => output.push_str(&line),
                Ok(OutputEvent::Closed) => open_pipes -= 1,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(self.abandon(&mut child, &rx, output));
                }
            }
        }

        let status = match wait_until(&mut child, deadline) {
            Some(status) => status,
            None => return Err(self.abandon(&mut child, &rx, output)),
        };

        let output = output.trim_end().to_string();
        if !status.success() {
            return Err(DisplayError::Failed {
                code: status.code(),
                output,
            });
        }

        log::info!(
            "Display {} in {:.1}s",
            if frame_path.is_some() { "updated" } else { "cleared" },
            started.elapsed().as_secs_f64()
        );
        if !output.is_empty() {
            log::debug!("Display helper output: {output}");
        }
        Ok(())
    }

    /// Collects diagnostics for a hung helper, kills it, and builds the
    /// timeout error with whatever it printed.
    fn abandon(
        &self,
        child: &mut Child,
        rx: &Receiver<OutputEvent>,
        mut output: String,
    ) -> DisplayError {
        log::warn!(
            "Display helper {} did not finish within {:?}",
            child.id(),
            self.timeout
        );
        let process_info = self.process_info.collect(child.id());

        // Already exited between the deadline and the kill is fine.
        let _ = child.kill();
        let _ = child.wait();

        while let Ok(event) = rx.recv_timeout(DRAIN_TIMEOUT) {
            if let OutputEvent::Line(line) = event {
                output.push_str(&line);
            }
        }

        DisplayError::Timeout {
            output: output.trim_end().to_string(),
            process_info,
        }
    }
}

impl DisplayUpdater for UpdateDisplayProcess {
    fn update(&mut self, frame_path: &Path) -> Result<(), DisplayError> {
        self.run(Some(frame_path))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.run(None)
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(pipe: R, tx: Sender<OutputEvent>) {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line).into_owned();
                    if tx.send(OutputEvent::Line(text)).is_err() {
                        return;
                    }
                }
            }
        }
        let _ = tx.send(OutputEvent::Closed);
    });
}

/// Polls for exit until `deadline`. `None` means the process is still running.
fn wait_until(child: &mut Child, deadline: Instant) -> Option<ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => std::thread::sleep(EXIT_POLL_INTERVAL),
            Ok(None) | Err(_) => return None,
        }
    }
}
