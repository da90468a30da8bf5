use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Diagnostics for a display helper that stopped responding: its `/proc`
/// status, a user-space backtrace from gdb, and the kernel stack when the
/// kernel records one.
///
/// Collection never fails; whatever could not be gathered is described in the
/// report instead.
#[derive(Clone, Debug)]
pub struct ProcessInfo {
    proc_root: PathBuf,
    kernel_config: PathBuf,
    debugger: PathBuf,
}

impl Default for ProcessInfo {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            kernel_config: PathBuf::from("/proc/config.gz"),
            debugger: PathBuf::from("gdb"),
        }
    }
}

impl ProcessInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debugger(mut self, debugger: impl Into<PathBuf>) -> Self {
        self.debugger = debugger.into();
        self
    }

    pub fn with_kernel_config(mut self, kernel_config: impl Into<PathBuf>) -> Self {
        self.kernel_config = kernel_config.into();
        self
    }

    pub fn collect(&self, pid: u32) -> String {
        let mut report = format!("--- Process status:\n{}", self.status(pid));
        push_section(&mut report, "Stack trace", &self.stack_trace(pid));
        if let Some(kernel_trace) = self.kernel_trace(pid) {
            push_section(&mut report, "Kernel trace", &kernel_trace);
        }
        report.truncate(report.trim_end_matches('\n').len());
        report
    }

    fn status(&self, pid: u32) -> String {
        let path = self.proc_path(pid, "status");
        fs::read_to_string(&path)
            .unwrap_or_else(|e| format!("cannot read {}: {e}", path.display()))
    }

    fn stack_trace(&self, pid: u32) -> String {
        let output = Command::new(&self.debugger)
            .args(["-batch", "-ex", "set pagination off"])
            .args(["-ex", &format!("attach {pid}")])
            .args(["-ex", "thread apply all bt full", "-ex", "detach"])
            .stdin(Stdio::null())
            .output();
        match output {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                text
            }
            Err(e) => format!("cannot run {}: {e}", self.debugger.display()),
        }
    }

    /// Only kernels built with `CONFIG_STACKTRACE=y` expose `/proc/<pid>/stack`.
    fn kernel_trace(&self, pid: u32) -> Option<String> {
        if !self.kernel_config.exists() {
            return None;
        }
        let config = Command::new("zcat")
            .arg(&self.kernel_config)
            .stdin(Stdio::null())
            .output()
            .ok()?;
        let has_stacktrace = String::from_utf8_lossy(&config.stdout)
            .lines()
            .any(|line| line == "CONFIG_STACKTRACE=y");
        if !has_stacktrace {
            return None;
        }

        let path = self.proc_path(pid, "stack");
        Some(
            fs::read_to_string(&path)
                .unwrap_or_else(|e| format!("cannot read {}: {e}", path.display())),
        )
    }

    fn proc_path(&self, pid: u32, file: &str) -> PathBuf {
        self.proc_root.join(pid.to_string()).join(file)
    }
}

fn push_section(report: &mut String, title: &str, body: &str) {
    if !report.ends_with('\n') {
        report.push('\n');
    }
    report.push_str(&format!("--- {title}:\n{body}"));
}
