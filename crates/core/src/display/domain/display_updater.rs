use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("cannot start display helper '{path}': {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error during updating display ({}){}", exit_code(.code), quoted(.output))]
    Failed { code: Option<i32>, output: String },
    #[error("timeout during updating display{}\nProcess info:\n{process_info}", quoted(.output))]
    Timeout { output: String, process_info: String },
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "killed by signal".to_string(),
    }
}

fn quoted(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(": '{output}'")
    }
}

/// Pushes an encoded frame to the e-paper panel.
pub trait DisplayUpdater {
    /// Shows the encoded frame stored at `frame_path`.
    fn update(&mut self, frame_path: &Path) -> Result<(), DisplayError>;

    /// Blanks the panel.
    fn clear(&mut self) -> Result<(), DisplayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_message_includes_output_when_present() {
        let err = DisplayError::Failed {
            code: Some(3),
            output: "no panel".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "error during updating display (exit code 3): 'no panel'"
        );

        let silent = DisplayError::Failed {
            code: None,
            output: String::new(),
        };
        assert_eq!(
            silent.to_string(),
            "error during updating display (killed by signal)"
        );
    }

    #[test]
    fn test_timeout_message_carries_process_info() {
        let err = DisplayError::Timeout {
            output: String::new(),
            process_info: "--- Process status:\nState: D".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "timeout during updating display\nProcess info:\n--- Process status:\nState: D"
        );
    }
}
