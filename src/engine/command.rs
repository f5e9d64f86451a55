// Locating the yt-dlp program on this machine

use std::process::Command as StdCommand;

use super::traits::{EngineConfig, EngineMode};

/// A resolved way of launching yt-dlp
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YtDlpCommand {
    /// `python3 -m yt_dlp ...`
    Python(String),
    /// `yt-dlp ...`
    Binary(String),
}

impl YtDlpCommand {
    /// Resolve the command for the configured mode.
    ///
    /// Probes the machine synchronously; call once at startup.
    pub fn resolve(config: &EngineConfig) -> Self {
        let python = || config.python.clone().unwrap_or_else(find_python);
        let binary = || config.binary_path.clone().unwrap_or_else(find_ytdlp);

        match config.mode {
            EngineMode::Python => Self::Python(python()),
            EngineMode::Cli => Self::Binary(binary()),
            EngineMode::Auto => {
                let py = python();
                if has_ytdlp_module(&py) {
                    tracing::debug!(python = %py, "using yt_dlp python module");
                    Self::Python(py)
                } else {
                    let bin = binary();
                    tracing::debug!(binary = %bin, "python module unavailable, using yt-dlp binary");
                    Self::Binary(bin)
                }
            }
        }
    }

    pub fn program(&self) -> &str {
        match self {
            Self::Python(python) => python,
            Self::Binary(path) => path,
        }
    }

    /// Arguments that precede every yt-dlp option
    pub fn prefix_args(&self) -> Vec<String> {
        match self {
            Self::Python(_) => vec!["-m".to_string(), "yt_dlp".to_string()],
            Self::Binary(_) => Vec::new(),
        }
    }

    pub fn mode(&self) -> EngineMode {
        match self {
            Self::Python(_) => EngineMode::Python,
            Self::Binary(_) => EngineMode::Cli,
        }
    }
}

/// Find Python interpreter
fn find_python() -> String {
    let candidates = ["python3", "/opt/homebrew/bin/python3", "/usr/local/bin/python3"];

    for cmd in candidates {
        if let Ok(output) = StdCommand::new(cmd).arg("--version").output() {
            if output.status.success() {
                return cmd.to_string();
            }
        }
    }

    "python3".to_string()
}

/// Check if yt_dlp module is installed
fn has_ytdlp_module(python: &str) -> bool {
    match StdCommand::new(python).args(["-c", "import yt_dlp"]).output() {
        Ok(out) => out.status.success(),
        Err(_) => false,
    }
}

/// Find yt-dlp binary
fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if std::path::Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return path;
            }
        }
    }

    // Last resort: hope it's in PATH
    "yt-dlp".to_string()
}
