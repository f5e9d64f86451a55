// External extraction engine
//
// The extractor only needs two operations from the engine: a version probe
// and a raw fetch per resource kind. `YtDlpEngine` provides both by driving
// yt-dlp either as a Python module (`python3 -m yt_dlp`) or as the native
// binary, chosen at startup.

pub mod captions;
pub mod command;
pub mod diagnostics;
pub mod errors;
pub mod process;
pub mod traits;
pub mod ytdlp;

pub use command::YtDlpCommand;
pub use diagnostics::{diagnose_error, BlockingReason};
pub use errors::EngineError;
pub use traits::{EngineConfig, EngineMode, ExtractionEngine};
pub use ytdlp::YtDlpEngine;
