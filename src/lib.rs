pub mod config;
pub mod engine;
pub mod extractor;
pub mod testing;
pub mod tools;

pub use config::{Config, ConfigError, ConfigSnapshot};
pub use engine::{EngineError, ExtractionEngine, YtDlpEngine};
pub use extractor::{
    BatchDispatcher, BatchResult, DomainRecord, ExtractionError, ExtractionRequest, Extractor,
    HealthReporter, ResourceKind, ResponseCache, RetryPolicy,
};
pub use tools::{ToolError, ToolServer};
