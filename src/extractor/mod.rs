// Request orchestration over the extraction engine
//
// Layers, leaves first:
// - cache: TTL key/value store shared by the whole process
// - retry: bounded exponential backoff
// - orchestrator: the `Extractor` facade (validate, cache, retry, normalize)
// - batch: bounded-concurrency fan-out over the facade
// - health: engine probe plus cache/config snapshots

pub mod batch;
pub mod cache;
pub mod errors;
pub mod health;
pub mod models;
pub mod orchestrator;
pub mod request;
pub mod retry;

pub use batch::{BatchDispatcher, BatchInput, BatchItem, BatchRequest, BatchResult};
pub use cache::{CacheStats, ResponseCache};
pub use errors::{ErrorKind, ErrorReport, ExtractionError};
pub use health::{HealthReport, HealthReporter, HealthStatus};
pub use models::DomainRecord;
pub use orchestrator::{Extractor, RecordCache};
pub use request::{ExtractionRequest, Parameters, ResourceKind};
pub use retry::RetryPolicy;
