// Concurrent batch extraction with a concurrency ceiling

use futures::future::join_all;
use serde::ser::{Serialize, Serializer};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::errors::{ErrorReport, ExtractionError};
use super::models::DomainRecord;
use super::orchestrator::Extractor;
use super::request::ExtractionRequest;

/// A batch entry as the caller gave it
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum BatchRequest {
    Accepted(ExtractionRequest),
    /// Entry that never became a request, echoed back verbatim
    Rejected { resource_url: String, kind: String },
}

impl BatchRequest {
    pub fn resource_url(&self) -> &str {
        match self {
            Self::Accepted(request) => request.resource_url(),
            Self::Rejected { resource_url, .. } => resource_url,
        }
    }
}

/// What the dispatcher runs: a request, or an entry already known to be bad
#[derive(Debug, Clone)]
pub enum BatchInput {
    Request(ExtractionRequest),
    Rejected {
        resource_url: String,
        kind: String,
        error: ExtractionError,
    },
}

impl From<ExtractionRequest> for BatchInput {
    fn from(request: ExtractionRequest) -> Self {
        Self::Request(request)
    }
}

/// One input and how it went
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub request: BatchRequest,
    pub result: Result<Arc<DomainRecord>, ExtractionError>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl Serialize for BatchItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Item<'a> {
            request: &'a BatchRequest,
            ok: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            result: Option<&'a DomainRecord>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<ErrorReport>,
        }

        let (result, error) = match &self.result {
            Ok(record) => (Some(record.as_ref()), None),
            Err(e) => (None, Some(e.to_report())),
        };
        Item {
            request: &self.request,
            ok: error.is_none(),
            result,
            error,
        }
        .serialize(serializer)
    }
}

/// Results in input order plus aggregate counts
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

impl BatchResult {
    fn from_items(items: Vec<BatchItem>) -> Self {
        let succeeded = items.iter().filter(|item| item.is_ok()).count();
        Self {
            failed: items.len() - succeeded,
            succeeded,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Fans requests out to the extractor. Holds no state between batches.
pub struct BatchDispatcher {
    extractor: Arc<Extractor>,
    default_concurrency: usize,
}

impl BatchDispatcher {
    pub fn new(extractor: Arc<Extractor>, default_concurrency: usize) -> Self {
        Self {
            extractor,
            default_concurrency: default_concurrency.max(1),
        }
    }

    pub fn default_concurrency(&self) -> usize {
        self.default_concurrency
    }

    /// Run every request, at most `concurrency` at a time.
    ///
    /// Never fails as a whole: each item carries its own outcome. Rejected
    /// inputs take no permit and never reach the extractor.
    pub async fn batch_extract<I: Into<BatchInput>>(
        &self,
        inputs: Vec<I>,
        concurrency: Option<usize>,
    ) -> BatchResult {
        let limit = concurrency.unwrap_or(self.default_concurrency).max(1);
        let semaphore = Semaphore::new(limit);
        let total = inputs.len();

        tracing::info!(total, concurrency = limit, "batch started");

        let outcomes = join_all(inputs.into_iter().map(|input| {
            let semaphore = &semaphore;
            let extractor = &self.extractor;
            async move {
                match input.into() {
                    BatchInput::Request(request) => {
                        // The semaphore lives for the whole batch and is never closed
                        let _permit = semaphore.acquire().await.ok();
                        let result = extractor.extract(&request).await;
                        BatchItem {
                            request: BatchRequest::Accepted(request),
                            result,
                        }
                    }
                    BatchInput::Rejected {
                        resource_url,
                        kind,
                        error,
                    } => BatchItem {
                        request: BatchRequest::Rejected { resource_url, kind },
                        result: Err(error),
                    },
                }
            }
        }))
        .await;

        let result = BatchResult::from_items(outcomes);
        tracing::info!(
            total,
            succeeded = result.succeeded,
            failed = result.failed,
            "batch finished"
        );
        result
    }
}
