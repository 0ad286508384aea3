use std::future::Future;

use crate::error::BackendError;
use crate::stage::SearchPipeline;
use crate::types::RankedResult;

/// A document-search capability able to run a whole pipeline in one round trip.
///
/// Implementations must support fuzzy text relevance across all text fields,
/// boolean equality filters, result capping and a numeric score per result.
/// Dropping the returned future abandons the call.
pub trait DocumentSearch: Send + Sync {
    fn execute_pipeline(
        &self,
        pipeline: &SearchPipeline,
    ) -> impl Future<Output = Result<Vec<RankedResult>, BackendError>> + Send;
}
