use crate::config::StorageConfig;
use extractors::PdfTextExtractor;
use ledgerly_agents::StatementExtractor;
use std::sync::Arc;

/// Shared, read-only request context
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<StatementExtractor>,
    pub pdf: Arc<dyn PdfTextExtractor>,
    pub storage: StorageConfig,
}
