use std::sync::Arc;

use tokio::sync::RwLock;

use crate::analysis::generator::ReportGenerator;
use crate::config::Config;
use crate::session::Session;
use crate::sheets::SheetSource;
use crate::store::ReportStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: Arc<ReportGenerator>,
    pub store: Arc<ReportStore>,
    /// Pluggable tabular source. Default: GoogleSheetsClient.
    pub sheets: Arc<dyn SheetSource>,
    /// Dashboard session: loaded worksheet and reports saved since startup.
    pub session: Arc<RwLock<Session>>,
}
