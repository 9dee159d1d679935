pub mod analysis;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod input;
pub mod record;
pub mod scope;
pub mod session;
pub mod timestamp;

pub use analysis::PerformanceReport;
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use record::RawRecord;

use session::AnalysisSession;

/// Run the whole pipeline over a batch of records.
///
/// Only an invalid host pattern in `config` fails; corrupt or unrecognized
/// records are skipped and counted in the report diagnostics.
pub fn analyze_records(records: &[RawRecord], config: &AnalysisConfig) -> Result<PerformanceReport> {
    let scope = config.scope()?;
    tracing::debug!("Analyzing {} records", records.len());

    let mut session = AnalysisSession::with_scope(scope);
    session.ingest_all(records);
    let run = session.finalize();

    Ok(PerformanceReport::build(&run, config.top_n))
}
