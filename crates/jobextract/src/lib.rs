pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod resolve;
pub mod store;

pub use config::{load_config, Config};
pub use db::{Database, DatabaseError, DatabaseJobStore, TableNames};
pub use diagnostics::{
    CollectingDiagnostics, DiagnosticEvent, DiagnosticSink, NoopDiagnostics, TracingDiagnostics,
};
pub use error::{ConfigError, ExtractError, Result};
pub use extract::{ExtractOptions, ExtractionSession, JobSummaries, JobsActions};
pub use output::{JobSummaryWriter, JobsActionsWriter, WriteSummary};
pub use pipeline::{ActionDefinition, PipelineDocument, PipelineParseError};
pub use records::{Action, ActionMarkers, Job, JobSummary, PseudoActionId};
pub use resolve::{
    ActionResolver, MalformedCommandPolicy, PipelineCache, PipelineOutcome, ResolvedActions,
};
pub use store::{JobRow, JobStore, PipelineSource};
