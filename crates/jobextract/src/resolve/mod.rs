//! Pipeline resolution: caching documents and matching job actions.

pub mod cache;
pub mod resolver;

pub use cache::{PipelineCache, PipelineOutcome};
pub use resolver::{ActionResolver, MalformedCommandPolicy, ResolvedActions};
