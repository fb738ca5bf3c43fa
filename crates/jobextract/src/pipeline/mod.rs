pub mod command;
pub mod document;
pub mod error;
pub mod loader;

pub use command::{parse_tool_identity, ToolIdentity};
pub use document::{ActionDefinition, PipelineDocument};
pub use error::{CommandError, PipelineParseError};
pub use loader::parse;
