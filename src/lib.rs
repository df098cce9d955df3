pub mod config;
pub mod enrich;
pub mod error;
pub mod ledger;
pub mod model;
pub mod net;
pub mod pipeline;
pub mod players;
pub mod rankings;
pub mod revert;
pub mod sources;

pub use config::PipelineConfig;
pub use error::{PlayerBaseError, Result, SourceError};
pub use model::*;
