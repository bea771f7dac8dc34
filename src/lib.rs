pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::pipelines::MatchPipeline;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::{
    engine::BuddyEngine, group::BuddyGroup, registry::MemberRegistry, rotation::RotationEngine,
};
pub use domain::model::{Member, MemberId, MemberRecord, Pair, RoundOutcome};
pub use utils::error::{BuddyError, Result};
