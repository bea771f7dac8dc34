pub mod engine;
pub mod group;
pub mod parity;
pub mod partition;
pub mod registry;
pub mod rotation;

pub use crate::domain::model::{MemberRecord, RoundReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RandomSource, Storage};
pub use crate::utils::error::Result;
