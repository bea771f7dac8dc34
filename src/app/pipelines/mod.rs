pub mod match_pipeline;

pub use match_pipeline::MatchPipeline;
