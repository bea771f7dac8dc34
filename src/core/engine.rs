use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct BuddyEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> BuddyEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting buddy matching...");

        // Extract
        let records = self.pipeline.extract().await?;
        tracing::info!("📥 Read {} roster records", records.len());

        // Transform
        let result = self.pipeline.transform(records).await?;
        tracing::info!(
            "🤝 Completed {} rounds for {} members",
            result.rounds.len(),
            result.snapshot.members.len()
        );

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("📁 Matches saved to: {}", output_path);

        Ok(output_path)
    }
}
