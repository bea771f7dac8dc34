use crate::adapters::{parse_records, render, render_snapshot, InputFormat, OutputFormat};
use crate::core::group::BuddyGroup;
use crate::core::{ConfigProvider, MemberRecord, Pipeline, RoundReport, Storage};
use crate::utils::error::Result;
use crate::utils::random::random_source;

/// Roster in, rounds in the middle, rendered matches out.
pub struct MatchPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> MatchPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MatchPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<MemberRecord>> {
        let path = self.config.data_path();
        let format = InputFormat::resolve(self.config.input_format(), path)?;

        tracing::debug!("Reading roster from {} as {:?}", path, format);
        let data = self.storage.read_file(path).await?;
        parse_records(&data, format)
    }

    async fn transform(&self, records: Vec<MemberRecord>) -> Result<RoundReport> {
        let mut group = BuddyGroup::new(self.config.group_name(), random_source(self.config.seed()));

        let summary = group.import(records);
        tracing::info!(
            "👥 Group '{}': {} members, {} active, {} skipped",
            group.name(),
            group.registry().total_count(),
            group.registry().real_active_count(),
            summary.skipped.len()
        );

        let mut rounds = Vec::with_capacity(self.config.rounds());
        for _ in 0..self.config.rounds() {
            let outcome = group.run_round()?;
            if let Some(bye) = &outcome.bye_member {
                tracing::info!("Round {}: {} has no partner this round", outcome.round, bye);
            }
            rounds.push(outcome);
        }

        Ok(RoundReport {
            report: group.match_report(),
            snapshot: group.snapshot(),
            rounds,
        })
    }

    async fn load(&self, result: RoundReport) -> Result<String> {
        let output_path = self.config.output_path();
        let format = OutputFormat::resolve(self.config.output_format(), output_path)?;

        let rendered = render(&result.report, format)?;
        self.storage
            .write_file(output_path, rendered.as_bytes())
            .await?;
        tracing::debug!("Wrote {} match entries as {:?}", result.report.len(), format);

        if let Some(members_path) = self.config.members_output() {
            let snapshot = render_snapshot(&result.snapshot)?;
            self.storage
                .write_file(members_path, snapshot.as_bytes())
                .await?;
            tracing::info!("💾 Member state saved to: {}", members_path);
        }

        Ok(output_path.to_string())
    }
}
