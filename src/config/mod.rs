pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::adapters::{InputFormat, OutputFormat};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "buddy-match")]
#[command(about = "Pair buddy program members and rotate partners every round")]
pub struct CliConfig {
    /// Path of the member roster (.json or .csv)
    #[arg(short = 'd', long)]
    pub data: String,

    /// Group name
    #[arg(short = 'n', long, default_value = "Test Group")]
    pub name: String,

    /// Output path for the rendered matches
    #[arg(short = 'o', long, default_value = "matched_result.json")]
    pub out: String,

    /// Roster format (json, csv); inferred from --data when omitted
    #[arg(long)]
    pub input_format: Option<String>,

    /// Output format (json, txt); inferred from --out when omitted
    #[arg(long)]
    pub format: Option<String>,

    /// Number of rounds to run back to back
    #[arg(long, default_value = "1")]
    pub rounds: usize,

    /// Seed for reproducible pairing
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also write the full member state (JSON) to this path
    #[arg(long)]
    pub members_out: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn group_name(&self) -> &str {
        &self.name
    }

    fn data_path(&self) -> &str {
        &self.data
    }

    fn input_format(&self) -> Option<&str> {
        self.input_format.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.out
    }

    fn output_format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    fn rounds(&self) -> usize {
        self.rounds
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn members_output(&self) -> Option<&str> {
        self.members_out.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("name", &self.name)?;
        validation::validate_path("data", &self.data)?;
        validation::validate_path("out", &self.out)?;
        validation::validate_positive_number("rounds", self.rounds, 1)?;

        InputFormat::resolve(self.input_format(), &self.data)?;
        OutputFormat::resolve(self.output_format(), &self.out)?;

        if let Some(members_out) = &self.members_out {
            validation::validate_path("members_out", members_out)?;
            validation::validate_file_extensions("members_out", &[members_out.as_str()], &["json"])?;
        }
        Ok(())
    }
}
