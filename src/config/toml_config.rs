use crate::adapters::{InputFormat, OutputFormat};
use crate::core::ConfigProvider;
use crate::utils::error::{BuddyError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_ROUNDS: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub group: GroupConfig,
    pub input: InputConfig,
    pub rounds: Option<RoundsConfig>,
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundsConfig {
    pub count: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub format: Option<String>,
    pub members_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// "compact"（預設）或 "json"
    pub format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BuddyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BuddyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ROSTER_PATH})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Self::env_var_pattern()?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn env_var_pattern() -> Result<Regex> {
        Regex::new(r"\$\{([^}]+)\}").map_err(|e| BuddyError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })
    }

    /// 找出沒被替換掉的 ${VAR}（環境變數未設定）
    fn check_env_resolved(field: &str, value: &str) -> Result<()> {
        match Self::env_var_pattern()?.captures(value) {
            Some(caps) => Err(BuddyError::MissingConfigError {
                field: format!("{} (environment variable {} is not set)", field, &caps[1]),
            }),
            None => Ok(()),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("group.name", &self.group.name)?;
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_path("output.path", &self.output.path)?;
        Self::check_env_resolved("input.path", &self.input.path)?;
        Self::check_env_resolved("output.path", &self.output.path)?;
        if let Some(members_path) = &self.output.members_path {
            Self::check_env_resolved("output.members_path", members_path)?;
        }
        validation::validate_positive_number("rounds.count", self.round_count(), 1)?;

        InputFormat::resolve(self.input.format.as_deref(), &self.input.path)?;
        OutputFormat::resolve(self.output.format.as_deref(), &self.output.path)?;

        if let Some(members_path) = &self.output.members_path {
            validation::validate_file_extensions(
                "output.members_path",
                &[members_path.as_str()],
                &["json"],
            )?;
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(BuddyError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Unsupported log format. Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn round_count(&self) -> usize {
        self.rounds
            .as_ref()
            .and_then(|r| r.count)
            .unwrap_or(DEFAULT_ROUNDS)
    }

    pub fn set_round_count(&mut self, count: usize) {
        self.rounds.get_or_insert_with(RoundsConfig::default).count = Some(count);
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rounds.get_or_insert_with(RoundsConfig::default).seed = Some(seed);
    }

    pub fn json_logging(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .is_some_and(|f| f == "json")
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn group_name(&self) -> &str {
        &self.group.name
    }

    fn data_path(&self) -> &str {
        &self.input.path
    }

    fn input_format(&self) -> Option<&str> {
        self.input.format.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    fn rounds(&self) -> usize {
        self.round_count()
    }

    fn seed(&self) -> Option<u64> {
        self.rounds.as_ref().and_then(|r| r.seed)
    }

    fn members_output(&self) -> Option<&str> {
        self.output.members_path.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
