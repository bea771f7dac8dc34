use buddy_match::adapters::{parse_records, InputFormat, OutputFormat};
use buddy_match::core::parity::ParityStabilizer;
use buddy_match::core::{ConfigProvider, Storage};
use buddy_match::utils::{logger, validation::Validate};
use buddy_match::{BuddyEngine, LocalStorage, MatchPipeline, TomlConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-buddy")]
#[command(about = "Buddy matching driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "buddy-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the number of rounds from config
    #[arg(long)]
    rounds: Option<usize>,

    /// Override the random seed from config
    #[arg(long)]
    seed: Option<u64>,

    /// Dry run - show the roster and plan without pairing anyone
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logging() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based buddy matching");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(rounds) = args.rounds {
        config.set_round_count(rounds);
        tracing::info!("🔧 Rounds overridden to: {}", rounds);
    }
    if let Some(seed) = args.seed {
        config.set_seed(seed);
        tracing::info!("🔧 Seed overridden to: {}", seed);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let storage = LocalStorage::new(".".to_string());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No pairing will occur");
        if let Err(e) = perform_dry_run(&config, &storage).await {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.severity().exit_code().max(1));
        }
        return Ok(());
    }

    let pipeline = MatchPipeline::new(storage, config);
    let engine = BuddyEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            println!("✅ Matching completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Matching failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Group: {}", config.group.name);
    if let Some(description) = &config.group.description {
        println!("  Description: {}", description);
    }
    println!("  Roster: {}", config.data_path());
    println!("  Output: {}", config.output_path());
    println!("  Rounds: {}", config.rounds());

    match config.seed() {
        Some(seed) => println!("  Seed: {}", seed),
        None => println!("  Seed: (random)"),
    }

    if let Some(members_path) = config.members_output() {
        println!("  Member state: {}", members_path);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(
    config: &TomlConfig,
    storage: &LocalStorage,
) -> buddy_match::Result<()> {
    let input_format = InputFormat::resolve(config.input_format(), config.data_path())?;
    let output_format = OutputFormat::resolve(config.output_format(), config.output_path())?;

    let data = storage.read_file(config.data_path()).await?;
    let records = parse_records(&data, input_format)?;

    let valid: Vec<_> = records.iter().filter(|r| r.identity().is_some()).collect();
    let active = valid.iter().filter(|r| r.capacity() > 0).count();

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("👥 Roster ({:?}):", input_format);
    println!("  Records: {}", records.len());
    println!("  Missing name or email: {}", records.len() - valid.len());
    println!("  Active members: {}", active);
    println!("  Sitting out (capacity 0): {}", valid.len() - active);

    println!();
    println!("⚙️ Pairing Plan:");
    println!("  Pairs per round: {}", active / 2);
    if ParityStabilizer::needs_bye(active) {
        println!("  Odd active count: one member sits out each round");
    }
    println!("  Output format: {:?}", output_format);

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
