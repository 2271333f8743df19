use clap::Parser;
use seat_planner::core::optimizer::count_assignments;
use seat_planner::core::ConfigProvider;
use seat_planner::utils::{logger, validation::Validate};
use seat_planner::{LocalStorage, PlanConfig, PlanEngine, PlanPipeline};

#[derive(Parser)]
#[command(name = "seat-planner-toml")]
#[command(about = "Batch seat planning driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "seat-plan.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the number of plans to generate
    #[arg(long)]
    top_n: Option<usize>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based seat planner");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match PlanConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(top_n) = args.top_n {
        config.solver.top_n = Some(top_n);
        tracing::info!("🔧 top_n overridden to: {}", top_n);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config).await;
        return;
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.base_dir(), config.output_path());
    let pipeline = PlanPipeline::new(storage, config);
    let engine = PlanEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Seat planning completed successfully!");
            println!("✅ Seat planning completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Seat planning failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

fn display_config_summary(config: &PlanConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Plan: {} v{}", config.plan.name, config.plan.version);
    if let Some(description) = &config.plan.description {
        println!("  Description: {}", description);
    }
    println!("  Roster: {}/{}", config.base_dir(), config.names_file());
    match config.preferences_file() {
        Some(file) => println!("  Preferences: {}/{}", config.base_dir(), file),
        None => println!("  Preferences: (none)"),
    }
    println!("  Columns: {}", config.layout.columns);
    println!("  Output: {}/{}", config.output_path(), config.bundle_name());

    let options = config.solver_options();
    println!(
        "  Solver: top {} plans, {:?} per plan",
        options.top_n, options.time_limit
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &PlanConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    let storage = LocalStorage::new(config.base_dir(), config.output_path());
    let pipeline = PlanPipeline::new(storage, config.clone());

    let input = match seat_planner::core::Pipeline::extract(&pipeline).await {
        Ok(input) => input,
        Err(e) => {
            println!("  ❌ Input could not be read: {}", e.user_friendly_message());
            println!("  💡 {}", e.recovery_suggestion());
            return;
        }
    };

    println!("👥 Input Analysis:");
    println!("  People: {}", input.people.len());
    println!("  Willing pairs: {}", input.preferences.willing_count());
    println!("  Unwilling pairs: {}", input.preferences.unwilling_count());
    println!("  Custom weights: {}", input.custom_pairs.len());
    if let Some(detected) = &input.preferences.detected {
        println!(
            "  Detected ranges: willing={}, unwilling={}",
            detected.willing.as_deref().unwrap_or("-"),
            detected.unwilling.as_deref().unwrap_or("-")
        );
    }

    println!();
    println!("🪑 Layout Analysis:");
    let spec = config.layout_spec(input.people.len());
    println!("  Rows per column: {:?}", spec.rows_per_col);
    println!("  Total seats: {}", spec.total_seats());
    println!("  Diagonal adjacency: {}", spec.include_diagonal);
    if spec.total_seats() < input.people.len() {
        println!(
            "  ⚠️ Not enough seats for {} people",
            input.people.len()
        );
    }

    println!();
    println!("🧮 Solver Analysis:");
    let options = config.solver_options();
    let space = count_assignments(spec.total_seats(), input.people.len());
    if space <= options.exhaustive_limit {
        println!("  Exhaustive search over {} assignments", space);
    } else {
        println!(
            "  Local search, budget {:?}",
            options.time_limit * options.top_n as u32
        );
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
