use anyhow::Context;
use clap::Parser;
use seat_planner::core::generator::{
    default_scenarios, write_scenario, write_test_suite, Scenario, TestDataGenerator,
};
use seat_planner::utils::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "generate-test-data")]
#[command(about = "Generate roster and preference CSV files for the seat planner")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = "test_data")]
    output_dir: PathBuf,

    /// Random seed for reproducible data
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of students
    #[arg(short = 'n', long, default_value_t = 25)]
    student_count: usize,

    /// Number of willing preference levels
    #[arg(short, long, default_value_t = 3)]
    willing_levels: usize,

    /// Number of unwilling preference levels
    #[arg(short, long, default_value_t = 3)]
    unwilling_levels: usize,

    /// Generate the full scenario suite
    #[arg(long)]
    generate_suite: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let mut generator = TestDataGenerator::new(args.seed);

    if args.generate_suite {
        let dirs = write_test_suite(&mut generator, &default_scenarios(), &args.output_dir)
            .with_context(|| format!("failed to write suite to {}", args.output_dir.display()))?;
        println!("✅ Generated {} scenarios in {}", dirs.len(), args.output_dir.display());
        println!(
            "📋 Report: {}",
            args.output_dir.join("generation_report.txt").display()
        );
        return Ok(());
    }

    let scenario = Scenario {
        name: "custom".to_string(),
        student_count: args.student_count,
        willing_levels: args.willing_levels,
        unwilling_levels: args.unwilling_levels,
        fill_rate_range: (0.3, 0.8),
    };
    let stats = write_scenario(&mut generator, &scenario, &args.output_dir)
        .with_context(|| format!("failed to write data to {}", args.output_dir.display()))?;

    println!("✅ Test data generated in {}", args.output_dir.display());
    println!("  Students: {}", stats.total_students);
    println!("  Willing pairs per level: {:?}", stats.willing);
    println!("  Unwilling pairs per level: {:?}", stats.unwilling);
    Ok(())
}
