// Season analysis entry point.
//
// 1. Initialize tracing (stderr)
// 2. Load config (copying defaults on first run)
// 3. Run the pipeline against the configured CSV files
// 4. Write tables/charts to the output folder and print the standings

use anyhow::Context;
use hoopstat_app::config;
use hoopstat_app::loader::CsvTableProvider;
use hoopstat_app::output::FileReportSink;
use hoopstat_core::pipeline::{self, PipelineSettings};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: season {}, output to {}",
        config.season,
        config.output_dir().display()
    );

    let settings = PipelineSettings {
        season: config.season.clone(),
        tie_break: config.reconcile.tie_break(),
        histogram_bins: config.report.histogram_bins,
        scoring_stat: config.report.scoring_stat.clone(),
    };

    let provider = CsvTableProvider::from_config(&config);
    let mut sink =
        FileReportSink::create(&config.output_dir()).context("failed to create output folder")?;

    let report = pipeline::run(&provider, &settings, &mut sink).context("analysis failed")?;
    sink.write_summary(&report.season, &report.matches, chrono::Utc::now())
        .context("failed to write run summary")?;

    println!("{} TEAM STANDINGS (top 5):", report.season);
    println!("{:<6}{:>6}{:>8}{:>8}", "Rank", "Team", "Wins", "Win%");
    for s in report.standings.iter().take(5) {
        println!(
            "{:<6}{:>6}{:>8}{:>8.3}",
            s.rank, s.team, s.total_wins, s.win_pct
        );
    }
    println!(
        "{} players with salaries, {} teams; {} files written to {}",
        report.players.len(),
        report.standings.len(),
        sink.written().len(),
        sink.dir().display()
    );
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hoopstat=info,hoopstat_core=info,hoopstat_app=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}
