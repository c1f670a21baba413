use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

use olympics_dashboard::analytics::{medal_distribution, tally_summary, top_athletes, top_countries};
use olympics_dashboard::athletes::MAX_AGE;
use olympics_dashboard::continents::is_known_code;
use olympics_dashboard::logging::init_logging;
use olympics_dashboard::{
    compare_countries, evaluate, export_tally, write_tally_csv, CountryProfile, CountrySide,
    DashboardConfig, DashboardData, DatasetStore, FilterSelection, Gender, MedalType,
};

#[derive(Parser)]
#[command(name = "olympics-dashboard")]
#[command(about = "Paris 2024 medal tables, KPIs and country follow-up from CSV extracts")]
#[command(version)]
struct Cli {
    /// TOML config file (defaults apply when it does not exist)
    #[arg(long, global = true, default_value = "dashboard.toml")]
    config: PathBuf,

    /// Directory holding the CSV extracts (overrides the config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(flatten)]
    filters: FilterArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Sidebar filters; every list flag is repeatable and comma-separated
#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long, global = true, value_delimiter = ',')]
    continent: Vec<String>,

    #[arg(long, global = true, value_delimiter = ',')]
    country: Vec<String>,

    #[arg(long, global = true, value_delimiter = ',')]
    sport: Vec<String>,

    /// Gold, Silver, Bronze (empty = all three)
    #[arg(long, global = true, value_delimiter = ',')]
    medal: Vec<MedalType>,

    #[arg(long, global = true, default_value = "All")]
    gender: Gender,

    #[arg(long, global = true)]
    min_age: Option<i64>,

    #[arg(long, global = true)]
    max_age: Option<i64>,
}

impl FilterArgs {
    fn to_selection(&self) -> FilterSelection {
        let mut selection = FilterSelection::default()
            .with_continents(&self.continent)
            .with_countries(&self.country)
            .with_sports(&self.sport)
            .with_medal_types(self.medal.iter().copied())
            .with_gender(self.gender);

        if self.min_age.is_some() || self.max_age.is_some() {
            selection = selection.with_age_range(self.min_age.unwrap_or(0), self.max_age.unwrap_or(MAX_AGE));
        }
        selection
    }
}

#[derive(Subcommand)]
enum Commands {
    /// KPIs and the top of the medal table
    Overview {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Export the filtered medal table as CSV
    Tally {
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Follow one country: sports, participants, opponents, medals
    Country {
        code: String,
    },
    /// Head-to-head comparison of two countries
    Compare {
        first: String,
        second: String,
    },
    /// Report which data files are present
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DashboardConfig::load_or_default(&cli.config)?;
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    init_logging(&config.log_filter);
    debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    let store = DatasetStore::from_config(&config);

    if let Commands::Check = cli.command {
        return run_check(&store);
    }

    let data = DashboardData::load(&store, config.olympics_start_date);
    if !data.has_any_data() {
        println!(
            "ℹ️  No data found under {}. Add the Paris 2024 CSV files and try again.",
            config.data_dir.display()
        );
        return Ok(());
    }

    let selection = cli.filters.to_selection();
    match cli.command {
        Commands::Overview { json } => run_overview(&data, &selection, &config, json),
        Commands::Tally { output } => run_tally(&data, &selection, output),
        Commands::Country { code } => run_country(&data, &code),
        Commands::Compare { first, second } => run_compare(&data, &first, &second),
        Commands::Check => Ok(()),
    }
}

fn run_check(store: &DatasetStore) -> Result<()> {
    let availability = store.availability();

    println!("📂 Data directory: {}", store.data_dir().display());
    for (name, exists) in &availability.files {
        println!("  {} {}", if *exists { "✓" } else { "✗" }, name);
    }
    println!("  {} sport result files", availability.results_count);

    if !availability.any_available() {
        println!("\nℹ️  No data available yet.");
    }
    Ok(())
}

fn run_overview(data: &DashboardData, selection: &FilterSelection, config: &DashboardConfig, as_json: bool) -> Result<()> {
    let view = evaluate(data, selection);
    let top = top_countries(&view.tally, config.top_n_countries);
    let athletes = top_athletes(&view.medallists, config.top_n_athletes);
    let distribution = medal_distribution(&view.tally);

    if as_json {
        let report = json!({
            "summary": view.summary_line(data.medals_total.len()),
            "source": view.source,
            "kpis": view.kpis,
            "distribution": distribution,
            "leaders": tally_summary(&view.tally),
            "top_countries": top,
            "top_athletes": athletes,
        });
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize overview")?);
        return Ok(());
    }

    println!("🏅 Paris 2024 Overview");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", view.summary_line(data.medals_total.len()));
    println!();
    println!("  Athletes:  {}", view.kpis.total_athletes);
    println!("  Countries: {}", view.kpis.total_countries);
    println!("  Sports:    {}", view.kpis.total_sports);
    println!("  Medals:    {}", view.kpis.total_medals);
    println!("  Events:    {}", view.kpis.total_events);
    println!(
        "  🥇 {}  🥈 {}  🥉 {}",
        distribution.gold, distribution.silver, distribution.bronze
    );

    println!("\n📊 Top {} countries", top.len());
    for (rank, tally) in top.iter().enumerate() {
        println!(
            "  {:>2}. {:<28} {:>3} {:>3} {:>3}  = {}",
            rank + 1,
            tally.country,
            tally.gold,
            tally.silver,
            tally.bronze,
            tally.total
        );
    }

    if !athletes.is_empty() {
        println!("\n🏃 Top athletes");
        for athlete in &athletes {
            println!(
                "  {:<30} {:<4} {} medals ({} gold)",
                athlete.name, athlete.country_code, athlete.medals, athlete.gold
            );
        }
    }
    Ok(())
}

fn run_tally(data: &DashboardData, selection: &FilterSelection, output: Option<PathBuf>) -> Result<()> {
    let view = evaluate(data, selection);

    match output {
        Some(path) => {
            export_tally(&view.tally, &path)?;
            eprintln!("✓ Wrote {} countries to {}", view.tally.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_tally_csv(&view.tally, &mut handle)?;
            handle.flush()?;
        }
    }
    Ok(())
}

fn run_country(data: &DashboardData, code: &str) -> Result<()> {
    if !is_known_code(code) {
        warn!(code, "country code is not a known NOC code");
    }
    let profile = CountryProfile::build(code, data);

    println!("📌 Following: {} ({})", profile.name, profile.code);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if let Some(tally) = &profile.tally {
        println!(
            "  🥇 {}  🥈 {}  🥉 {}  Total {}",
            tally.gold, tally.silver, tally.bronze, tally.total
        );
    }
    println!("  Sports participated: {}", profile.sports.len());
    println!("  Medallist entries:   {}", profile.medallist_rows);
    println!("  Athletes:            {}", profile.athletes);

    if profile.sports.is_empty() {
        println!("\nℹ️  No participation data found for this country.");
        return Ok(());
    }

    for sport in &profile.sports {
        println!("\n🏅 {}", sport.sport);
        if let Some(medals) = sport.medals {
            println!(
                "  Medals: {} (🥇 {} 🥈 {} 🥉 {})",
                medals.total, medals.gold, medals.silver, medals.bronze
            );
        }
        for participant in &sport.participants {
            println!("  - {} [{}]", participant.name, participant.kind);
        }
        for opponent in &sport.opponents {
            let against = if opponent.opponent_countries.is_empty() {
                "N/A".to_string()
            } else {
                opponent.opponent_countries.join(", ")
            };
            println!("  {} vs {} ({})", opponent.participant_name, against, opponent.stage_code);
        }
    }
    Ok(())
}

fn print_side(side: &CountrySide) {
    println!("{} ({})", side.name, side.code);
    println!(
        "  Medals: {} (🥇 {} 🥈 {} 🥉 {})",
        side.medals.total(),
        side.medals.gold,
        side.medals.silver,
        side.medals.bronze
    );
    println!("  Athletes: {}", side.athletes);
    if let Some(age) = side.average_age {
        println!("  Average age: {:.1}", age);
    }
    for (gender, count) in &side.gender_split {
        println!("  {}: {}", gender, count);
    }
    for (discipline, medals) in &side.top_disciplines {
        println!("  {:<24} {}", discipline, medals);
    }
}

fn run_compare(data: &DashboardData, first: &str, second: &str) -> Result<()> {
    let comparison = compare_countries(first, second, data);

    println!("⚖️  Country comparison");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print_side(&comparison.first);
    println!();
    print_side(&comparison.second);
    println!();

    match comparison.leader() {
        Some(side) => println!("🏆 {} leads", side.name),
        None => println!("🤝 Level on golds and total medals"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_flags_build_selection() {
        let cli = Cli::try_parse_from([
            "olympics-dashboard",
            "overview",
            "--continent",
            "Europe,Asia",
            "--medal",
            "gold",
            "--gender",
            "female",
            "--min-age",
            "20",
        ])
        .unwrap();

        let selection = cli.filters.to_selection();
        assert_eq!(selection.continents.values().map(|v| v.len()), Some(2));
        assert!(selection.narrows_medal_types());
        assert_eq!(selection.gender, Gender::Female);
        assert_eq!(selection.age_range.map(|r| (r.min(), r.max())), Some((20, MAX_AGE)));
    }

    #[test]
    fn test_no_flags_is_unconstrained() {
        let cli = Cli::try_parse_from(["olympics-dashboard", "check"]).unwrap();
        assert!(cli.filters.to_selection().is_unconstrained());
    }
}
