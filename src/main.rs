use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use match_schedule_scraper::utils::parse_date_arg;
use match_schedule_scraper::{
    filter_matches, load_matches, output, print_match_list, print_summary, scrape, today_date,
    unique_competitions, unique_teams, MatchFilter, ScrapeConfig, ScrapeError, DEFAULT_OUTPUT_FILE,
    DEFAULT_URL,
};

/// Today's football matches and where to watch them
///
/// Scrapes the schedule page once, keeps the matches dated today and writes
/// them to a JSON file. `list` browses a previously written file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Matches file to write (scrape) or read (list)
    #[arg(short, long, global = true, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Show per-row diagnostics
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the schedule page and save today's matches (default)
    Scrape(ScrapeArgs),
    /// Print matches from the saved file
    List(ListArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Schedule page to fetch
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Treat this DD/MM/YYYY date as today
    #[arg(long, value_parser = parse_date)]
    date: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Case-insensitive text matched against teams and competition
    #[arg(short, long)]
    search: Option<String>,

    /// Exact competition name
    #[arg(short, long)]
    competition: Option<String>,

    /// Exact team name (home or away)
    #[arg(short, long)]
    team: Option<String>,

    /// Print the competition names instead of matches
    #[arg(long, conflicts_with = "teams")]
    competitions: bool,

    /// Print the team names instead of matches
    #[arg(long)]
    teams: bool,
}

fn parse_date(s: &str) -> Result<String, String> {
    parse_date_arg(s).map_err(|e| e.to_string())
}

fn init_logging(debug: bool) {
    let default_level = if debug {
        "match_schedule_scraper=debug"
    } else {
        "match_schedule_scraper=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_scrape(args: ScrapeArgs, output: PathBuf) -> Result<(), ScrapeError> {
    let config = ScrapeConfig {
        url: args.url,
        output,
        today: args.date.unwrap_or_else(today_date),
        ..ScrapeConfig::default()
    };

    let report = scrape(&config).await?;
    print_summary(&report.matches, &report.stats, &report.output);
    Ok(())
}

fn run_list(args: ListArgs, path: PathBuf) {
    let matches = load_matches(&path);

    if args.competitions {
        output::print_names("Competitions", &unique_competitions(&matches));
        return;
    }
    if args.teams {
        output::print_names("Teams", &unique_teams(&matches));
        return;
    }

    let filter = MatchFilter {
        search: args.search,
        competition: args.competition,
        team: args.team,
    };
    print_match_list(&filter_matches(&matches, &filter));
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match cli.command {
        Some(Command::List(args)) => {
            run_list(args, cli.output);
            Ok(())
        }
        Some(Command::Scrape(args)) => run_scrape(args, cli.output).await,
        None => {
            let args = ScrapeArgs {
                url: DEFAULT_URL.to_string(),
                date: None,
            };
            run_scrape(args, cli.output).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = e.kind(), "{}", e);
            ExitCode::FAILURE
        }
    }
}
