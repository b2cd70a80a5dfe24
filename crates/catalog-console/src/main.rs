use clap::{ArgAction, Parser, Subcommand};
use commands::{add, append, delete, list, stats, Console};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "catalog-console")]
#[command(about = "Catalog Console - manage the movie and series catalog")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Configuration file (defaults to config.toml in the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show catalog and user totals
    Stats,

    /// List catalog items
    #[command(long_about = "List catalog items with their type and episode counts. --search keeps only items whose title contains the text, ignoring case.")]
    List {
        /// Case-insensitive title filter
        #[arg(long)]
        search: Option<String>,
    },

    /// Add a movie from flags
    AddMovie {
        #[command(flatten)]
        common: add::CommonArgs,

        /// Download URL
        #[arg(long)]
        download_url: String,

        /// Display the poster in fill mode
        #[arg(long, action = ArgAction::SetTrue)]
        fill: bool,
    },

    /// Add a series from flags
    #[command(long_about = "Add a series. Each --episode is SEASON:EPISODE:TITLE:LINK; consecutive episodes with the same season label form one season, in the order given.")]
    AddSeries {
        #[command(flatten)]
        common: add::CommonArgs,

        /// Episode as SEASON:EPISODE:TITLE:LINK (repeatable)
        #[arg(long = "episode", value_name = "SEASON:EPISODE:TITLE:LINK", required = true)]
        episodes: Vec<String>,
    },

    /// Add a movie or series interactively
    Add,

    /// Delete one or more catalog items
    #[command(long_about = "Delete catalog items by id. More than one id (or --all-matching) runs a bulk delete; deletes that succeed are not rolled back when others fail.")]
    Delete {
        /// Ids to delete
        #[arg(required_unless_present = "all_matching")]
        ids: Vec<String>,

        /// Delete every item whose title matches this search
        #[arg(long, value_name = "SEARCH", conflicts_with = "ids")]
        all_matching: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },

    /// Append an episode to an existing series
    AppendEpisode {
        /// Catalog item id
        id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        season: String,

        #[arg(long)]
        episode: String,

        #[arg(long)]
        download_link: String,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let console = Console::load(cli.config.clone())?;

    logging::init_logging(cli.verbose, cli.quiet, &console.config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Stats => stats::run_stats(&console, &output).await,
        Commands::List { search } => list::run_list(&console, search, &output).await,
        Commands::AddMovie { common, download_url, fill } => {
            add::run_add_movie(&console, common, download_url, fill, &output).await
        }
        Commands::AddSeries { common, episodes } => add::run_add_series(&console, common, episodes, &output).await,
        Commands::Add => add::run_add_interactive(&console, &output).await,
        Commands::Delete { ids, all_matching, yes } => {
            delete::run_delete(&console, ids, all_matching, yes, &output).await
        }
        Commands::AppendEpisode {
            id,
            title,
            season,
            episode,
            download_link,
        } => append::run_append_episode(&console, id, title, season, episode, download_link, &output).await,
    }
}
