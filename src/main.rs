use std::{
    fs,
    path::PathBuf,
};

use anyhow::Context;
use clap::{
    Parser,
    Subcommand,
    ValueEnum,
};
use fluencyflow::{
    browse::WordFilter,
    bundle::{
        export_file_name,
        ImportMode,
    },
    core::{
        FamiliarityLevel,
        MinigameTier,
        SystemClock,
        WordRecord,
    },
    minigame::play_link,
    persistence::{
        get_app_data_dir,
        FileStorage,
    },
    settings::Settings,
    Tracker,
};

#[derive(Parser)]
#[command(name = "fluencyflow", about = "Vocabulary flashcard progress tracker", version)]
struct Cli {
    /// Directory holding progress data and settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Word list CSV (defaults to the path in settings.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LevelArg {
    Unknown,
    Explored,
    Known,
    WellKnown,
}

impl From<LevelArg> for FamiliarityLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Unknown => FamiliarityLevel::Unknown,
            LevelArg::Explored => FamiliarityLevel::Explored,
            LevelArg::Known => FamiliarityLevel::Known,
            LevelArg::WellKnown => FamiliarityLevel::WellKnown,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TierArg {
    Easy,
    Medium,
    Hard,
}

impl From<TierArg> for MinigameTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Easy => MinigameTier::Easy,
            TierArg::Medium => MinigameTier::Medium,
            TierArg::Hard => MinigameTier::Hard,
        }
    }
}

#[derive(clap::Args, Clone, Debug, Default)]
struct FilterArgs {
    /// JLPT level, e.g. N5
    #[arg(long)]
    jlpt: Option<String>,
    /// Only words at this familiarity
    #[arg(long, value_enum)]
    familiarity: Option<LevelArg>,
    /// Only favorites
    #[arg(long)]
    favorites: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> WordFilter {
        WordFilter {
            level: self.jlpt.clone(),
            familiarity: self.familiarity.map(Into::into),
            favorites_only: self.favorites,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List word cards
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Set a word's familiarity (key is "original|reading|translation")
    Set {
        key: String,
        #[arg(value_enum)]
        level: LevelArg,
    },

    /// Toggle a word as favorite
    Favorite { key: String },

    /// Record that a word was shown
    Expose { key: String },

    /// Record a minigame clear
    Minigame {
        key: String,
        #[arg(value_enum)]
        tier: TierArg,
    },

    /// Show progress statistics
    Stats,

    /// Show the daily points chart
    Chart {
        /// Scroll the chart by this many days (positive goes back in time)
        #[arg(long, allow_hyphen_values = true)]
        scroll: Option<i64>,
    },

    /// Write all progress to a JSON bundle
    Export {
        /// Output file (defaults to fluencyflow_progress_YYYYMMDD.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Load a JSON bundle
    Import {
        file: PathBuf,
        /// Overwrite local progress instead of merging
        #[arg(long)]
        replace: bool,
    },

    /// Erase all progress, stats and points
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Print the minigame link for the current filter
    PlayLink {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn print_card(word: &WordRecord) {
    let favorite = if word.is_favorite { "★" } else { " " };
    println!(
        "{} {} [{}] {} ({}) - {} | {}",
        favorite,
        word.original,
        word.level,
        word.reading,
        word.romaji,
        word.translation,
        word.familiarity.label()
    );
}

// Export, import and the chart only touch the progress store
fn needs_catalog(command: &Command) -> bool {
    !matches!(
        command,
        Command::Export { .. }
            | Command::Import { .. }
            | Command::Reset { .. }
            | Command::PlayLink { .. }
            | Command::Chart { .. }
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let data_dir = get_app_data_dir(cli.data_dir.as_deref());
    let settings = Settings::load_or_init(&data_dir);
    let storage = FileStorage::open(&data_dir)?;
    let mut tracker = Tracker::open(storage, Box::new(SystemClock))?;

    let catalog_path = cli.catalog.clone().unwrap_or_else(|| settings.catalog_path.clone());
    if needs_catalog(&cli.command) {
        tracker
            .load_catalog_file(&catalog_path)
            .with_context(|| format!("Could not load word list {}", catalog_path.display()))?;
    }

    match cli.command {
        Command::List { filter, page } => {
            let page = tracker.browse(&filter.to_filter(), page, settings.page_size);
            for word in &page.items {
                print_card(word);
            }
            println!("{} ({} words)", page.label(), page.total_items);
            if page.has_prev() {
                println!("Previous: --page {}", page.page - 1);
            }
            if page.has_next() {
                println!("Next: --page {}", page.page + 1);
            }
        }
        Command::Set { key, level } => match tracker.set_familiarity(&key, level.into())? {
            Some(change) => {
                println!("{}: {} -> {}", key, change.previous.label(), change.current.label());
                if change.points_awarded > 0 {
                    println!("+{} points", change.points_awarded);
                }
                println!("Progress Points Today: {}", tracker.today_points());
            }
            None => println!("No word with key {}", key),
        },
        Command::Favorite { key } => match tracker.toggle_favorite(&key)? {
            Some(true) => println!("Added {} to favorites", key),
            Some(false) => println!("Removed {} from favorites", key),
            None => println!("No word with key {}", key),
        },
        Command::Expose { key } => match tracker.mark_exposed(&key)? {
            Some(stamp) => println!("{} first seen {}", key, stamp),
            None => println!("No word with key {}", key),
        },
        Command::Minigame { key, tier } => match tracker.record_minigame(&key, tier.into())? {
            Some(best) => println!("{} best minigame tier: {}", key, best),
            None => println!("No word with key {}", key),
        },
        Command::Stats => {
            let stats = tracker.stats();
            println!("Total Progress");
            println!("{}", stats.summary());
            for (level, counts) in &stats.by_level {
                println!(
                    "{}: {} / {} ({:.1}%) well known {}, known {}, explored {}, unknown {}",
                    level,
                    counts.touched(),
                    counts.total,
                    counts.percent_touched(),
                    counts.well_known,
                    counts.known,
                    counts.explored,
                    counts.unknown
                );
            }
            println!("Favorites: {}", stats.favorites);
            println!("Progress Points Today: {}", stats.today_points);
        }
        Command::Chart { scroll } => {
            if let Some(delta) = scroll {
                tracker.scroll_chart(delta, settings.chart_days, settings.visible_bars)?;
            }
            print!("{}", tracker.render_chart(settings.chart_days, settings.visible_bars));
        }
        Command::Export { out } => {
            let path = out.unwrap_or_else(|| PathBuf::from(export_file_name(tracker.today())));
            fs::write(&path, tracker.export_bundle().to_json()?)?;
            println!("Exported progress to {}", path.display());
        }
        Command::Import { file, replace } => {
            let mode = if replace { ImportMode::Replace } else { ImportMode::Merge };
            let text = fs::read_to_string(&file)?;
            match tracker.import_text(&text, mode) {
                Ok(summary) => {
                    println!(
                        "Import complete ({}, {:?}). All progress and stats restored.",
                        summary.schema, summary.mode
                    );
                }
                Err(e) if e.is_import_error() => {
                    eprintln!("Could not import file. Please use a valid FluencyFlow export. ({})", e);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Reset { yes } => {
            if !yes {
                println!("Reset ALL progress, stats, and points? This cannot be undone. Re-run with --yes.");
                return Ok(());
            }
            tracker.reset()?;
            println!("Progress fully reset.");
        }
        Command::PlayLink { filter } => {
            println!("{}", play_link(&settings.minigame_target, &filter.to_filter()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_only_commands_skip_the_word_list() {
        let import = Cli::parse_from(["fluencyflow", "import", "bundle.json", "--replace"]);
        assert!(!needs_catalog(&import.command));
        let export = Cli::parse_from(["fluencyflow", "export"]);
        assert!(!needs_catalog(&export.command));
        let chart = Cli::parse_from(["fluencyflow", "chart", "--scroll", "-3"]);
        assert!(!needs_catalog(&chart.command));

        let list = Cli::parse_from(["fluencyflow", "list", "--jlpt", "N5"]);
        assert!(needs_catalog(&list.command));
        let set = Cli::parse_from(["fluencyflow", "set", "猫|ねこ|cat", "known"]);
        assert!(needs_catalog(&set.command));
    }
}
