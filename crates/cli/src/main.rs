use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{AttractionId, Dataset, UserId};
use engine::RecommendationSession;
use model::{DuplicatePolicy, Solver, SvdConfig, DEFAULT_RANK, DEFAULT_SEED};
use pipeline::{AttractionRecommendation, RecommendError, Recommender, DEFAULT_TOP_N};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Attraction Recs - Tourism Recommendation System
#[derive(Parser)]
#[command(name = "attraction-recs")]
#[command(about = "Tourist attraction recommendations using truncated SVD", long_about = None)]
struct Cli {
    /// Directory containing Transaction.csv and Item.csv
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// How repeated ratings of the same attraction by the same user are combined
    #[arg(long, value_enum, default_value_t = Duplicates::Mean)]
    duplicates: Duplicates,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model and recommend attractions for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        limit: usize,

        #[command(flatten)]
        train: TrainArgs,

        /// Drop attractions whose predicted score is below this value
        #[arg(long)]
        min_score: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show a user's visited attractions and ratings
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Search for attractions by name
    Search {
        /// Name to search for (case-insensitive substring match)
        #[arg(long)]
        name: String,
    },

    /// Show dataset and user-item matrix statistics
    Stats,

    /// Interactive session: train once, then ask for recommendations
    Shell {
        #[command(flatten)]
        train: TrainArgs,
    },
}

/// Factorization settings shared by `recommend` and `shell`
#[derive(Args, Clone)]
struct TrainArgs {
    /// Number of latent components
    #[arg(long, default_value_t = DEFAULT_RANK)]
    rank: usize,

    /// Seed for the randomized solver
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// SVD solver
    #[arg(long, value_enum, default_value_t = SolverArg::Randomized)]
    solver: SolverArg,
}

impl TrainArgs {
    fn config(&self) -> SvdConfig {
        SvdConfig::new(self.rank)
            .with_seed(self.seed)
            .with_solver(self.solver.into())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Duplicates {
    Mean,
    Last,
    Reject,
}

impl From<Duplicates> for DuplicatePolicy {
    fn from(value: Duplicates) -> Self {
        match value {
            Duplicates::Mean => DuplicatePolicy::Mean,
            Duplicates::Last => DuplicatePolicy::Last,
            Duplicates::Reject => DuplicatePolicy::Reject,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SolverArg {
    Randomized,
    Exact,
}

impl From<SolverArg> for Solver {
    fn from(value: SolverArg) -> Self {
        match value {
            SolverArg::Randomized => Solver::Randomized,
            SolverArg::Exact => Solver::Exact,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading tourism dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let dataset = Arc::new(
        Dataset::load_from_files(&cli.data_dir).context("Failed to load tourism dataset")?,
    );
    println!("{} Data loaded successfully in {:?}", "✓".green(), start.elapsed());

    let session = RecommendationSession::new(dataset, cli.duplicates.into())?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            train,
            min_score,
            format,
        } => handle_recommend(session, user_id, limit, &train, min_score, format)?,
        Commands::User { user_id } => handle_user(&session, user_id)?,
        Commands::Search { name } => handle_search(session.dataset(), &name)?,
        Commands::Stats => handle_stats(&session)?,
        Commands::Shell { train } => handle_shell(&session, &train)?,
    }

    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    session: RecommendationSession,
    user_id: UserId,
    limit: usize,
    train: &TrainArgs,
    min_score: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let session = match min_score {
        Some(min_score) => session.with_recommender(Recommender::new().with_min_score(min_score)),
        None => session,
    };

    let config = train.config();
    println!("Training SVD model (rank {}, {:?})...", config.rank, config.solver);
    session.train(&config)?;
    println!("{} Model trained successfully!", "✓".green());

    match session.recommend(user_id, limit)? {
        None => println!("{}", format!("User {} not found.", user_id).yellow()),
        Some(recs) if recs.is_empty() => {
            println!("{}", "No recommendations available for this user.".yellow())
        }
        Some(recs) => print_recommendations(&recs, format)?,
    }
    Ok(())
}

/// Handle the 'user' command
fn handle_user(session: &RecommendationSession, user_id: UserId) -> Result<()> {
    let dataset = session.dataset();
    let visits = dataset.get_user_transactions(user_id);
    if visits.is_empty() {
        return Err(anyhow!("User {} not found", user_id));
    }

    println!("{}", format!("User ID: {}", user_id).bold().blue());

    let avg_rating = visits.iter().map(|t| t.rating).sum::<f64>() / visits.len() as f64;
    println!("{}Number of visits: {}", "• ".cyan(), visits.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), avg_rating);

    // Highest rated first
    let mut sorted: Vec<_> = visits.iter().collect();
    sorted.sort_by(|a, b| b.rating.total_cmp(&a.rating));

    println!("Visited attractions:");
    for visit in sorted {
        println!(
            "  - {} (Rating: {})",
            display_name(dataset, visit.attraction_id),
            visit.rating
        );
    }

    // What the model sees: one cell per attraction after duplicate handling
    if let Some(row) = session.matrix().user_row(user_id) {
        let rated = row.iter().filter(|(_, rating)| *rating > 0.0).count();
        println!(
            "{}Rated cells in user-item matrix: {} of {}",
            "• ".green(),
            rated,
            row.len()
        );
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(dataset: &Dataset, name: &str) -> Result<()> {
    let query = name.to_lowercase();

    // (exact match first, popularity, id, name, avg rating, visits)
    let mut matches: Vec<(u8, f64, AttractionId, &str, f64, u32)> = dataset
        .items()
        .filter_map(|item| {
            let lower = item.name.to_lowercase();
            let relevance = if lower == query {
                0
            } else if lower.contains(&query) {
                1
            } else {
                return None;
            };
            let stats = dataset.get_attraction_stats(item.attraction_id);
            Some((
                relevance,
                stats.map(|s| s.popularity_score).unwrap_or(0.0),
                item.attraction_id,
                item.name.as_str(),
                stats.map(|s| s.avg_rating).unwrap_or(0.0),
                stats.map(|s| s.visit_count).unwrap_or(0),
            ))
        })
        .collect();

    matches.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| b.1.total_cmp(&a.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    println!("{}", format!("Search results for '{}':", name).bold().blue());
    if matches.is_empty() {
        println!("  (no matching attractions)");
    }
    for (_, _, id, attraction, avg_rating, visits) in matches.iter().take(20) {
        println!(
            "{}: {} avg {:.2} ({} visits)",
            id, attraction, avg_rating, visits
        );
    }
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(session: &RecommendationSession) -> Result<()> {
    let dataset = session.dataset();
    let matrix = session.matrix();
    let (users, items, transactions) = dataset.counts();
    let (rows, cols) = matrix.shape();

    println!("{}", "Dataset".bold().blue());
    println!("{}Users: {}", "• ".cyan(), users);
    println!("{}Attractions (item table): {}", "• ".cyan(), items);
    println!("{}Transactions: {}", "• ".cyan(), transactions);
    println!(
        "{}Attractions without an item row: {}",
        "• ".cyan(),
        dataset.unknown_attractions().len()
    );

    println!("{}", "User–Item Matrix".bold().blue());
    println!("{}Shape: ({}, {})", "• ".green(), rows, cols);
    println!("{}Density: {:.4}", "• ".green(), matrix.density());
    match matrix.user_id_range() {
        Some((min, max)) => println!("{}User IDs: {}..={}", "• ".green(), min, max),
        None => println!("{}User IDs: (none)", "• ".green()),
    }
    Ok(())
}

/// Handle the 'shell' command
///
/// Nothing is recommended until `train` has been run in this session.
fn handle_shell(session: &RecommendationSession, train: &TrainArgs) -> Result<()> {
    let base_config = train.config();
    if let Some((min, max)) = session.matrix().user_id_range() {
        println!("Users {}..={} available.", min, max);
    }
    println!("{}", "Model not trained yet. Type 'train' to train it.".cyan());
    print_shell_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", ">".bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut words = line.split_whitespace();

        match words.next() {
            None => continue,
            Some("quit") | Some("exit") => break,
            Some("help") => print_shell_help(),
            Some("stats") => handle_stats(session)?,
            Some("train") => {
                let config = match words.next().map(str::parse::<usize>) {
                    None => base_config.clone(),
                    Some(Ok(rank)) => base_config.clone().with_rank(rank),
                    Some(Err(_)) => {
                        println!("{}", "Usage: train [rank]".yellow());
                        continue;
                    }
                };
                println!("Training model, please wait...");
                match session.train(&config) {
                    Ok(_) => println!("{} Model trained successfully!", "✓".green()),
                    Err(err) => println!("{} {:#}", "✗".red(), err),
                }
            }
            Some("recommend") => {
                let user_id = words.next().map(str::parse::<UserId>);
                let limit = words.next().map(str::parse::<usize>);
                let (user_id, limit) = match (user_id, limit) {
                    (Some(Ok(user_id)), None) => (user_id, DEFAULT_TOP_N),
                    (Some(Ok(user_id)), Some(Ok(limit))) => (user_id, limit),
                    _ => {
                        println!("{}", "Usage: recommend <user-id> [limit]".yellow());
                        continue;
                    }
                };
                shell_recommend(session, user_id, limit)?;
            }
            Some(other) => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }
    Ok(())
}

fn shell_recommend(session: &RecommendationSession, user_id: UserId, limit: usize) -> Result<()> {
    match session.recommend(user_id, limit) {
        Ok(Some(recs)) if !recs.is_empty() => print_recommendations(&recs, OutputFormat::Table)?,
        Ok(_) => println!("{}", "No recommendations available for this user.".yellow()),
        Err(err) => match err.downcast_ref::<RecommendError>() {
            Some(RecommendError::ModelNotTrained) => {
                println!("{}", "⚠️  Please train the model first.".yellow())
            }
            _ => return Err(err),
        },
    }
    Ok(())
}

fn print_shell_help() {
    println!("Commands:");
    println!("  train [rank]               train the SVD model");
    println!("  recommend <user-id> [n]    top-n attractions for a user");
    println!("  stats                      dataset and matrix statistics");
    println!("  help                       show this help");
    println!("  quit                       leave the shell");
}

fn display_name(dataset: &Dataset, id: AttractionId) -> String {
    dataset
        .item_name(id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Attraction {}", id))
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[AttractionRecommendation], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(recommendations)?);
        }
        OutputFormat::Table => {
            println!("{}", "Top Recommended Attractions".bold().green());
            for (rank, rec) in recommendations.iter().enumerate() {
                let name = match &rec.name {
                    Some(name) => name.as_str().normal(),
                    None => "(no item row)".dimmed(),
                };
                println!(
                    "{}. {} [{}] - Predicted Score: {:.4}",
                    (rank + 1).to_string().green(),
                    name,
                    rec.attraction_id,
                    rec.score
                );
            }
        }
    }
    Ok(())
}
