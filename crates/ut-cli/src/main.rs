//! URI tester CLI
//!
//! Compiles filter lists, checks single requests against them and manages
//! the subscription cache of a data directory.

mod bench;
mod lists;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use ut_core::{DecisionCache, MatchStats, Matcher, ResourceType};
use ut_tester::subscriptions::{read_filters, remove_cache_files, write_filters};
use ut_tester::{HttpFileProvider, UriTester, UriTesterConfig};

#[derive(Parser)]
#[command(name = "uri-tester")]
#[command(about = "Adblock filter list compiler and URI tester")]
struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile filter lists and print statistics
    Compile {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a request would be blocked
    Check {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Request URL
        #[arg(short, long)]
        url: String,

        /// URL of the page making the request
        #[arg(short, long)]
        page: Option<String>,

        /// Resource type (script, image, stylesheet, xhr, ...)
        #[arg(short = 't', long = "type", default_value = "other")]
        resource_type: String,
    },

    /// Show or replace the subscribed filter lists
    Filters {
        /// Data directory, overrides the config file
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        #[command(subcommand)]
        action: Option<FiltersAction>,
    },

    /// Fetch stale subscriptions and compile them
    Update {
        /// Data directory, overrides the config file
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Drop every cached list and fetch all of them again
        #[arg(short, long)]
        reload: bool,
    },

    /// Time request matching against compiled lists
    Bench {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Passes over the request set
        #[arg(long, default_value_t = 1000)]
        iterations: usize,

        /// File with one request URL per line
        #[arg(long)]
        urls: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum FiltersAction {
    /// Print the subscriptions
    List,
    /// Replace the subscriptions
    Set {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Compile { input, json } => cmd_compile(&config, &input, json),
        Commands::Check {
            input,
            url,
            page,
            resource_type,
        } => cmd_check(&config, &input, &url, page.as_deref(), &resource_type),
        Commands::Filters { data_dir, action } => {
            cmd_filters(with_data_dir(config, data_dir), action.unwrap_or(FiltersAction::List))
        }
        Commands::Update { data_dir, reload } => cmd_update(with_data_dir(config, data_dir), reload),
        Commands::Bench {
            input,
            iterations,
            urls,
        } => cmd_bench(&config, &input, iterations, urls),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<UriTesterConfig, String> {
    match path {
        Some(path) => UriTesterConfig::from_file(path).map_err(|e| e.to_string()),
        None => Ok(UriTesterConfig::default()),
    }
}

fn with_data_dir(mut config: UriTesterConfig, data_dir: Option<PathBuf>) -> UriTesterConfig {
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    config
}

fn cmd_compile(config: &UriTesterConfig, inputs: &[String], json: bool) -> Result<(), String> {
    let compiled = lists::compile_lists(inputs, !json, config.max_line_len)?;
    let report = compiled.report(inputs.len());

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize stats: {}", e))?;
        println!("{text}");
        return Ok(());
    }

    println!("Compiled {} filter lists", report.lists);
    println!("  Lines:         {}", report.lines);
    println!("  Rules:         {} ({} shadowed)", report.rules, report.shadowed);
    println!("  Skipped:       {}", report.skipped);
    println!("  Invalid:       {} ({} too long)", report.invalid, report.too_long);
    println!("  Signatures:    {}", report.signatures);
    println!("  Full patterns: {}", report.full_patterns);
    println!("  Hiding:        {} generic, {} domains", report.hider_generic, report.hider_domains);
    println!("  Time:          {:.1}ms", report.total_ms);

    Ok(())
}

fn cmd_check(
    config: &UriTesterConfig,
    inputs: &[String],
    url: &str,
    page: Option<&str>,
    resource_type: &str,
) -> Result<(), String> {
    let compiled = lists::compile_lists(inputs, false, config.max_line_len)?;
    let resource_type = ResourceType::from_name(resource_type);

    let mut cache = DecisionCache::new();
    let mut stats = MatchStats::default();
    let blocked = Matcher::new(&compiled.index, &mut cache, &mut stats)
        .should_block(url, page, resource_type);

    println!("{} {} ({})", if blocked { "BLOCK" } else { "ALLOW" }, url, resource_type.name());
    Ok(())
}

fn cmd_filters(config: UriTesterConfig, action: FiltersAction) -> Result<(), String> {
    let path = config.filters_list_path();

    match action {
        FiltersAction::List => {
            let (filters, source) = match read_filters(&path)
                .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?
            {
                Some(filters) => (filters, "subscribed"),
                None => (config.default_filters.clone(), "default"),
            };
            println!("{} filter list(s) ({})", filters.len(), source);
            for url in filters {
                println!("  {url}");
            }
        }
        FiltersAction::Set { urls } => {
            let dir = config.adblock_dir();
            std::fs::create_dir_all(&dir)
                .map_err(|e| format!("Failed to create '{}': {}", dir.display(), e))?;
            write_filters(&path, &urls)
                .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
            println!("Saved {} filter list(s) to '{}'", urls.len(), path.display());
        }
    }

    Ok(())
}

fn cmd_update(config: UriTesterConfig, reload: bool) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;
    let (provider, mut completions) =
        HttpFileProvider::new(runtime.handle().clone()).map_err(|e| e.to_string())?;

    // With every cached list gone the tester fetches all sources once.
    if reload {
        remove_cache_files(&config.adblock_dir());
    }
    let mut tester = UriTester::new(config, provider).map_err(|e| e.to_string())?;

    while tester.pending_fetches() > 0 {
        let completion = match runtime.block_on(completions.recv()) {
            Some(completion) => completion,
            None => break,
        };
        info!(
            "{} {}",
            if completion.success { "fetched" } else { "failed" },
            completion.request.source_url
        );
        tester.complete_fetch(&completion);
    }

    let load = tester.load_stats();
    let index = tester.index_stats();
    println!("Loaded {} filter list(s), generation {}", tester.get_filters().len(), tester.generation());
    println!("  Lines:         {}", load.lines);
    println!("  Rules:         {} ({} shadowed)", load.rules, load.shadowed);
    println!("  Signatures:    {}", index.signatures);
    println!("  Full patterns: {}", index.full_patterns);

    Ok(())
}

fn cmd_bench(
    config: &UriTesterConfig,
    inputs: &[String],
    iterations: usize,
    urls: Option<PathBuf>,
) -> Result<(), String> {
    let compiled = lists::compile_lists(inputs, false, config.max_line_len)?;

    let urls = match urls {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    let result = bench::run(&compiled, &bench::BenchOptions { iterations, urls });

    println!("Compiled {} rules in {:.1}ms", compiled.stats.rules, compiled.total_ms);
    println!("  Queries:       {} ({} blocked)", result.queries, result.blocked);
    println!("  Cold:          {:.0} ns/op", result.cold_ns_per_op);
    println!("  Cached:        {:.0} ns/op", result.cached_ns_per_op);
    println!("  Regex evals:   {}", result.stats.regex_evaluations);

    Ok(())
}
