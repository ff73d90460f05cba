//! restmap CLI
//!
//! Command-line interface for inspecting the resource hierarchy of an
//! OpenAPI or Swagger document.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use colored::*;
use restmap_common::{Analysis, ParserConfig, ResourceNode, SchemaStrategy};
use restmap_manager::{FindOptions, ResourceManager};
use restmap_parser::SpecAnalyzer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "restmap")]
#[command(version, about = "Derive a navigable hierarchy of REST resources from OpenAPI and Swagger documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Parser configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a document and print its resource tree
    #[command(after_help = "EXAMPLES:\n  \
        # Print the resource tree of a local file\n  \
        restmap parse --spec petstore.yaml\n\n  \
        # Fetch a remote document and dump the analysis as JSON\n  \
        restmap parse --spec https://petstore3.swagger.io/api/v3/openapi.json --output json\n\n  \
        # Merge request bodies into resource schemas\n  \
        restmap parse --spec api.json --strategy operation-aggregate")]
    Parse {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(short, long, default_value = "tree")]
        output: OutputFormat,
    },

    /// Look up one resource by name, dotted path or key
    #[command(group(ArgGroup::new("query").required(true).args(["name", "path", "id"])))]
    #[command(after_help = "EXAMPLES:\n  \
        # Root resources win over nested ones with the same name\n  \
        restmap find --spec library.json --name reviews\n\n  \
        # Walk the tree one name at a time\n  \
        restmap find --spec library.json --path books.notes\n\n  \
        # Exact resource key\n  \
        restmap find --spec library.json --id authors.books --json")]
    Find {
        #[command(flatten)]
        source: SourceArgs,

        /// Resource name
        #[arg(long)]
        name: Option<String>,

        /// Dotted name path (`books.notes`)
        #[arg(long)]
        path: Option<String>,

        /// Resource key
        #[arg(long)]
        id: Option<String>,

        /// Only search root resources
        #[arg(long)]
        shallow: bool,

        /// Plain depth-first search instead of top-level first
        #[arg(long, conflicts_with = "shallow")]
        depth_first: bool,

        /// Print the resource as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print document and resource counters
    Stats {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the counters as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Document location: file path or http(s) URL
    #[arg(short, long)]
    spec: String,

    /// Schema extraction strategy (overrides the config file)
    #[arg(long)]
    strategy: Option<StrategyArg>,

    /// HTTP timeout in seconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Indented resource tree
    Tree,
    /// Full analysis as JSON
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Fields from success responses, request bodies only as a fallback
    ResponseEnvelope,
    /// Fields from responses and request bodies
    OperationAggregate,
}

impl From<StrategyArg> for SchemaStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ResponseEnvelope => SchemaStrategy::ResponseEnvelope,
            StrategyArg::OperationAggregate => SchemaStrategy::OperationAggregate,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Parse { source, output } => {
            let analysis = load(&source, cli.config.as_deref(), output.is_tree()).await?;
            match output {
                OutputFormat::Tree => print_tree(&analysis, cli.verbose),
                OutputFormat::Json => print_json(analysis.as_ref())?,
            }
        }
        Commands::Find {
            source,
            name,
            path,
            id,
            shallow,
            depth_first,
            json,
        } => {
            let analysis = load(&source, cli.config.as_deref(), !json).await?;
            let query = Query {
                name: name.as_deref(),
                path: path.as_deref(),
                id: id.as_deref(),
                options: FindOptions {
                    prefer_top_level: !depth_first,
                    include_sub_resources: !shallow,
                },
            };
            find_command(&analysis, query, json)?;
        }
        Commands::Stats { source, json } => {
            let analysis = load(&source, cli.config.as_deref(), !json).await?;
            stats_command(&analysis, json)?;
        }
    }

    Ok(())
}

impl OutputFormat {
    fn is_tree(&self) -> bool {
        matches!(self, OutputFormat::Tree)
    }
}

/// Logs go to stderr so stdout stays clean for JSON output
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, source: &SourceArgs) -> Result<ParserConfig> {
    let mut config = match path {
        Some(path) => ParserConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ParserConfig::default(),
    };

    if let Some(strategy) = source.strategy {
        config.schema_strategy = strategy.into();
    }
    if let Some(timeout) = source.timeout {
        config.fetch_timeout_secs = timeout;
    }

    Ok(config)
}

async fn load(
    source: &SourceArgs,
    config_path: Option<&Path>,
    announce: bool,
) -> Result<Arc<Analysis>> {
    let config = load_config(config_path, source)?;
    debug!(?config, "parser configuration");

    if announce {
        println!("{} Analysing: {}", "→".cyan(), source.spec);
    }

    let analyzer = SpecAnalyzer::new(config).context("Failed to create document loader")?;
    analyzer
        .parse(&source.spec)
        .await
        .with_context(|| format!("Failed to analyse {}", source.spec))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{}", json);
    Ok(())
}

fn print_tree(analysis: &Analysis, verbose: bool) {
    let info = &analysis.info;
    println!("\n{}", "✓ Analysis complete!".green().bold());
    println!("\n{}", "Document:".bold());
    println!("  Title: {}", info.title.yellow());
    println!("  Version: {}", info.version.yellow());
    println!("  Dialect: {}", info.dialect);
    if !info.base_url.is_empty() {
        println!("  Base URL: {}", info.base_url);
    }

    println!("\n{}", "Resources:".bold());
    for node in &analysis.resources {
        print_node(node, 1, verbose);
    }

    println!(
        "\n{} paths, {} operations, {} resources ({} RESTful)",
        analysis.stats.total_paths,
        analysis.stats.total_operations,
        analysis.stats.total_resources,
        analysis.stats.restful_resources
    );
}

fn print_node(node: &ResourceNode, indent: usize, verbose: bool) {
    let pad = "  ".repeat(indent);
    let methods: Vec<&str> = node.methods.iter().map(|m| m.as_str()).collect();
    println!(
        "{}• {} {} [{}] {}",
        pad,
        node.name.cyan(),
        node.path.dimmed(),
        methods.join(" "),
        node.classification.to_string().yellow()
    );

    if verbose {
        println!("{}    Key: {}", pad, node.key);
        println!("{}    Fields: {}", pad, node.schema.len());
        if let Some(ref id_param) = node.id_param {
            println!("{}    Id parameter: {}", pad, id_param);
        }
    }

    for child in &node.sub_resources {
        print_node(child, indent + 1, verbose);
    }
}

struct Query<'q> {
    name: Option<&'q str>,
    path: Option<&'q str>,
    id: Option<&'q str>,
    options: FindOptions,
}

fn find_command(analysis: &Analysis, query: Query<'_>, json: bool) -> Result<()> {
    let manager = ResourceManager::from_analysis(analysis);

    let found = match (query.name, query.path, query.id) {
        (Some(name), _, _) => manager.find_by_name(name, query.options),
        (_, Some(path), _) => manager.find_by_path(path),
        (_, _, Some(id)) => manager.find_by_id(id),
        _ => None,
    };

    let Some(node) = found else {
        anyhow::bail!("No matching resource found");
    };

    if json {
        return print_json(node);
    }

    println!("\n{} {}", "✓".green(), node.display_name.bold());
    println!("  Key: {}", node.key.yellow());
    println!("  Path: {}", node.path);
    if node.paths.len() > 1 {
        println!("  All paths: {}", node.paths.join(", "));
    }
    if let Some(hierarchy) = query.name.and_then(|name| manager.resource_hierarchy(name)) {
        if hierarchy.resource.key == node.key {
            println!("  Hierarchy: {} (depth {})", hierarchy.path.join(" → "), hierarchy.depth);
        }
    }
    println!(
        "  Methods: {}",
        node.methods
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Classification: {}", node.classification);
    println!("  RESTful: {}", node.is_restful);
    if let Some(ref description) = node.description {
        println!("  Description: {}", description);
    }

    if !node.schema.is_empty() {
        println!("\n{}", "Fields:".bold());
        for field in &node.schema {
            let marker = if field.required { "*" } else { " " };
            println!("  {}{} {}", marker, field.name.cyan(), field.field_type);
        }
    }

    let subs = manager.all_sub_resources(node);
    if !subs.is_empty() {
        println!("\n{}", "Sub-resources:".bold());
        for sub in subs {
            println!("  • {}", sub.key);
        }
    }

    Ok(())
}

fn stats_command(analysis: &Analysis, json: bool) -> Result<()> {
    let manager = ResourceManager::from_analysis(analysis);
    let tree = manager.stats();

    if json {
        return print_json(&serde_json::json!({
            "document": analysis.stats,
            "tree": tree,
        }));
    }

    println!("\n{}", "Statistics:".bold());
    println!("  Paths: {}", analysis.stats.total_paths);
    println!("  Operations: {}", analysis.stats.total_operations);
    println!("  Resources: {}", tree.total);
    println!("  Top-level resources: {}", tree.top_level);
    println!("  With sub-resources: {}", tree.with_sub_resources);
    println!("  RESTful resources: {}", tree.restful);
    if !analysis.stats.tags.is_empty() {
        println!("  Tags: {}", analysis.stats.tags.join(", "));
    }

    Ok(())
}
