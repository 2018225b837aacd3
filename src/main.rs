use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use deal_hunter::config::{Config, ConfigOverrides};
use deal_hunter::deals::{Deal, DealStatus, ValueParser};
use deal_hunter::outreach::{
    draft_outreach, follow_up_tasks, FollowUpTask, OutreachDraft, TemplateKind,
};
use deal_hunter::output::csv::{analytics_to_csv, deals_to_csv};
use deal_hunter::output::json::render_json;
use deal_hunter::output::table::{
    render_activity_table, render_analytics_table, render_deals_table, render_follow_up_table,
    render_pipeline_table,
};
use deal_hunter::output::{render_export, ExportFormat};
use deal_hunter::pipeline::{pipeline_analytics, PipelineAnalytics, StatusChange};
use deal_hunter::query::{
    is_unset_sentinel, query_with, summarize, AnalyticsSummary, FilterSpec, QueryResult, SortBy,
    SortOrder, TagMatch, ValueBucket, MAX_SCORE, MIN_SCORE,
};
use deal_hunter::server::run_server;
use deal_hunter::source::resolve_source;
use deal_hunter::store::DealStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "deal-hunter",
    about = "Filter, rank and summarize brand-partnership deals"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// sample, store, an http(s) feed URL, or a JSON file path
    #[arg(short, long)]
    source: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// digits or suffix
    #[arg(long)]
    parsing: Option<ValueParser>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct FilterArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// 0-25000, 25000-50000, 50000-100000 or 100000+
    #[arg(long)]
    bucket: Option<ValueBucket>,
    #[arg(long = "min-score")]
    min_score: Option<f64>,
    #[arg(long = "max-score")]
    max_score: Option<f64>,
    #[arg(long)]
    status: Option<DealStatus>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Require every --tag instead of any one of them
    #[arg(long = "all-tags")]
    all_tags: bool,
    #[arg(long)]
    sort: Option<SortBy>,
    #[arg(long)]
    order: Option<SortOrder>,
}

impl FilterArgs {
    fn to_spec(&self, config: &Config) -> FilterSpec {
        FilterSpec {
            search: self.search.clone().unwrap_or_default(),
            category: self
                .category
                .clone()
                .filter(|category| !is_unset_sentinel(category)),
            value_range_bucket: self.bucket,
            min_score: self.min_score.unwrap_or(MIN_SCORE),
            max_score: self.max_score.unwrap_or(MAX_SCORE),
            status: self.status,
            tags: self.tags.clone(),
            tag_match: if self.all_tags {
                TagMatch::All
            } else {
                TagMatch::Any
            },
            sort_by: self.sort.unwrap_or(config.query.sort_by),
            sort_order: self.order.unwrap_or(config.query.sort_order),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Query {
        #[command(flatten)]
        filters: FilterArgs,
    },
    Analytics,
    Pipeline,
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        talent: Option<String>,
    },
    /// Draft a partnership email for one deal
    Outreach {
        deal_id: String,
        /// professional, casual, high-value or quick
        #[arg(long)]
        template: Option<TemplateKind>,
        /// Talent name to pitch instead of the configured one
        #[arg(long)]
        talent: Option<String>,
    },
    /// Next action for every open deal
    Followups,
    Import,
    Status {
        deal_id: String,
        status: DealStatus,
    },
    Activity {
        #[arg(long)]
        deal: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        source: cli.source.clone(),
        value_parsing: cli.parsing,
        db_path: None,
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
        let addr: SocketAddr = config.bind_addr()?;
        return run_server(config, addr).await;
    }

    let options = config.query_options();

    match &cli.command {
        Commands::Query { filters } => {
            let deals = load_deals(&config).await?;
            let spec = filters.to_spec(&config);
            let result = query_with(&deals, &spec, options);
            print_query(&result, cli.output)?;
        }
        Commands::Analytics => {
            let deals = load_deals(&config).await?;
            let summary = summarize(&deals, options.parser);
            print_analytics(&summary, cli.output)?;
        }
        Commands::Pipeline => {
            let deals = load_deals(&config).await?;
            let pipeline = pipeline_analytics(&deals, options.parser);
            print_pipeline(&pipeline, cli.output)?;
        }
        Commands::Export {
            filters,
            format,
            out,
            talent,
        } => {
            let deals = load_deals(&config).await?;
            let result = query_with(&deals, &filters.to_spec(&config), options);
            let mut profile = config.talent.clone();
            if let Some(name) = talent {
                profile.name = name.clone();
            }
            let content =
                render_export(*format, &profile, &result.results, options.parser, Utc::now())?;
            match out {
                Some(path) => {
                    std::fs::write(path, &content)
                        .with_context(|| format!("failed writing export: {}", path.display()))?;
                    info!(
                        "exported {} deals as {format} to {}",
                        result.results.len(),
                        path.display()
                    );
                }
                None => println!("{content}"),
            }
        }
        Commands::Outreach {
            deal_id,
            template,
            talent,
        } => {
            let deals = load_deals(&config).await?;
            let deal = deals
                .iter()
                .find(|deal| &deal.id == deal_id)
                .ok_or_else(|| anyhow!("deal not found: {deal_id}"))?;
            let mut profile = config.talent.clone();
            if let Some(name) = talent {
                profile.name = name.clone();
            }
            let kind = template.unwrap_or(config.outreach.template);
            let draft = draft_outreach(deal, &profile, kind, &config.outreach.sender());
            print_outreach(&draft, cli.output)?;
        }
        Commands::Followups => {
            let deals = load_deals(&config).await?;
            let tasks = follow_up_tasks(&deals, Utc::now().date_naive());
            print_follow_ups(&tasks, cli.output)?;
        }
        Commands::Import => {
            if config.source.default.trim() == "store" {
                return Err(anyhow!("import needs a source other than the store itself"));
            }
            let deals = load_deals(&config).await?;
            let db_path = config.resolved_db_path();
            let store = DealStore::open(&db_path)?;
            let imported = store.upsert_deals(&deals)?;
            println!(
                "Imported {imported} deals into {} ({} stored)",
                db_path.display(),
                store.deal_count()?
            );
        }
        Commands::Status { deal_id, status } => {
            let store = DealStore::open(&config.resolved_db_path())?;
            let Some((deal, change)) = store.update_status(deal_id, *status, Utc::now())? else {
                return Err(anyhow!("deal not found: {deal_id}"));
            };
            print_status_change(&deal, &change, cli.output)?;
        }
        Commands::Activity { deal, limit } => {
            let store = DealStore::open(&config.resolved_db_path())?;
            let changes = store.load_activity(deal.as_deref(), *limit)?;
            print_activity(&changes, cli.output)?;
        }
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

async fn load_deals(config: &Config) -> Result<Vec<Deal>> {
    let source = resolve_source(&config.source.default, config)?;
    let deals = source
        .fetch_deals()
        .await
        .with_context(|| format!("failed loading deals from {} source", source.name()))?;
    info!("loaded {} deals from {} source", deals.len(), source.name());
    Ok(deals)
}

fn print_query(result: &QueryResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", render_deals_table(&result.results));
            println!("{}", render_analytics_table(&result.analytics));
        }
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => println!("{}", deals_to_csv(&result.results)?),
    }
    Ok(())
}

fn print_analytics(summary: &AnalyticsSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_analytics_table(summary)),
        OutputFormat::Json => println!("{}", render_json(summary)?),
        OutputFormat::Csv => println!("{}", analytics_to_csv(summary)?),
    }
    Ok(())
}

fn print_pipeline(pipeline: &PipelineAnalytics, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_pipeline_table(pipeline)),
        OutputFormat::Json => println!("{}", render_json(pipeline)?),
        OutputFormat::Csv => {
            warn!("CSV output for pipeline not implemented, using JSON");
            println!("{}", render_json(pipeline)?);
        }
    }
    Ok(())
}

fn print_outreach(draft: &OutreachDraft, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", draft.to_plain_text()),
        OutputFormat::Json => println!("{}", render_json(draft)?),
        OutputFormat::Csv => {
            warn!("CSV output for outreach not implemented, using JSON");
            println!("{}", render_json(draft)?);
        }
    }
    Ok(())
}

fn print_follow_ups(tasks: &[FollowUpTask], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_follow_up_table(tasks)),
        OutputFormat::Json => println!("{}", render_json(tasks)?),
        OutputFormat::Csv => {
            warn!("CSV output for follow-ups not implemented, using JSON");
            println!("{}", render_json(tasks)?);
        }
    }
    Ok(())
}

fn print_status_change(deal: &Deal, change: &StatusChange, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!(
            "{} ({}) moved {} -> {}",
            deal.brand, deal.id, change.from, change.to
        ),
        OutputFormat::Json => println!("{}", render_json(deal)?),
        OutputFormat::Csv => println!("{}", deals_to_csv(std::slice::from_ref(deal))?),
    }
    Ok(())
}

fn print_activity(changes: &[StatusChange], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_activity_table(changes)),
        OutputFormat::Json => println!("{}", render_json(changes)?),
        OutputFormat::Csv => {
            warn!("CSV output for activity not implemented, using JSON");
            println!("{}", render_json(changes)?);
        }
    }
    Ok(())
}
