use geosearch::client::{CliArgs, Command, OutputFormat, OutputFormatter};
use geosearch::config::LoggingConfig;
use geosearch::content::seed::seed_random;
use geosearch::{
    AnnotatedResult, ContentItem, GeoSearch, GeoSearchConfig, GeoSearchError, IndexStore,
    MemoryRepository, Result, SearchRequest,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse_args();
    if let Err(e) = args.validate() {
        eprintln!("{}", OutputFormatter::format_error(&e));
        std::process::exit(2);
    }

    if let Err(e) = run(args).await {
        eprintln!("{}", OutputFormatter::format_error(&e.to_string()));
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<()> {
    // 生成默认配置文件
    if let Command::GenerateConfig = args.command {
        let config = GeoSearchConfig::default();
        config.save_to_file(&args.config)?;
        println!("✅ Generated default configuration: {}", args.config);
        return Ok(());
    }

    let mut config = GeoSearchConfig::from_file(&args.config)?;
    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }
    config.validate()?;
    init_logging(&config.logging)?;

    info!("📦 geosearch {}", env!("CARGO_PKG_VERSION"));
    if args.format == OutputFormat::Table {
        config.print_summary();
    }

    let repo = Arc::new(MemoryRepository::new());
    let store = Arc::new(IndexStore::new(config.index.max_children));
    let geo = GeoSearch::new(repo.clone(), Arc::new(config.registry()), store);
    repo.subscribe(geo.synchronizer());

    load_content(&args, &config, &repo).await?;

    match &args.command {
        Command::GenerateConfig => {}
        Command::Radius {
            field,
            lat,
            lng,
            miles,
            filter,
        } => {
            let request = SearchRequest::radius(field.clone(), *lat, *lng, *miles);
            let results = geo.search_with(&request, &filter.to_query()).await?;
            print_results(&results, &request, args.format)?;
        }
        Command::Bounds {
            field,
            min_lng,
            min_lat,
            max_lng,
            max_lat,
            filter,
        } => {
            let request = SearchRequest::bounds(field.clone(), *min_lng, *min_lat, *max_lng, *max_lat);
            let results = geo.search_with(&request, &filter.to_query()).await?;
            print_results(&results, &request, args.format)?;
        }
        Command::Query {
            geo_radius,
            geo_bounds,
            filter,
        } => {
            let request = SearchRequest::from_query_vars(geo_radius.as_deref(), geo_bounds.as_deref())?
                .ok_or_else(|| GeoSearchError::validation("no geo query variable given"))?;
            let results = geo.search_with(&request, &filter.to_query()).await?;
            print_results(&results, &request, args.format)?;
        }
        Command::Rebuild => {
            let stats = geo.trigger_rebuild().await?;
            match args.format {
                OutputFormat::Table => println!("{}", OutputFormatter::format_rebuild(&stats)),
                _ => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
        Command::Stats => {
            let stats = geo.store().stats().await;
            match args.format {
                OutputFormat::Table => println!("{}", OutputFormatter::format_stats(&stats)),
                _ => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
    }

    Ok(())
}

/// Fill the repository from `--items`, or seed random items for every configured field.
async fn load_content(args: &CliArgs, config: &GeoSearchConfig, repo: &MemoryRepository) -> Result<()> {
    if let Some(path) = &args.items {
        let raw = std::fs::read_to_string(path)?;
        let items: Vec<ContentItem> = serde_json::from_str(&raw)?;
        let count = items.len();
        for item in items {
            repo.import_item(item).await?;
        }
        info!("📖 Loaded {} items from {}", count, path.display());
        return Ok(());
    }

    let mut rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    for spec in &config.fields {
        seed_random(repo, &spec.content_type, &spec.field_name, args.seed, &mut rng).await?;
    }
    Ok(())
}

fn print_results(results: &[AnnotatedResult], request: &SearchRequest, format: OutputFormat) -> Result<()> {
    let field_name = request.field_name();
    match format {
        OutputFormat::Table => {
            println!("{}", OutputFormatter::format_results(results, field_name));
        }
        OutputFormat::Json => println!("{}", OutputFormatter::results_json(results)?),
        OutputFormat::Geojson => {
            let search_box = request.validate()?.bounding_box();
            println!(
                "{}",
                OutputFormatter::results_geojson(results, field_name, Some(&search_box))?
            )
        }
    }
    Ok(())
}

/// 初始化日志系统
fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = match config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    match (config.output.as_str(), &config.log_file) {
        ("file", Some(log_file)) => {
            // 确保日志目录存在
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Arc::new(file))
                        .with_ansi(false)
                        .with_target(false),
                )
                .with(tracing_subscriber::filter::LevelFilter::from_level(filter))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .with(tracing_subscriber::filter::LevelFilter::from_level(filter))
                .init();
        }
    }

    Ok(())
}
