use crate::content::ContentQuery;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "geosearch",
    version,
    about = "Radius and bounding-box search over geo-tagged content",
    long_about = "geosearch loads content items (from a JSON file or randomly seeded), keeps a spatial index of their registered coordinate fields and answers radius / bounds searches against it."
)]
pub struct CliArgs {
    /// 配置文件路径
    #[arg(short, long, default_value = "geosearch.toml")]
    pub config: String,

    /// JSON array of content items to load instead of seeding random ones
    #[arg(long)]
    pub items: Option<PathBuf>,

    /// Random items to seed per registered field (ignored with --items)
    #[arg(long, default_value_t = 1000)]
    pub seed: usize,

    /// Seed for the random generator, for reproducible runs
    #[arg(long)]
    pub rng_seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Log level (overrides config file)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Geojson,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 生成默认配置文件并退出
    GenerateConfig,

    /// Items within a radius (miles) of a point
    Radius {
        field: String,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        miles: f64,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Items inside a bounding box
    Bounds {
        field: String,
        #[arg(allow_negative_numbers = true)]
        min_lng: f64,
        #[arg(allow_negative_numbers = true)]
        min_lat: f64,
        #[arg(allow_negative_numbers = true)]
        max_lng: f64,
        #[arg(allow_negative_numbers = true)]
        max_lat: f64,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Search using query-variable syntax
    Query {
        /// "field,lat,lng,radius"
        #[arg(long, allow_hyphen_values = true)]
        geo_radius: Option<String>,
        /// "field,minLng,minLat,maxLng,maxLat"
        #[arg(long, allow_hyphen_values = true)]
        geo_bounds: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Rebuild the index from stored field values
    Rebuild,

    /// Index statistics
    Stats,
}

/// Content filters applied alongside the geo search.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Restrict to content type (repeatable)
    #[arg(long = "type")]
    pub content_types: Vec<String>,

    /// Case-insensitive title substring
    #[arg(long)]
    pub title: Option<String>,

    /// Maximum number of results
    #[arg(long)]
    pub limit: Option<usize>,
}

impl FilterArgs {
    pub fn to_query(&self) -> ContentQuery {
        ContentQuery {
            content_types: (!self.content_types.is_empty()).then(|| self.content_types.clone()),
            title_contains: self.title.clone(),
            limit: self.limit,
        }
    }
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.items {
            if !path.exists() {
                return Err(format!("Items file '{}' does not exist", path.display()));
            }
        }

        if let Command::Query {
            geo_radius: None,
            geo_bounds: None,
            ..
        } = self.command
        {
            return Err("query needs --geo-radius or --geo-bounds".to_string());
        }

        Ok(())
    }
}
