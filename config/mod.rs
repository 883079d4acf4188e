use crate::error::GeoSearchError;
use crate::registry::{FieldSpec, StaticRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// geosearch 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoSearchConfig {
    /// 索引配置
    pub index: IndexConfig,

    /// 日志配置
    pub logging: LoggingConfig,

    /// 已注册的地理字段
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// 索引配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// R-tree 最大子节点数
    #[serde(default = "default_max_children")]
    pub max_children: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别：trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 日志输出：stdout, file
    #[serde(default = "default_log_output")]
    pub output: String,

    /// 日志文件路径（当 output = file 时）
    pub log_file: Option<PathBuf>,
}

fn default_max_children() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_output() -> String {
    "stdout".to_string()
}

impl Default for GeoSearchConfig {
    fn default() -> Self {
        Self {
            index: IndexConfig {
                max_children: default_max_children(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                output: default_log_output(),
                log_file: None,
            },
            fields: vec![FieldSpec::new("post", "location")],
        }
    }
}

impl GeoSearchConfig {
    /// 从文件加载配置
    ///
    /// 配置加载顺序（优先级从低到高）：
    /// 1. 默认配置（内嵌的 default.toml）
    /// 2. 用户配置文件（可选）
    /// 3. 环境变量（GEOSEARCH__ 前缀，使用双下划线分隔嵌套）
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use geosearch::config::GeoSearchConfig;
    ///
    /// let config = GeoSearchConfig::from_file("geosearch.toml").unwrap();
    /// ```
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("default.toml"),
                config::FileFormat::Toml,
            ))
            // 用户配置不存在时不报错
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("GEOSEARCH").separator("__"))
            .build()
            .map_err(|e| GeoSearchError::Config(format!("Failed to load config: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| GeoSearchError::Config(format!("Failed to parse config: {}", e)))
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| GeoSearchError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> crate::Result<()> {
        if self.index.max_children < 4 {
            return Err(GeoSearchError::Config(format!(
                "index.max_children must be at least 4, got {}",
                self.index.max_children
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(GeoSearchError::Config(format!(
                    "Invalid log level: '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.output.as_str() {
            "stdout" => {}
            "file" if self.logging.log_file.is_none() => {
                return Err(GeoSearchError::Config(
                    "Log output is 'file' but log_file path is not specified".to_string(),
                ))
            }
            "file" => {}
            other => {
                return Err(GeoSearchError::Config(format!(
                    "Invalid log output: '{}'. Must be one of: stdout, file",
                    other
                )))
            }
        }

        let mut seen = HashSet::new();
        for spec in &self.fields {
            if spec.content_type.trim().is_empty() || spec.field_name.trim().is_empty() {
                return Err(GeoSearchError::Config(format!(
                    "Field entry '{}' has an empty content type or field name",
                    spec
                )));
            }
            if !seen.insert(spec) {
                return Err(GeoSearchError::Config(format!("Field '{}' is registered twice", spec)));
            }
        }

        Ok(())
    }

    /// Registry snapshot of the configured fields.
    pub fn registry(&self) -> StaticRegistry {
        StaticRegistry::new(self.fields.clone())
    }

    /// 打印配置摘要
    pub fn print_summary(&self) {
        println!("📋 geosearch Configuration:");
        println!("   Max Children: {}", self.index.max_children);
        println!();
        println!("   Log Level:   {}", self.logging.level);
        println!("   Log Output:  {}", self.logging.output);
        if let Some(ref log_file) = self.logging.log_file {
            println!("   Log File:    {}", log_file.display());
        }
        println!();
        if self.fields.is_empty() {
            println!("   Fields:      (none)");
        }
        for spec in &self.fields {
            println!("   Field:       {}", spec);
        }
        println!();
    }
}
