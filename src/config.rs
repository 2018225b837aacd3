use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::deals::{TalentProfile, ValueParser};
use crate::outreach::{Sender, TemplateKind};
use crate::query::{QueryOptions, SortBy, SortOrder};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub talent: TalentProfile,
    #[serde(default)]
    pub outreach: OutreachConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// `sample`, `store`, an `http(s)://` feed, or a JSON file path.
    #[serde(default = "default_source")]
    pub default: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryConfig {
    #[serde(default)]
    pub value_parsing: ValueParser,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachConfig {
    #[serde(default)]
    pub template: TemplateKind,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default = "default_sender_title")]
    pub sender_title: String,
    #[serde(default = "default_company_name")]
    pub company_name: String,
}

impl OutreachConfig {
    pub fn sender(&self) -> Sender {
        Sender {
            name: self.sender_name.clone(),
            title: self.sender_title.clone(),
            company: self.company_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<String>,
    pub value_parsing: Option<ValueParser>,
    pub db_path: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/deal-hunter/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(source) = overrides.source {
            self.source.default = source;
        }
        if let Some(value_parsing) = overrides.value_parsing {
            self.query.value_parsing = value_parsing;
        }
        if let Some(db_path) = overrides.db_path {
            self.storage.db_path = db_path;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            parser: self.query.value_parsing,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid server address: {}:{}",
                    self.server.host, self.server.port
                )
            })
    }

    pub fn default_template() -> String {
        let template = r#"[source]
# sample | store | https://host/deals.json | /path/to/deals.json
default = "sample"

[storage]
db_path = "~/.local/share/deal-hunter/deals.db"

[query]
# digits: strip every non-digit ("$50K-100K" -> 50100)
# suffix: first number scaled by K/M ("$50K-100K" -> 50000)
value_parsing = "digits"
sort_by = "score"
sort_order = "desc"

[talent]
name = "Alex Rodriguez"
category = "Professional Athlete"
followers = 2500000
engagement = 4.2
age_range = "25-45"
categories = ["Sports", "Fitness"]
past_brands = ["Nike", "Gatorade"]

[outreach]
# professional | casual | high-value | quick
template = "professional"
sender_name = "Sarah Martinez"
sender_title = "Partnership Manager"
company_name = "Hyper Talent Agency"

[server]
host = "127.0.0.1"
port = 3001
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            storage: StorageConfig::default(),
            query: QueryConfig::default(),
            talent: TalentProfile::default(),
            outreach: OutreachConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            default: default_source(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            template: TemplateKind::default(),
            sender_name: default_sender_name(),
            sender_title: default_sender_title(),
            company_name: default_company_name(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_source() -> String {
    "sample".to_string()
}

fn default_db_path() -> String {
    "~/.local/share/deal-hunter/deals.db".to_string()
}

fn default_sender_name() -> String {
    "Sarah Martinez".to_string()
}

fn default_sender_title() -> String {
    "Partnership Manager".to_string()
}

fn default_company_name() -> String {
    "Hyper Talent Agency".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}
