use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Catalog table (`|`-separated, Latin-1)
    #[serde(default = "default_movies_path")]
    pub movies_path: PathBuf,

    /// Ratings table (`,`-separated: user, item, rating)
    #[serde(default = "default_ratings_path")]
    pub ratings_path: PathBuf,

    /// Number of catalog items offered for selection
    #[serde(default = "default_catalog_limit")]
    pub catalog_limit: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_movies_path() -> PathBuf {
    PathBuf::from("./movies_100k.csv")
}

fn default_ratings_path() -> PathBuf {
    PathBuf::from("./ratings_100k.csv")
}

fn default_catalog_limit() -> usize {
    100
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            movies_path: default_movies_path(),
            ratings_path: default_ratings_path(),
            catalog_limit: default_catalog_limit(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
