use std::env;
use std::path::PathBuf;

/// Summer thermal-season dataset from the Milan open data portal.
pub const DEFAULT_SUMMER_URL: &str = "https://dati.comune.milano.it/dataset/d9b6975d-7b28-413a-ac7f-cd05432824c1/resource/62de6bfa-1d15-4498-b69a-71f90dbf1018/download/ds1561_stagione_termica_estiva.csv";

/// Winter thermal-season dataset from the Milan open data portal.
pub const DEFAULT_WINTER_URL: &str = "https://dati.comune.milano.it/dataset/ef94c475-cb1a-4432-bd90-9cb3a739bd71/resource/b5a63c19-4a34-4ba0-8b49-04696372d8d2/download/ds1560_stagione_termica_invernale.csv";

/// Default location of the SQLite store, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "data/milan_climate.sqlite";

#[derive(Debug, Clone)]
pub struct Config {
    pub summer_url: String,
    pub winter_url: String,
    pub database_path: PathBuf,
}

impl Config {
    /// Build a config from the environment, falling back to the built-in
    /// dataset URLs and database path when a variable is unset.
    pub fn from_env() -> Self {
        Config {
            summer_url: env::var("SUMMER_CSV_URL")
                .unwrap_or_else(|_| DEFAULT_SUMMER_URL.to_string()),
            winter_url: env::var("WINTER_CSV_URL")
                .unwrap_or_else(|_| DEFAULT_WINTER_URL.to_string()),
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH)),
        }
    }
}
