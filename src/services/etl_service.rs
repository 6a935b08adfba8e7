use std::path::PathBuf;

use tracing::{info, instrument};

use crate::config::Config;
use crate::db::{self, ClimateRepository, DbError};
use crate::fetch_error::FetchError;
use crate::fetcher::{CsvFetcher, RawSeasonTable};
use crate::reshaper::{self, ReshapeError, WideTable};

/// Error types for the ETL pipeline, tagged by stage.
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("Extract failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Transform failed: {0}")]
    Reshape(#[from] ReshapeError),

    #[error("Load failed: {0}")]
    Database(#[from] DbError),
}

/// Runs the full extract -> transform -> load pipeline once.
#[derive(Clone)]
pub struct EtlService {
    summer_fetcher: CsvFetcher,
    winter_fetcher: CsvFetcher,
    database_path: PathBuf,
}

impl EtlService {
    pub fn new(config: &Config) -> Self {
        Self {
            summer_fetcher: CsvFetcher::new(config.summer_url.clone()),
            winter_fetcher: CsvFetcher::new(config.winter_url.clone()),
            database_path: config.database_path.clone(),
        }
    }

    /// Fetch both seasonal datasets, sequentially.
    #[instrument(skip(self))]
    pub async fn extract(&self) -> Result<(RawSeasonTable, RawSeasonTable), EtlError> {
        info!("Fetching summer dataset");
        let summer = self.summer_fetcher.fetch_table().await?;
        info!("Fetching winter dataset");
        let winter = self.winter_fetcher.fetch_table().await?;
        Ok((summer, winter))
    }

    /// Run the whole pipeline: fetch both datasets, reshape them into the
    /// unified wide table, then replace the climate_data table in the store.
    /// The store is only opened after extract and transform succeed, so a
    /// failed fetch never touches the database file. Returns the number of
    /// rows written.
    #[instrument(skip(self), fields(database_path = %self.database_path.display()))]
    pub async fn run(&self) -> Result<usize, EtlError> {
        let (summer, winter) = self.extract().await?;

        info!(
            "Reshaping {} summer and {} winter rows",
            summer.rows.len(),
            winter.rows.len()
        );
        let wide = reshaper::transform(&summer, &winter)?;

        let inserted = self.load(&wide).await?;
        info!("ETL completed successfully.");
        Ok(inserted)
    }

    async fn load(&self, table: &WideTable) -> Result<usize, EtlError> {
        let pool = db::connect(&self.database_path).await?;
        let repository = ClimateRepository::new(pool);
        let inserted = repository.replace_climate_data(table).await?;
        Ok(inserted)
    }
}
