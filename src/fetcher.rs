use serde::Serialize;
use tracing::{debug, instrument};

use crate::fetch_error::FetchError;

/// One data row of a seasonal CSV export: the metric name followed by one
/// value per station column. Empty cells are carried as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    pub metric: String,
    pub values: Vec<Option<f64>>,
}

/// A seasonal table exactly as served by the source, before any header
/// reassignment: the original header row plus the parsed data rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSeasonTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

#[derive(Clone)]
pub struct CsvFetcher {
    client: reqwest::Client,
    url: String,
}

impl CsvFetcher {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// Fetch the dataset with a single GET and parse the body as
    /// semicolon-delimited CSV. Non-success statuses are an error; there is
    /// no retry.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_table(&self) -> Result<RawSeasonTable, FetchError> {
        debug!("Sending HTTP request for seasonal dataset");
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        debug!("Received HTTP response with status: {}", status);
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status,
                url: self.url.clone(),
            });
        }

        let body = response.text().await?;
        debug!("Retrieved CSV content, size: {} bytes", body.len());

        self.parse_csv(&body)
    }

    #[instrument(skip(self, text), fields(text_size = text.len()))]
    fn parse_csv(&self, text: &str) -> Result<RawSeasonTable, FetchError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        debug!("Parsed header row with {} columns", headers.len());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut fields = record.iter();
            let metric = fields.next().unwrap_or_default().to_string();
            let values = fields.map(parse_cell).collect::<Result<Vec<_>, _>>()?;
            rows.push(RawRecord { metric, values });
        }

        debug!("Parsed {} data rows", rows.len());
        Ok(RawSeasonTable { headers, rows })
    }
}

/// Parse one value cell. Empty cells are null; the Milan exports use the
/// decimal comma, so commas are normalized before parsing.
fn parse_cell(cell: &str) -> Result<Option<f64>, FetchError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|e| FetchError::Value(format!("{e}: '{trimmed}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_decimal_comma() {
        assert_eq!(parse_cell("24,5").unwrap(), Some(24.5));
    }

    #[test]
    fn test_parse_cell_empty_is_null() {
        assert_eq!(parse_cell("").unwrap(), None);
        assert_eq!(parse_cell("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_cell_non_numeric_fails() {
        let result = parse_cell("n/a");
        assert!(matches!(result, Err(FetchError::Value(_))));
    }

    #[test]
    fn test_parse_csv_semicolon_delimited() {
        let text = "Indicatore;Bicocca;Bocconi;Bovisa;Centro;Citta' Studi;San Siro;Sud\n\
                    Temperatura media;25,1;26;24;25;23;27;28\n\
                    Umidita media;60;;58;61,5;59;62;63\n";

        let fetcher = CsvFetcher::new("".to_string());
        let table = fetcher.parse_csv(text).unwrap();

        assert_eq!(table.headers.len(), 8);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].metric, "Temperatura media");
        assert_eq!(table.rows[0].values[0], Some(25.1));
        assert_eq!(table.rows[1].values[1], None);
        assert_eq!(table.rows[1].values[3], Some(61.5));
    }

    #[test]
    fn test_parse_csv_ragged_row_fails() {
        let text = "Indicatore;A;B\nTemperatura;1;2;3\n";

        let fetcher = CsvFetcher::new("".to_string());
        let result = fetcher.parse_csv(text);
        assert!(matches!(result, Err(FetchError::Csv(_))));
    }

    #[test]
    fn test_parse_csv_bad_value_fails() {
        let text = "Indicatore;A;B\nTemperatura;1;abc\n";

        let fetcher = CsvFetcher::new("".to_string());
        let result = fetcher.parse_csv(text);
        assert!(matches!(result, Err(FetchError::Value(_))));
    }
}
