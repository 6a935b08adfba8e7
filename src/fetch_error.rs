#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("Failed to parse CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to parse numeric value: {0}")]
    Value(String),
}
