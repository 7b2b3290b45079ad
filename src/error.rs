// Typed errors for the API client and date parsing.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API url {url}: {source}")]
    InvalidUri {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    #[error("Request error: {0}")]
    Request(#[from] http::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("Failed reading response body: {0}")]
    Body(#[from] hyper::Error),

    #[error("API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed decoding response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date '{0}': expected year-month-day")]
    Format(String),

    #[error("invalid date '{0}': no such day")]
    OutOfRange(String),
}
