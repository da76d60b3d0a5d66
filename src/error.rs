use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use anyhow::Error as ANYHOW_ERROR;
use bigdecimal::ParseBigDecimalError as BIG_DECIMAL_ERROR;
use csv::Error as CSV_ERROR;
use reqwest::Error as REQWEST_ERROR;
use serde_json::Error as JSON_ERROR;
use sqlx::error::Error as SQL_ERROR;
use std::{
    env::VarError, io::Error as IO_ERROR, num::ParseIntError,
    str::ParseBoolError as PARSE_BOOL_ERROR,
};
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tracing::subscriber::SetGlobalDefaultError as TRACING_GLOBAL_DEFAULT_ERROR;
use url::ParseError as URL_ERROR;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] IO_ERROR),

    #[error("{0}")]
    URL(#[from] URL_ERROR),

    #[error("{0}")]
    INT(#[from] ParseIntError),

    #[error("{0}")]
    SQL(#[from] SQL_ERROR),

    #[error("{0}")]
    VAR(#[from] VarError),

    #[error("{0}")]
    TokioJoinError(#[from] JoinError),

    #[error("{0}")]
    TokioElapsedError(#[from] Elapsed),

    #[error("{0}")]
    BigDecimalError(#[from] BIG_DECIMAL_ERROR),

    #[error("{0}")]
    JsonError(#[from] JSON_ERROR),

    #[error("{0}")]
    CsvError(#[from] CSV_ERROR),

    #[error("{0}")]
    ParseBoolError(#[from] PARSE_BOOL_ERROR),

    #[error("{0}")]
    AnyHowError(#[from] ANYHOW_ERROR),

    #[error("Tracing error: {0}")]
    SetGlobalDefaultError(#[from] TRACING_GLOBAL_DEFAULT_ERROR),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Server end with error: {0}")]
    ServerError(String),

    #[error("Bad pair format: {0}")]
    BadPairFormat(String),

    #[error("Coin not found: {0}")]
    CoinNotFound(String),

    #[error("Coin is wallet only: {0}")]
    CoinWalletOnly(String),

    #[error("Uuid not found: {0}")]
    UuidNotFound(String),

    #[error("Cache item not found: {0}")]
    CacheItemNotFound(String),

    #[error("Cache file missing: {0}")]
    CacheFileMissing(String),

    #[error("Missing params: {0}")]
    RequiredQueryParamMissing(String),

    #[error("Upstream transport error: {0}")]
    UpstreamTransport(String),

    #[error("Upstream decode error: {0}")]
    UpstreamDecode(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("{0}")]
    UpstreamStale(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Api key missing: {0}")]
    ApiKeyMissing(String),

    #[error("Geo restricted: {0}")]
    GeoRestricted(String),
}

impl From<REQWEST_ERROR> for Error {
    fn from(e: REQWEST_ERROR) -> Self {
        let url = e
            .url()
            .map(|url| format!("{}{}", url.host_str().unwrap_or(""), url.path()))
            .unwrap_or_default();

        if e.is_timeout() {
            Error::Timeout(url)
        } else if e.is_decode() {
            Error::UpstreamDecode(format!("{}: {}", url, e))
        } else if let Some(status) = e.status() {
            Error::Upstream(format!("{}: {}", url, status))
        } else {
            Error::UpstreamTransport(format!("{}: {}", url, e))
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::UpstreamStale(_) => StatusCode::NOT_ACCEPTABLE,
            Error::GeoRestricted(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({ "error": self.to_string() });
        HttpResponse::build(self.status_code()).json(body)
    }
}
