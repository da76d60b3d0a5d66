use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{
    configuration::Config,
    error::Error,
    types::{
        BinanceTickerPrice, CoinsConfig, CoinsFileEntry, FixerResponse,
        GeckoCoin, GeckoMarket, KdfOrderbook, KdfOrderbookRequest,
    },
};

/// A freshly fetched upstream payload. Adapters never cache.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct HTTP {
    pub config: Config,
    http: Client,
}

impl HTTP {
    pub fn new(config: Config) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(HTTP { config, http })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Fetched<T>, Error> {
        debug!("GET {}{}", url.host_str().unwrap_or_default(), url.path());
        let data = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;

        Ok(Fetched {
            data,
            fetched_at: Utc::now(),
        })
    }

    pub async fn get_coins(&self) -> Result<Fetched<Vec<CoinsFileEntry>>, Error> {
        let url = Url::parse(&self.config.coins_url)?;
        self.get_json(url).await
    }

    pub async fn get_coins_config(&self) -> Result<Fetched<CoinsConfig>, Error> {
        let url = Url::parse(&self.config.coins_config_url)?;
        self.get_json(url).await
    }

    pub async fn get_gecko_coins_list(
        &self,
    ) -> Result<Fetched<Vec<GeckoCoin>>, Error> {
        let url = self.config.coingecko_list_url()?;
        self.get_json(url).await
    }

    pub async fn get_gecko_markets(
        &self,
        ids: &[String],
    ) -> Result<Fetched<Vec<GeckoMarket>>, Error> {
        let url = self.config.coingecko_markets_url(ids)?;
        self.get_json(url).await
    }

    pub async fn get_fixer_latest(&self) -> Result<Fetched<FixerResponse>, Error> {
        if self.config.fixer_api_key.is_empty() {
            return Err(Error::ApiKeyMissing(String::from("FIXER_API_KEY")));
        }

        let url = self.config.fixer_latest_url()?;
        self.get_json(url).await
    }

    pub async fn get_binance_ticker_price(
        &self,
    ) -> Result<Fetched<Vec<BinanceTickerPrice>>, Error> {
        let url = self.config.binance_ticker_price_url()?;
        self.get_json(url).await
    }

    /// `orderbook` RPC against the local KDF node.
    pub async fn get_orderbook(
        &self,
        base: &str,
        rel: &str,
    ) -> Result<Fetched<KdfOrderbook>, Error> {
        let url = self.config.kdf_rpc_url()?;
        let request = KdfOrderbookRequest {
            userpass: &self.config.kdf_userpass,
            method: "orderbook",
            base,
            rel,
        };

        let data = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<KdfOrderbook>()
            .await?;

        if let Some(error) = &data.error {
            return Err(Error::Upstream(format!(
                "orderbook {}/{}: {}",
                base, rel, error
            )));
        }

        Ok(Fetched {
            data,
            fetched_at: Utc::now(),
        })
    }
}
