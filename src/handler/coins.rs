use tracing::info;

use crate::{
    configuration::{AppState, State},
    error::Error,
    types::{CoinsConfig, CoinsFileEntry, CoinsList},
};

pub async fn build_coins_config(
    app_state: &AppState<State>,
) -> Result<CoinsConfig, Error> {
    let fetched = app_state.http.get_coins_config().await?;
    let config = normalize_coins_config(fetched.data)?;
    info!("coins_config: {} coins", config.len());
    Ok(config)
}

pub async fn build_coins(app_state: &AppState<State>) -> Result<CoinsList, Error> {
    let fetched = app_state.http.get_coins().await?;
    let coins = coins_list(fetched.data)?;
    info!("coins: {} coins", coins.len());
    Ok(coins)
}

/// Keys are the tickers; entries missing their own `coin` get it from the key.
pub fn normalize_coins_config(mut config: CoinsConfig) -> Result<CoinsConfig, Error> {
    if config.is_empty() {
        return Err(Error::UpstreamDecode(String::from("coins_config is empty")));
    }

    for (ticker, entry) in config.iter_mut() {
        if entry.coin.is_empty() {
            entry.coin = ticker.to_owned();
        }
    }

    Ok(config)
}

pub fn coins_list(entries: Vec<CoinsFileEntry>) -> Result<CoinsList, Error> {
    if entries.is_empty() {
        return Err(Error::UpstreamDecode(String::from("coins file is empty")));
    }

    Ok(entries
        .into_iter()
        .filter(|entry| !entry.coin.is_empty())
        .map(|entry| (entry.coin.to_owned(), entry))
        .collect())
}
