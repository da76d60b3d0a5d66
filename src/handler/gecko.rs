use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::{
    cache_keys::CacheName,
    configuration::{AppState, State},
    error::Error,
    helpers::{coins::Coins, decimal::decimal_from_number, decimal::format_10f},
    types::{GeckoMarket, GeckoPrice, GeckoSource},
};

/// CoinGecko caps `/coins/markets` ids per request.
const MARKETS_CHUNK: usize = 200;

pub async fn build_gecko_source(
    app_state: &AppState<State>,
) -> Result<GeckoSource, Error> {
    let config = app_state
        .store
        .coins_config
        .require(CacheName::CoinsConfig)
        .await?;
    let coins = Coins::new(&config, None, None);

    let listed: BTreeSet<String> = app_state
        .http
        .get_gecko_coins_list()
        .await?
        .data
        .into_iter()
        .map(|coin| coin.id)
        .collect();

    let ids = listed_ids(coins.gecko_ids(), &listed);
    let mut markets = vec![];

    for chunk in ids.chunks(MARKETS_CHUNK) {
        let fetched = app_state.http.get_gecko_markets(chunk).await?;
        markets.extend(fetched.data);
    }

    let source = gecko_source(markets)?;
    info!("gecko_source: {} of {} ids priced", source.len(), ids.len());
    Ok(source)
}

/// Drops ids CoinGecko does not know.
pub fn listed_ids(ids: Vec<String>, listed: &BTreeSet<String>) -> Vec<String> {
    let (known, unknown): (Vec<String>, Vec<String>) =
        ids.into_iter().partition(|id| listed.contains(id));

    if !unknown.is_empty() {
        warn!("Unknown CoinGecko ids in coins_config: {}", unknown.join(","));
    }

    known
}

pub fn gecko_source(markets: Vec<GeckoMarket>) -> Result<GeckoSource, Error> {
    let mut source = GeckoSource::new();

    for market in markets {
        let usd_price = match &market.current_price {
            Some(price) => decimal_from_number(price)?,
            None => Default::default(),
        };
        let usd_market_cap = match &market.market_cap {
            Some(cap) => decimal_from_number(cap)?,
            None => Default::default(),
        };

        source.insert(
            market.id,
            GeckoPrice {
                usd_price: format_10f(&usd_price),
                usd_market_cap: format_10f(&usd_market_cap),
            },
        );
    }

    Ok(source)
}
