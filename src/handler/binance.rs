use crate::{
    configuration::{AppState, State},
    error::Error,
    types::{BinancePrices, BinanceTickerPrice},
};

pub async fn build_binance_prices(
    app_state: &AppState<State>,
) -> Result<BinancePrices, Error> {
    let fetched = app_state.http.get_binance_ticker_price().await?;
    binance_prices(fetched.data)
}

pub fn binance_prices(
    tickers: Vec<BinanceTickerPrice>,
) -> Result<BinancePrices, Error> {
    if tickers.is_empty() {
        return Err(Error::UpstreamDecode(String::from(
            "binance returned no tickers",
        )));
    }

    Ok(tickers
        .into_iter()
        .map(|ticker| (ticker.symbol, ticker.price))
        .collect())
}
