use tracing::info;

use crate::{
    cache_keys::CacheName,
    configuration::{AppState, State},
    error::Error,
    helpers::{
        decimal::{format_10f, sum_decimal, zero_10f},
        now_ts,
    },
    types::{
        PairLastTraded, PairMap, PairOrderbookExtended, TickerItem,
        TickersSummary,
    },
};

pub async fn build_tickers_summary(
    app_state: &AppState<State>,
) -> Result<TickersSummary, Error> {
    let store = &app_state.store;
    let books = store
        .pair_orderbook_extended
        .require(CacheName::PairOrderbookExtended)
        .await?;
    let last_traded = store
        .pair_last_traded
        .require(CacheName::PairLastTraded)
        .await?;

    let summary = tickers_summary(&books, &last_traded, now_ts())?;
    info!(
        "tickers_summary: {} pairs, {} swaps",
        summary.pairs_count, summary.swaps_count
    );

    Ok(summary)
}

pub fn tickers_summary(
    books: &PairMap<PairOrderbookExtended>,
    last_traded: &PairMap<PairLastTraded>,
    now: i64,
) -> Result<TickersSummary, Error> {
    // PairMap iterates in ticker_id order
    let data: Vec<TickerItem> = books
        .iter()
        .map(|(ticker_id, book)| ticker_item(book, last_traded.get(ticker_id)))
        .collect();

    let rows = data
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TickersSummary {
        last_update: now,
        pairs_count: data.len() as u64,
        swaps_count: data.iter().map(|item| item.trades_24hr).sum(),
        combined_volume_usd: format_10f(&sum_decimal(&rows, "volume_usd_24hr")?),
        combined_liquidity_usd: format_10f(&sum_decimal(&rows, "liquidity_in_usd")?),
        data,
    })
}

fn ticker_item(
    book: &PairOrderbookExtended,
    last: Option<&PairLastTraded>,
) -> TickerItem {
    TickerItem {
        ticker_id: book.ticker_id.to_owned(),
        base_currency: book.base.to_owned(),
        target_currency: book.quote.to_owned(),
        last_price: last
            .map(|last| last.last_price.to_owned())
            .unwrap_or_else(zero_10f),
        last_trade: book.last_swap_time,
        last_swap_uuid: book.last_swap_uuid.to_owned(),
        base_volume: book.base_volume_24hr.to_owned(),
        target_volume: book.quote_volume_24hr.to_owned(),
        base_price_usd: book.base_price_usd.to_owned(),
        target_price_usd: book.quote_price_usd.to_owned(),
        bid: book.highest_bid.to_owned(),
        ask: book.lowest_ask.to_owned(),
        high: book.high_24hr.to_owned(),
        low: book.low_24hr.to_owned(),
        price_change_24hr: book.price_change_24hr.to_owned(),
        price_change_pct_24hr: book.price_change_pct_24hr.to_owned(),
        volume_usd_24hr: book.volume_usd_24hr.to_owned(),
        liquidity_in_usd: book.liquidity_in_usd.to_owned(),
        trades_24hr: book.trades_24hr,
    }
}
