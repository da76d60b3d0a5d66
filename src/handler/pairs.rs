//! Pair view producers: last traded, 24h prices, volumes and the extended
//! orderbook. Each reads its dependency snapshots once, then projects every
//! candidate pair with the pure builders below.

use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    cache_keys::CacheName,
    configuration::{AppState, State},
    error::Error,
    helpers::{
        coins::Coins,
        decimal::{decimal_from_value, format_10f, zero_10f},
        now_ts, pair,
        swaps::{aggregate, orient},
        templates::PairTemplate,
    },
    model::Swap,
    provider::NetId,
    types::{
        KdfOrder, KdfOrderbook, OrderbookEntry, PairLastTraded, PairMap,
        PairOrderbookExtended, PairPrices, PairVolume,
    },
};

pub const DAY: i64 = 86400;

/// Snapshots shared by every pair producer, read once at producer entry.
struct PairContext {
    coins: Coins,
    last_traded: Arc<PairMap<PairLastTraded>>,
    candidates: Vec<(String, String)>,
}

async fn pair_context(
    app_state: &AppState<State>,
    now: i64,
) -> Result<PairContext, Error> {
    let store = &app_state.store;
    let config = store.coins_config.require(CacheName::CoinsConfig).await?;
    let last_traded = store
        .pair_last_traded
        .require(CacheName::PairLastTraded)
        .await?;
    let coins_list = store.coins.get().await;
    let gecko = store.gecko_source.get().await;

    let coins = Coins::new(&config, coins_list.as_deref(), gecko.as_deref());
    let candidates = candidate_pairs(
        &last_traded,
        &coins,
        now,
        app_state.config.pairs_days,
    );

    Ok(PairContext {
        coins,
        last_traded,
        candidates,
    })
}

/// `LTC_LTC-segwit` moves one coin between platforms and is not a market.
fn is_market(ticker_id: &str) -> bool {
    match pair::base_quote(&pair::deplatform(ticker_id)) {
        Ok((base, quote)) => base != quote,
        Err(_) => false,
    }
}

/// Pairs traded within `days`, both coins tradable, distinct coins once
/// platforms are stripped.
pub fn candidate_pairs(
    last_traded: &PairMap<PairLastTraded>,
    coins: &Coins,
    now: i64,
    days: i64,
) -> Vec<(String, String)> {
    let since = now - days * DAY;

    last_traded
        .values()
        .filter(|item| item.last_swap_time >= since)
        .filter(|item| coins.is_tradable_pair(&item.base, &item.quote))
        .filter(|item| is_market(&item.ticker_id))
        .map(|item| (item.base.to_owned(), item.quote.to_owned()))
        .collect()
}

// =============================================================================
// Last traded
// =============================================================================

pub async fn build_last_traded(
    app_state: &AppState<State>,
) -> Result<PairMap<PairLastTraded>, Error> {
    let store = &app_state.store;
    let config = store.coins_config.require(CacheName::CoinsConfig).await?;
    let coins_list = store.coins.get().await;
    let gecko = store.gecko_source.get().await;
    let coins = Coins::new(&config, coins_list.as_deref(), gecko.as_deref());

    let swaps = app_state.swaps.get_last_traded(NetId::All).await?;
    let data = last_traded(&coins, &swaps);
    info!("pair_last_traded: {} pairs from {} directions", data.len(), swaps.len());

    Ok(data)
}

/// Latest swap per market, whichever direction it was traded in.
pub fn last_traded(coins: &Coins, swaps: &[Swap]) -> PairMap<PairLastTraded> {
    let mut latest: PairMap<(String, String, &Swap)> = PairMap::new();

    for swap in swaps.iter().filter(|swap| swap.contributes()) {
        if !coins.is_tradable_pair(&swap.maker_coin, &swap.taker_coin) {
            continue;
        }

        let (base, quote) = coins.standard_pair(&swap.maker_coin, &swap.taker_coin);
        let key = pair::join(&base, &quote);

        let newer = match latest.get(&key) {
            Some((_, _, current)) => {
                (swap.finished_at, &swap.uuid) > (current.finished_at, &current.uuid)
            },
            None => true,
        };
        if newer {
            latest.insert(key, (base, quote, swap));
        }
    }

    latest
        .into_iter()
        .map(|(key, (base, quote, swap))| {
            let record = project_last_traded(coins, &base, &quote, swap);
            (key, record)
        })
        .collect()
}

fn project_last_traded(
    coins: &Coins,
    base: &str,
    quote: &str,
    swap: &Swap,
) -> PairLastTraded {
    let Some(trade) = orient(swap, base, quote) else {
        return PairLastTraded::template(base, quote);
    };

    PairLastTraded {
        ticker_id: pair::join(base, quote),
        base: base.to_owned(),
        quote: quote.to_owned(),
        last_swap_time: trade.finished_at,
        last_swap_uuid: trade.uuid,
        last_price: format_10f(&trade.price),
        last_base_amount: format_10f(&trade.base_amount),
        last_quote_amount: format_10f(&trade.quote_amount),
        last_trade_type: trade.side.to_string(),
        priced: !coins.usd_price(base).is_zero()
            && !coins.usd_price(quote).is_zero(),
    }
}

// =============================================================================
// Prices 24h
// =============================================================================

pub async fn build_prices_24hr(
    app_state: &AppState<State>,
) -> Result<PairMap<PairPrices>, Error> {
    let now = now_ts();
    let ctx = pair_context(app_state, now).await?;
    let swaps = app_state.swaps.get_swaps(NetId::All, now - DAY, now).await?;

    let data = prices_24hr(&ctx.coins, &ctx.candidates, &swaps);
    info!("pair_prices_24hr: {} pairs, {} swaps", data.len(), swaps.len());

    Ok(data)
}

pub fn prices_24hr(
    coins: &Coins,
    pairs: &[(String, String)],
    swaps: &[Swap],
) -> PairMap<PairPrices> {
    pairs
        .iter()
        .map(|(base, quote)| {
            (pair::join(base, quote), pair_prices(coins, base, quote, swaps))
        })
        .collect()
}

fn pair_prices(coins: &Coins, base: &str, quote: &str, swaps: &[Swap]) -> PairPrices {
    let agg = aggregate(swaps, base, quote);
    let mut prices = PairPrices::template(base, quote);

    prices.base_price_usd = format_10f(&coins.usd_price(base));
    prices.quote_price_usd = format_10f(&coins.usd_price(quote));

    let (Some(oldest), Some(newest)) = (&agg.oldest, &agg.newest) else {
        return prices;
    };

    prices.oldest_price = format_10f(&oldest.price);
    prices.oldest_price_time = oldest.finished_at;
    prices.newest_price = format_10f(&newest.price);
    prices.newest_price_time = newest.finished_at;
    prices.highest_price_24hr = format_10f(&agg.highest_price);
    prices.lowest_price_24hr = format_10f(&agg.lowest_price);
    prices.price_change_24hr = format_10f(&agg.price_change());
    prices.price_change_pct_24hr = format_10f(&agg.price_change_pct());
    prices.trades_24hr = agg.trades;

    prices
}

// =============================================================================
// Volumes
// =============================================================================

/// Volume view over the last `days` days (`pair_volumes_24hr` is `days = 1`).
pub async fn build_volumes(
    app_state: &AppState<State>,
    days: u32,
) -> Result<PairMap<PairVolume>, Error> {
    let now = now_ts();
    let ctx = pair_context(app_state, now).await?;
    let from = now - i64::from(days) * DAY;
    let swaps = app_state.swaps.get_swaps(NetId::All, from, now).await?;

    let data = volumes(&ctx.coins, &ctx.candidates, &swaps);
    info!(
        "pair_volumes_{}: {} pairs, {} swaps",
        pair::suffix(days),
        data.len(),
        swaps.len()
    );

    Ok(data)
}

pub fn volumes(
    coins: &Coins,
    pairs: &[(String, String)],
    swaps: &[Swap],
) -> PairMap<PairVolume> {
    pairs
        .iter()
        .map(|(base, quote)| {
            (pair::join(base, quote), pair_volume(coins, base, quote, swaps))
        })
        .collect()
}

fn pair_volume(coins: &Coins, base: &str, quote: &str, swaps: &[Swap]) -> PairVolume {
    let agg = aggregate(swaps, base, quote);
    let base_price = coins.usd_price(base);
    let quote_price = coins.usd_price(quote);

    let base_volume_usd = &agg.base_volume * &base_price;
    let quote_volume_usd = &agg.quote_volume * &quote_price;
    let volume_usd = usd_volume(
        (&base_price, &base_volume_usd),
        (&quote_price, &quote_volume_usd),
    );

    PairVolume {
        ticker_id: pair::join(base, quote),
        base: base.to_owned(),
        quote: quote.to_owned(),
        base_volume: format_10f(&agg.base_volume),
        target_volume: format_10f(&agg.quote_volume),
        base_volume_usd: format_10f(&base_volume_usd),
        quote_volume_usd: format_10f(&quote_volume_usd),
        volume_usd: format_10f(&volume_usd),
        trades: agg.trades,
    }
}

/// Mean of both sides when both are priced, otherwise the priced side.
pub fn usd_volume(
    (base_price, base_usd): (&BigDecimal, &BigDecimal),
    (quote_price, quote_usd): (&BigDecimal, &BigDecimal),
) -> BigDecimal {
    match (base_price.is_zero(), quote_price.is_zero()) {
        (false, false) => (base_usd + quote_usd) / BigDecimal::from(2),
        (false, true) => base_usd.clone(),
        (true, false) => quote_usd.clone(),
        (true, true) => BigDecimal::zero(),
    }
}

// =============================================================================
// Orderbook extended
// =============================================================================

pub async fn build_orderbook_extended(
    app_state: &AppState<State>,
) -> Result<PairMap<PairOrderbookExtended>, Error> {
    let now = now_ts();
    let ctx = pair_context(app_state, now).await?;
    let store = &app_state.store;
    let prices = store
        .pair_prices_24hr
        .require(CacheName::PairPrices24hr)
        .await?;
    let volumes = store
        .pair_volumes_24hr
        .require(CacheName::PairVolumes24hr)
        .await?;

    let books: Vec<(String, String, KdfOrderbook)> =
        stream::iter(ctx.candidates.iter().cloned())
            .map(|(base, quote)| async move {
                let book = fetch_book(app_state, &base, &quote).await;
                (base, quote, book)
            })
            .buffer_unordered(app_state.config.max_concurrent_requests)
            .collect()
            .await;

    let mut data = PairMap::new();
    for (base, quote, book) in books {
        let key = pair::join(&base, &quote);
        let inputs = OrderbookInputs {
            prices: prices.get(&key),
            volumes: volumes.get(&key),
            last_traded: ctx.last_traded.get(&key),
        };

        let record =
            match project_orderbook(&ctx.coins, &base, &quote, &book, inputs, now) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Orderbook projection for {} failed: {}", key, e);
                    PairOrderbookExtended::template(&base, &quote)
                },
            };
        data.insert(key, record);
    }

    info!("pair_orderbook_extended: {} pairs", data.len());
    Ok(data)
}

async fn fetch_book(app_state: &AppState<State>, base: &str, quote: &str) -> KdfOrderbook {
    if !app_state.config.kdf_enabled() {
        return KdfOrderbook::default();
    }

    match app_state.http.get_orderbook(base, quote).await {
        Ok(fetched) => fetched.data,
        Err(e) => {
            warn!("Orderbook {}_{} unavailable: {}", base, quote, e);
            KdfOrderbook::default()
        },
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OrderbookInputs<'a> {
    pub prices: Option<&'a PairPrices>,
    pub volumes: Option<&'a PairVolume>,
    pub last_traded: Option<&'a PairLastTraded>,
}

struct Order {
    price: BigDecimal,
    base_volume: BigDecimal,
    quote_volume: BigDecimal,
}

fn parse_orders(orders: &[KdfOrder]) -> Result<Vec<Order>, Error> {
    orders
        .iter()
        .map(|order| {
            Ok(Order {
                price: decimal_from_value(&order.price)?,
                base_volume: decimal_from_value(&order.base_max_volume)?,
                quote_volume: decimal_from_value(&order.rel_max_volume)?,
            })
        })
        .collect()
}

fn entries(orders: &[Order]) -> Vec<OrderbookEntry> {
    orders
        .iter()
        .map(|order| OrderbookEntry {
            price: format_10f(&order.price),
            volume: format_10f(&order.base_volume),
        })
        .collect()
}

fn totals(orders: &[Order]) -> (BigDecimal, BigDecimal) {
    orders.iter().fold(
        (BigDecimal::zero(), BigDecimal::zero()),
        |(base, quote), order| (base + &order.base_volume, quote + &order.quote_volume),
    )
}

pub fn project_orderbook(
    coins: &Coins,
    base: &str,
    quote: &str,
    book: &KdfOrderbook,
    inputs: OrderbookInputs<'_>,
    now: i64,
) -> Result<PairOrderbookExtended, Error> {
    let mut asks = parse_orders(&book.asks)?;
    let mut bids = parse_orders(&book.bids)?;
    asks.sort_by(|a, b| a.price.cmp(&b.price));
    bids.sort_by(|a, b| b.price.cmp(&a.price));

    let base_price = coins.usd_price(base);
    let quote_price = coins.usd_price(quote);

    let (asks_base, asks_quote) = totals(&asks);
    let (bids_base, bids_quote) = totals(&bids);
    let asks_base_usd = &asks_base * &base_price;
    let bids_quote_usd = &bids_quote * &quote_price;
    let liquidity = &asks_base_usd + &bids_quote_usd;

    let best = |orders: &[Order]| {
        orders
            .first()
            .map(|order| format_10f(&order.price))
            .unwrap_or_else(zero_10f)
    };

    let mut record = PairOrderbookExtended::template(base, quote);
    record.timestamp = now;
    record.highest_bid = best(&bids);
    record.lowest_ask = best(&asks);
    record.bids = entries(&bids);
    record.asks = entries(&asks);
    record.total_asks_base_vol = format_10f(&asks_base);
    record.total_bids_base_vol = format_10f(&bids_base);
    record.total_asks_quote_vol = format_10f(&asks_quote);
    record.total_bids_quote_vol = format_10f(&bids_quote);
    record.total_asks_base_usd = format_10f(&asks_base_usd);
    record.total_bids_quote_usd = format_10f(&bids_quote_usd);
    record.liquidity_in_usd = format_10f(&liquidity);
    record.base_price_usd = format_10f(&base_price);
    record.quote_price_usd = format_10f(&quote_price);

    if let Some(prices) = inputs.prices {
        record.newest_price = prices.newest_price.to_owned();
        record.newest_price_time = prices.newest_price_time;
        record.high_24hr = prices.highest_price_24hr.to_owned();
        record.low_24hr = prices.lowest_price_24hr.to_owned();
        record.price_change_24hr = prices.price_change_24hr.to_owned();
        record.price_change_pct_24hr = prices.price_change_pct_24hr.to_owned();
    }

    if let Some(volumes) = inputs.volumes {
        record.base_volume_24hr = volumes.base_volume.to_owned();
        record.quote_volume_24hr = volumes.target_volume.to_owned();
        record.volume_usd_24hr = volumes.volume_usd.to_owned();
        record.trades_24hr = volumes.trades;
    }

    if let Some(last) = inputs.last_traded {
        record.last_swap_uuid = last.last_swap_uuid.to_owned();
        record.last_swap_time = last.last_swap_time;
    } else {
        debug!("No last trade for {}", record.ticker_id);
    }

    Ok(record)
}
