//! Market API endpoints
//!
//! Tickers summary and the pair-keyed views.

use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    cache::Slot,
    cache_keys::CacheName,
    configuration::{AppState, State},
    controller::snapshot,
    error::Error,
    helpers::{
        inversion::InvertPair,
        pair,
        templates::{self, PairTemplate},
    },
    types::PairMap,
};

// =============================================================================
// Tickers
// =============================================================================

#[get("/tickers/summary")]
pub async fn tickers_summary(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data = snapshot(
        &state,
        CacheName::TickersSummary,
        &state.store.tickers_summary,
    )
    .await;

    Ok(match data {
        Some(summary) => HttpResponse::Ok().json(summary.as_ref()),
        None => HttpResponse::Ok().json(templates::tickers_summary()),
    })
}

// =============================================================================
// Pairs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pair: Option<String>,
}

/// Whole view, or one record when `?pair=` is given. Unknown pairs and
/// never-built views answer with templates.
async fn pair_view<T>(
    state: &AppState<State>,
    name: CacheName,
    slot: &Slot<PairMap<T>>,
    query: &PairQuery,
) -> Result<HttpResponse, Error>
where
    T: PairTemplate + InvertPair + Clone + Serialize,
{
    let requested = match &query.pair {
        Some(ticker_id) => Some(pair::base_quote(ticker_id)?),
        None => None,
    };

    let data = snapshot(state, name, slot).await;

    let response = match (requested, data) {
        (Some((base, quote)), Some(data)) => {
            HttpResponse::Ok().json(pair_record(&data, &base, &quote))
        },
        (Some((base, quote)), None) => {
            HttpResponse::Ok().json(T::template(&base, &quote))
        },
        (None, Some(data)) => HttpResponse::Ok().json(data.as_ref()),
        (None, None) => HttpResponse::Ok().json(PairMap::<T>::new()),
    };

    Ok(response)
}

/// `BASE_QUOTE` as stored, else the stored `QUOTE_BASE` inverted, else the
/// template.
fn pair_record<T>(data: &PairMap<T>, base: &str, quote: &str) -> T
where
    T: PairTemplate + InvertPair + Clone,
{
    let ticker_id = pair::join(base, quote);
    if let Some(record) = data.get(&ticker_id) {
        return record.clone();
    }

    let Some(record) = data.get(&pair::invert(&ticker_id)) else {
        return T::template(base, quote);
    };

    match record.inverted() {
        Ok(record) => record,
        Err(e) => {
            warn!("Inverting {} failed: {}", ticker_id, e);
            T::template(base, quote)
        },
    }
}

#[get("/pairs/last_traded")]
pub async fn last_traded(
    state: web::Data<AppState<State>>,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, Error> {
    pair_view(
        &state,
        CacheName::PairLastTraded,
        &state.store.pair_last_traded,
        &query,
    )
    .await
}

#[get("/pairs/orderbook_extended")]
pub async fn orderbook_extended(
    state: web::Data<AppState<State>>,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, Error> {
    pair_view(
        &state,
        CacheName::PairOrderbookExtended,
        &state.store.pair_orderbook_extended,
        &query,
    )
    .await
}

#[get("/pairs/prices_24hr")]
pub async fn prices_24hr(
    state: web::Data<AppState<State>>,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, Error> {
    pair_view(
        &state,
        CacheName::PairPrices24hr,
        &state.store.pair_prices_24hr,
        &query,
    )
    .await
}

#[get("/pairs/volumes_24hr")]
pub async fn volumes_24hr(
    state: web::Data<AppState<State>>,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, Error> {
    pair_view(
        &state,
        CacheName::PairVolumes24hr,
        &state.store.pair_volumes_24hr,
        &query,
    )
    .await
}

#[get("/pairs/volumes_14d")]
pub async fn volumes_14d(
    state: web::Data<AppState<State>>,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, Error> {
    pair_view(
        &state,
        CacheName::PairVolumes14d,
        &state.store.pair_volumes_14d,
        &query,
    )
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    use super::*;
    use crate::{
        controller::tests::app_state,
        helpers::templates::NIL_UUID,
        server,
        types::{
            OrderbookEntry, PairLastTraded, PairOrderbookExtended, PairPrices,
            PairVolume, TickersSummary,
        },
    };

    fn prices(base: &str, quote: &str, newest: &str) -> PairPrices {
        let mut prices = PairPrices::template(base, quote);
        prices.newest_price = newest.to_owned();
        prices.trades_24hr = 1;
        prices
    }

    fn entry(price: &str, volume: &str) -> OrderbookEntry {
        OrderbookEntry {
            price: price.to_owned(),
            volume: volume.to_owned(),
        }
    }

    #[actix_web::test]
    async fn test_inverted_pair_is_projected() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());
        let store = &state.store;

        let mut volume = PairVolume::template("KMD", "LTC");
        volume.base_volume = String::from("140.0000000000");
        volume.target_volume = String::from("170.0000000000");
        volume.base_volume_usd = String::from("35.0000000000");
        volume.quote_volume_usd = String::from("11900.0000000000");
        volume.volume_usd = String::from("5967.5000000000");
        volume.trades = 2;
        let volumes = PairMap::from([(volume.ticker_id.to_owned(), volume)]);
        store.pair_volumes_24hr.put(volumes.clone()).await;
        store.pair_volumes_14d.put(volumes).await;

        let mut prices = PairPrices::template("KMD", "LTC");
        prices.oldest_price = String::from("1.2000000000");
        prices.newest_price = String::from("1.2500000000");
        prices.highest_price_24hr = String::from("1.2500000000");
        prices.lowest_price_24hr = String::from("1.2000000000");
        prices.base_price_usd = String::from("0.2500000000");
        prices.quote_price_usd = String::from("70.0000000000");
        prices.trades_24hr = 2;
        store
            .pair_prices_24hr
            .put(PairMap::from([(prices.ticker_id.to_owned(), prices)]))
            .await;

        let mut last = PairLastTraded::template("KMD", "LTC");
        last.last_swap_uuid = String::from("b");
        last.last_price = String::from("1.2500000000");
        last.last_base_amount = String::from("40.0000000000");
        last.last_quote_amount = String::from("50.0000000000");
        last.last_trade_type = String::from("sell");
        store
            .pair_last_traded
            .put(PairMap::from([(last.ticker_id.to_owned(), last)]))
            .await;

        let mut book = PairOrderbookExtended::template("KMD", "LTC");
        book.asks = vec![entry("1.2500000000", "4.0000000000")];
        book.bids = vec![entry("1.0000000000", "10.0000000000")];
        book.lowest_ask = String::from("1.2500000000");
        book.highest_bid = String::from("1.0000000000");
        book.total_asks_base_vol = String::from("4.0000000000");
        book.total_asks_quote_vol = String::from("5.0000000000");
        book.total_bids_base_vol = String::from("10.0000000000");
        book.total_bids_quote_vol = String::from("10.0000000000");
        book.base_volume_24hr = String::from("140.0000000000");
        book.quote_volume_24hr = String::from("170.0000000000");
        store
            .pair_orderbook_extended
            .put(PairMap::from([(book.ticker_id.to_owned(), book)]))
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(server::routes),
        )
        .await;
        let app = &app;
        let get_json = move |uri: String| {
            let req = test::TestRequest::get().uri(&uri).to_request();
            test::call_and_read_body_json::<_, _, Value>(app, req)
        };

        for view in ["volumes_24hr", "volumes_14d"] {
            let body =
                get_json(format!("/api/v3/pairs/{}?pair=LTC_KMD", view)).await;
            assert_eq!(body["ticker_id"], "LTC_KMD");
            assert_eq!(body["base"], "LTC");
            assert_eq!(body["base_volume"], "170.0000000000");
            assert_eq!(body["target_volume"], "140.0000000000");
            assert_eq!(body["base_volume_usd"], "11900.0000000000");
            assert_eq!(body["quote_volume_usd"], "35.0000000000");
            assert_eq!(body["volume_usd"], "5967.5000000000");
            assert_eq!(body["trades"], 2);

            let body =
                get_json(format!("/api/v3/pairs/{}?pair=KMD_LTC", view)).await;
            assert_eq!(body["base_volume"], "140.0000000000");
        }

        let body = get_json(String::from("/api/v3/pairs/prices_24hr?pair=LTC_KMD")).await;
        assert_eq!(body["ticker_id"], "LTC_KMD");
        assert_eq!(body["newest_price"], "0.8000000000");
        assert_eq!(body["oldest_price"], "0.8333333333");
        assert_eq!(body["highest_price_24hr"], "0.8333333333");
        assert_eq!(body["lowest_price_24hr"], "0.8000000000");
        assert_eq!(body["base_price_usd"], "70.0000000000");
        assert_eq!(body["quote_price_usd"], "0.2500000000");
        assert_eq!(body["trades_24hr"], 2);

        let body = get_json(String::from("/api/v3/pairs/last_traded?pair=LTC_KMD")).await;
        assert_eq!(body["last_swap_uuid"], "b");
        assert_eq!(body["last_price"], "0.8000000000");
        assert_eq!(body["last_base_amount"], "50.0000000000");
        assert_eq!(body["last_quote_amount"], "40.0000000000");
        assert_eq!(body["last_trade_type"], "buy");

        let body =
            get_json(String::from("/api/v3/pairs/orderbook_extended?pair=LTC_KMD")).await;
        assert_eq!(body["base"], "LTC");
        assert_eq!(
            body["asks"],
            serde_json::json!([{"price": "1.0000000000", "volume": "10.0000000000"}])
        );
        assert_eq!(
            body["bids"],
            serde_json::json!([{"price": "0.8000000000", "volume": "5.0000000000"}])
        );
        assert_eq!(body["highest_bid"], "0.8000000000");
        assert_eq!(body["lowest_ask"], "1.0000000000");
        assert_eq!(body["total_asks_base_vol"], "10.0000000000");
        assert_eq!(body["total_bids_base_vol"], "5.0000000000");
        assert_eq!(body["base_volume_24hr"], "170.0000000000");

        // neither orientation stored
        let body = get_json(String::from("/api/v3/pairs/volumes_24hr?pair=BTC_KMD")).await;
        assert_eq!(body["ticker_id"], "BTC_KMD");
        assert_eq!(body["base_volume"], "0.0000000000");
        assert_eq!(body["trades"], 0);
    }

    #[actix_web::test]
    async fn test_never_built_returns_template() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(server::routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v3/tickers/summary")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: TickersSummary = test::read_body_json(resp).await;
        assert_eq!(body, templates::tickers_summary());

        let req = test::TestRequest::get()
            .uri("/api/v3/pairs/last_traded?pair=KMD_LTC")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ticker_id"], "KMD_LTC");
        assert_eq!(body["last_swap_uuid"], NIL_UUID);
        assert_eq!(body["last_price"], "0.0000000000");

        let req = test::TestRequest::get()
            .uri("/api/v3/pairs/volumes_14d")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!({}));
    }

    #[actix_web::test]
    async fn test_bad_pair_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(server::routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v3/pairs/prices_24hr?pair=KMDLTC")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("KMDLTC"));
    }

    #[actix_web::test]
    async fn test_prior_snapshot_survives_failed_build() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());

        let mut summary = templates::tickers_summary();
        summary.last_update = 1700000000;
        summary.pairs_count = 3;
        state.store.tickers_summary.put(summary.clone()).await;

        // dependencies are missing, so this build fails
        assert!(crate::registry::build(&state, CacheName::TickersSummary)
            .await
            .is_err());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(server::routes),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/v3/tickers/summary")
            .to_request();
        let body: TickersSummary = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, summary);
    }

    #[actix_web::test]
    async fn test_concurrent_reads_during_publish() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());

        let mut first = PairMap::new();
        first.insert(String::from("KMD_LTC"), prices("KMD", "LTC", "0.0100000000"));
        state.store.pair_prices_24hr.put(first).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(server::routes),
        )
        .await;

        let publish = async {
            let mut second = PairMap::new();
            second.insert(String::from("KMD_LTC"), prices("KMD", "LTC", "0.0200000000"));
            second.insert(String::from("DOGE_KMD"), prices("DOGE", "KMD", "5.0000000000"));
            state.store.pair_prices_24hr.put(second).await;
        };
        let read = |uri: &'static str| {
            let req = test::TestRequest::get().uri(uri).to_request();
            test::call_and_read_body_json::<_, _, PairMap<PairPrices>>(&app, req)
        };

        let (a, _, b) = futures::join!(
            read("/api/v3/pairs/prices_24hr"),
            publish,
            read("/api/v3/pairs/prices_24hr"),
        );

        for body in [a, b] {
            let kmd_ltc = &body["KMD_LTC"];
            assert_eq!(kmd_ltc.ticker_id, "KMD_LTC");
            match body.len() {
                1 => assert_eq!(kmd_ltc.newest_price, "0.0100000000"),
                2 => assert_eq!(kmd_ltc.newest_price, "0.0200000000"),
                n => panic!("unexpected snapshot with {} pairs", n),
            }
        }
    }
}
