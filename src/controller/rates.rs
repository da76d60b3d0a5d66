//! Reference price API endpoints
//!
//! Fiat rates from Fixer and the Binance ticker price pass-through.

use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::{
    cache_keys::CacheName,
    configuration::{AppState, State},
    controller::snapshot,
    error::Error,
    handler::fixer::check_fresh,
    helpers::{now_ts, templates},
    types::BinancePrices,
};

// =============================================================================
// Fixer
// =============================================================================

#[get("/rates/fixer_io")]
pub async fn fixer_io(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data =
        snapshot(&state, CacheName::FixerRates, &state.store.fixer_rates).await;

    let Some(rates) = data else {
        return Ok(HttpResponse::Ok().json(templates::fixer_rates()));
    };

    check_fresh(&rates, now_ts(), state.config.fixer_max_age)?;
    Ok(HttpResponse::Ok().json(rates.as_ref()))
}

// =============================================================================
// Binance
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TickerPriceQuery {
    symbol: Option<String>,
}

#[get("/binance/ticker_price")]
pub async fn ticker_price(
    state: web::Data<AppState<State>>,
    query: web::Query<TickerPriceQuery>,
) -> Result<HttpResponse, Error> {
    let data =
        snapshot(&state, CacheName::BinancePrices, &state.store.binance_prices)
            .await;

    let Some(prices) = data else {
        return Ok(HttpResponse::Ok().json(BinancePrices::new()));
    };

    let Some(symbol) = &query.symbol else {
        return Ok(HttpResponse::Ok().json(prices.as_ref()));
    };

    let symbol = symbol.to_uppercase();
    let subset: BinancePrices = prices
        .get(&symbol)
        .map(|price| (symbol.to_owned(), price.to_owned()))
        .into_iter()
        .collect();

    Ok(HttpResponse::Ok().json(subset))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::{controller::tests::app_state, server, types::FixerRates};

    fn rates(timestamp: i64) -> FixerRates {
        FixerRates {
            timestamp,
            date: String::from("2024-01-01"),
            base: String::from("USD"),
            rates: BTreeMap::from([
                (String::from("EUR"), String::from("0.8000000000")),
                (String::from("USD"), String::from("1.0000000000")),
            ]),
        }
    }

    #[actix_web::test]
    async fn test_fixer_rates_expire() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());
        state.store.fixer_rates.put(rates(now_ts() - 1000)).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(server::routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v3/rates/fixer_io")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Data expired"}));

        state.store.fixer_rates.put(rates(now_ts() - 10)).await;
        let req = test::TestRequest::get()
            .uri("/api/v3/rates/fixer_io")
            .to_request();
        let body: FixerRates = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.rates["EUR"], "0.8000000000");
    }

    #[actix_web::test]
    async fn test_fixer_never_built_is_template() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(dir.path())))
                .configure(server::routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v3/rates/fixer_io")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: FixerRates = test::read_body_json(resp).await;
        assert_eq!(body, templates::fixer_rates());
    }

    #[actix_web::test]
    async fn test_ticker_price_symbol_filter() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());
        state
            .store
            .binance_prices
            .put(BTreeMap::from([
                (String::from("LTCBTC"), String::from("0.00120000")),
                (String::from("KMDUSDT"), String::from("0.2501")),
            ]))
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(server::routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v3/binance/ticker_price?symbol=ltcbtc")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"LTCBTC": "0.00120000"}));

        let req = test::TestRequest::get()
            .uri("/api/v3/binance/ticker_price?symbol=NOPE")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({}));

        let req = test::TestRequest::get()
            .uri("/api/v3/binance/ticker_price")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_object().unwrap().len(), 2);
    }
}
