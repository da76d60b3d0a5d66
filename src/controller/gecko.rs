//! CoinGecko API endpoints

use std::collections::BTreeMap;

use actix_web::{get, web, HttpResponse};

use crate::{
    cache_keys::CacheName,
    configuration::{AppState, State},
    controller::snapshot,
    error::Error,
    helpers::coins::Coins,
    types::GeckoSource,
};

#[get("/gecko/source")]
pub async fn source(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data =
        snapshot(&state, CacheName::GeckoSource, &state.store.gecko_source).await;

    Ok(match data {
        Some(source) => HttpResponse::Ok().json(source.as_ref()),
        None => HttpResponse::Ok().json(GeckoSource::new()),
    })
}

/// CoinGecko id -> tickers listed under it.
#[get("/gecko/coin_ids")]
pub async fn coin_ids(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let config =
        snapshot(&state, CacheName::CoinsConfig, &state.store.coins_config).await;

    let Some(config) = config else {
        return Ok(HttpResponse::Ok().json(BTreeMap::<String, Vec<String>>::new()));
    };

    let coins = Coins::new(&config, None, None);
    Ok(HttpResponse::Ok().json(coins.gecko_coin_ids()))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        controller::tests::app_state,
        helpers::coins::tests::{sample_config, sample_gecko},
        server,
    };

    #[actix_web::test]
    async fn test_coin_ids_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(dir.path());
        state.store.coins_config.put(sample_config()).await;
        state.store.gecko_source.put(sample_gecko()).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(server::routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v3/gecko/coin_ids")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["litecoin"], json!(["LTC", "LTC-segwit"]));
        assert!(body.get("test-coin").is_none());

        let req = test::TestRequest::get()
            .uri("/api/v3/gecko/source")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["komodo"]["usd_price"], "0.25");
    }

    #[actix_web::test]
    async fn test_never_built_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(dir.path())))
                .configure(server::routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v3/gecko/coin_ids")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({}));
    }
}
