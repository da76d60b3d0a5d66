use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use tracing::info;

use crate::{
    configuration::{AppState, State},
    controller::{gecko, markets, rates, utils},
    error::Error,
};

pub async fn server_task(app_state: &AppState<State>) -> Result<(), Error> {
    let app = app_state.clone();
    tokio::spawn(async move {
        let server = init_server(app)?;
        server.await?;
        Ok(())
    })
    .await?
}

/// Route table of the read API.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v3")
            .service(gecko::source)
            .service(gecko::coin_ids)
            .service(markets::tickers_summary)
            .service(markets::last_traded)
            .service(markets::orderbook_extended)
            .service(markets::prices_24hr)
            .service(markets::volumes_24hr)
            .service(markets::volumes_14d)
            .service(rates::fixer_io)
            .service(rates::ticker_price)
            .service(utils::bouncer)
            .service(utils::cache_items)
            .service(utils::version),
    );
}

fn init_server(app_state: AppState<State>) -> Result<Server, Error> {
    let host = app_state.config.server_host.to_owned();
    let port = app_state.config.port;
    info!("Serving on {}:{}", host, port);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes)
    })
    .bind((host, port))?
    .disable_signals()
    .run();
    Ok(server)
}
