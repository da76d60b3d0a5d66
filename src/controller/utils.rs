//! Utility API endpoints
//!
//! Geo bouncer, cache introspection and version.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    configuration::{AppState, State},
    error::Error,
    provider::parse_client_ip,
    registry,
};

// =============================================================================
// Bouncer
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct BouncerResponse {
    pub ip: Option<String>,
    pub country: Option<String>,
}

/// 403 when the client resolves to a blocklisted country. Unresolvable
/// clients are let through.
#[get("/utils/bouncer")]
pub async fn bouncer(
    state: web::Data<AppState<State>>,
    req: HttpRequest,
) -> Result<impl Responder, Error> {
    let info = req.connection_info();
    let ip = info.realip_remote_addr().and_then(parse_client_ip);
    let country = ip.and_then(|ip| state.geo.country(ip)).map(str::to_owned);

    if let Some(code) = &country {
        if state.config.geo_blocklist.contains(code) {
            debug!("Bouncer rejected {:?} from {}", ip, code);
            return Err(Error::GeoRestricted(code.to_owned()));
        }
    }

    Ok(web::Json(BouncerResponse {
        ip: ip.map(|ip| ip.to_string()),
        country,
    }))
}

// =============================================================================
// Cache items
// =============================================================================

#[get("/utils/cache_items")]
pub async fn cache_items(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data = registry::list(&state).await?;
    Ok(HttpResponse::Ok().json(data))
}

// =============================================================================
// Version
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse<'a> {
    pub version: Option<&'a str>,
}

#[get("/utils/version")]
pub async fn version() -> Result<impl Responder, Error> {
    const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

    Ok(web::Json(VersionResponse { version: VERSION }))
}
