pub use self::{
    database::{merge_swaps, NetId, SwapStore},
    geo::{parse_client_ip, GeoIp},
    http::{Fetched, HTTP},
    synchronization::SeedSync,
};

mod database;
mod geo;
mod http;
mod synchronization;

#[cfg(test)]
pub(crate) use self::{database::tests::write_replica, geo::tests::SAMPLE_CSV};
