use std::{
    io::Read,
    net::{IpAddr, Ipv6Addr},
    path::Path,
};

use serde::Deserialize;
use tracing::info;

use crate::error::Error;

const UNKNOWN_COUNTRY: &str = "-";

#[derive(Debug, Deserialize)]
struct GeoRow {
    ip_from: u128,
    ip_to: u128,
    country_code: String,
    #[allow(dead_code)]
    country_name: String,
}

/// In-process IP2Location LITE (DB1) lookup.
#[derive(Debug, Default)]
pub struct GeoIp {
    ranges: Vec<(u128, u128, String)>,
}

impl GeoIp {
    pub fn empty() -> GeoIp {
        GeoIp::default()
    }

    pub fn load(path: &Path) -> Result<GeoIp, Error> {
        let file = std::fs::File::open(path)?;
        let geo = Self::from_reader(file)?;
        info!("Loaded {} IP ranges from {}", geo.len(), path.display());
        Ok(geo)
    }

    /// Rows are `"ip_from","ip_to","country_code","country_name"`, no header.
    pub fn from_reader<R: Read>(reader: R) -> Result<GeoIp, Error> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader);

        let mut ranges = vec![];
        for row in csv.deserialize::<GeoRow>() {
            let row = row?;
            if row.country_code == UNKNOWN_COUNTRY {
                continue;
            }
            ranges.push((row.ip_from, row.ip_to, row.country_code));
        }
        ranges.sort_by_key(|(from, _, _)| *from);

        Ok(GeoIp { ranges })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// ISO country code of an address, if known.
    pub fn country(&self, ip: IpAddr) -> Option<&str> {
        let candidates: Vec<u128> = match ip {
            IpAddr::V4(v4) => {
                vec![u128::from(u32::from(v4)), u128::from(v4.to_ipv6_mapped())]
            },
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => vec![u128::from(v6), u128::from(u32::from(v4))],
                None => vec![u128::from(v6)],
            },
        };

        candidates.into_iter().find_map(|number| self.find(number))
    }

    fn find(&self, number: u128) -> Option<&str> {
        let index = self.ranges.partition_point(|(from, _, _)| *from <= number);
        if index == 0 {
            return None;
        }

        let (_, to, code) = &self.ranges[index - 1];
        if number <= *to {
            return Some(code.as_str());
        }
        None
    }
}

/// Client address as reported by the reverse proxy, port stripped.
pub fn parse_client_ip(value: &str) -> Option<IpAddr> {
    if let Ok(ip) = value.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(socket) = value.parse::<std::net::SocketAddr>() {
        return Some(socket.ip());
    }
    value
        .trim_start_matches('[')
        .split(']')
        .next()
        .and_then(|v| v.parse::<Ipv6Addr>().ok())
        .map(IpAddr::V6)
}
