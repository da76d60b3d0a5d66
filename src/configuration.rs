use std::{
    env, fs,
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tracing::warn;
use url::Url;

use crate::{
    cache::SnapshotStore,
    cache_keys::CacheName,
    error::Error,
    helpers::parse_list,
    provider::{GeoIp, SeedSync, SwapStore, HTTP},
    registry::Registry,
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

/// Application context: built once at boot and handed to every task and
/// request handler.
#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub http: HTTP,
    pub swaps: SwapStore,
    pub seed_sync: SeedSync,
    pub geo: GeoIp,
    pub registry: Registry,
    pub store: SnapshotStore,
}

impl State {
    pub fn new(config: Config, http: HTTP) -> Result<State, Error> {
        let swaps = SwapStore::new(&config);
        let seed_sync = SeedSync::new(&config);
        let geo = match GeoIp::load(&config.ip2location_db) {
            Ok(geo) => geo,
            Err(e) => {
                warn!(
                    "IP2Location database {} not loaded, bouncer allows everyone: {}",
                    config.ip2location_db.display(),
                    e
                );
                GeoIp::empty()
            },
        };
        let registry = Registry::new(&config)?;

        Ok(Self {
            config,
            http,
            swaps,
            seed_sync,
            geo,
            registry,
            store: SnapshotStore::new(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub port: u16,
    pub timeout: u64,
    pub is_testing: bool,
    pub cache_dir: PathBuf,
    pub mm2_db_dir: PathBuf,
    pub netids: Vec<u16>,
    pub seed_node_host: String,
    pub seed_node_user: String,
    pub seed_node_db_path: String,
    pub sync_interval: u64,
    pub coins_url: String,
    pub coins_config_url: String,
    pub coingecko_api: String,
    pub fixer_api: String,
    pub fixer_api_key: String,
    pub binance_api: String,
    pub kdf_rpc_url: String,
    pub kdf_userpass: String,
    pub ip2location_db: PathBuf,
    pub geo_blocklist: Vec<String>,
    pub coins_interval: u64,
    pub gecko_interval: u64,
    pub fixer_interval: u64,
    pub binance_interval: u64,
    pub pairs_interval: u64,
    pub tickers_interval: u64,
    pub retry_interval: u64,
    pub refresh_check_interval: u64,
    pub pairs_days: i64,
    pub fixer_max_age: i64,
    pub max_concurrent_requests: usize,
}

impl Config {
    pub fn ttl(&self, name: CacheName) -> Duration {
        let seconds = match name {
            CacheName::Coins | CacheName::CoinsConfig => self.coins_interval,
            CacheName::GeckoSource => self.gecko_interval,
            CacheName::FixerRates => self.fixer_interval,
            CacheName::BinancePrices => self.binance_interval,
            CacheName::PairLastTraded
            | CacheName::PairPrices24hr
            | CacheName::PairVolumes24hr
            | CacheName::PairVolumes14d
            | CacheName::PairOrderbookExtended => self.pairs_interval,
            CacheName::TickersSummary => self.tickers_interval,
        };

        Duration::from_secs(seconds)
    }

    /// Rejects values that would make a loop spin or a fan-out stall.
    pub fn validate(&self) -> Result<(), Error> {
        let positive = [
            ("SYNC_INTERVAL", self.sync_interval),
            ("COINS_INTERVAL", self.coins_interval),
            ("GECKO_INTERVAL", self.gecko_interval),
            ("FIXER_INTERVAL", self.fixer_interval),
            ("BINANCE_INTERVAL", self.binance_interval),
            ("PAIRS_INTERVAL", self.pairs_interval),
            ("TICKERS_INTERVAL", self.tickers_interval),
            ("RETRY_INTERVAL", self.retry_interval),
            ("REFRESH_CHECK_INTERVAL", self.refresh_check_interval),
            ("MAX_CONCURRENT_REQUESTS", self.max_concurrent_requests as u64),
        ];

        for (key, value) in positive {
            if value == 0 {
                return Err(Error::ConfigurationError(format!(
                    "{} must be positive",
                    key
                )));
            }
        }

        if self.pairs_days <= 0 || self.fixer_max_age <= 0 {
            return Err(Error::ConfigurationError(String::from(
                "PAIRS_DAYS and FIXER_MAX_AGE must be positive",
            )));
        }

        Ok(())
    }

    pub fn cache_file_path(&self, name: CacheName) -> PathBuf {
        self.cache_dir.join(name.file_name())
    }

    pub fn netid_dir(&self, netid: u16) -> PathBuf {
        self.mm2_db_dir.join(netid.to_string())
    }

    pub fn kdf_enabled(&self) -> bool {
        !self.kdf_rpc_url.is_empty()
    }

    pub fn coingecko_list_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}/coins/list", self.coingecko_api))?)
    }

    pub fn coingecko_markets_url(&self, ids: &[String]) -> Result<Url, Error> {
        let per_page = ids.len().max(1).to_string();
        let url = Url::parse_with_params(
            &format!("{}/coins/markets", self.coingecko_api),
            &[
                ("vs_currency", "usd"),
                ("ids", ids.join(",").as_str()),
                ("per_page", per_page.as_str()),
                ("page", "1"),
            ],
        )?;

        Ok(url)
    }

    pub fn fixer_latest_url(&self) -> Result<Url, Error> {
        let url = Url::parse_with_params(
            &format!("{}/latest", self.fixer_api),
            &[("access_key", self.fixer_api_key.as_str())],
        )?;

        Ok(url)
    }

    pub fn binance_ticker_price_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}/ticker/price", self.binance_api))?)
    }

    pub fn kdf_rpc_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&self.kdf_rpc_url)?)
    }

    /// Config rooted in a scratch directory, every upstream disabled.
    #[cfg(test)]
    pub fn for_tests(dir: &Path) -> Config {
        Config {
            server_host: String::from("127.0.0.1"),
            port: 0,
            timeout: 1,
            is_testing: true,
            cache_dir: dir.join("cache"),
            mm2_db_dir: dir.join("DB"),
            netids: vec![7777, 8762],
            seed_node_host: String::new(),
            seed_node_user: String::new(),
            seed_node_db_path: String::new(),
            sync_interval: 60,
            coins_url: String::from("http://127.0.0.1:9/coins"),
            coins_config_url: String::from("http://127.0.0.1:9/coins_config.json"),
            coingecko_api: String::from("http://127.0.0.1:9/gecko"),
            fixer_api: String::from("http://127.0.0.1:9/fixer"),
            fixer_api_key: String::new(),
            binance_api: String::from("http://127.0.0.1:9/binance"),
            kdf_rpc_url: String::new(),
            kdf_userpass: String::new(),
            ip2location_db: dir.join("IP2LOCATION-LITE-DB1.IPV6.CSV"),
            geo_blocklist: vec![String::from("IR"), String::from("KP")],
            coins_interval: 86400,
            gecko_interval: 600,
            fixer_interval: 600,
            binance_interval: 60,
            pairs_interval: 60,
            tickers_interval: 60,
            retry_interval: 30,
            refresh_check_interval: 5,
            pairs_days: 30,
            fixer_max_age: 900,
            max_concurrent_requests: 4,
        }
    }
}

fn resolve_path(value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    Path::new(env!("CARGO_MANIFEST_DIR")).join(path)
}

pub fn get_configuration() -> Result<Config, Error> {
    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let timeout = env::var("TIMEOUT")?.parse()?;
    let is_testing: bool = env::var("IS_TESTING")?.parse()?;

    let mut cache_dir = resolve_path(&env::var("CACHE_DIRECTORY")?);
    if is_testing {
        cache_dir = cache_dir.join("tests");
    }
    let mm2_db_dir = resolve_path(&env::var("MM2_DB_DIRECTORY")?);

    let mut netids = vec![];
    for netid in parse_list(&env::var("NETIDS")?) {
        netids.push(netid.parse::<u16>()?);
    }
    if netids.is_empty() {
        return Err(Error::ConfigurationError(String::from(
            "NETIDS must name at least one netid",
        )));
    }

    let seed_node_host = env::var("SEED_NODE_HOST")?;
    let seed_node_user = env::var("SEED_NODE_USER")?;
    let seed_node_db_path = env::var("SEED_NODE_DB_PATH")?;
    let sync_interval = env::var("SYNC_INTERVAL")?.parse()?;

    let coins_url = env::var("COINS_URL")?;
    let coins_config_url = env::var("COINS_CONFIG_URL")?;
    let coingecko_api = env::var("COINGECKO_API")?;
    let fixer_api = env::var("FIXER_API")?;
    let fixer_api_key = env::var("FIXER_API_KEY")?;
    let binance_api = env::var("BINANCE_API")?;
    let kdf_rpc_url = env::var("KDF_RPC_URL")?;
    let kdf_userpass = env::var("KDF_USERPASS")?;

    let ip2location_db = resolve_path(&env::var("IP2LOCATION_DB")?);
    let geo_blocklist = parse_list(&env::var("GEO_BLOCKLIST")?)
        .into_iter()
        .map(|code| code.to_uppercase())
        .collect();

    let coins_interval = env::var("COINS_INTERVAL")?.parse()?;
    let gecko_interval = env::var("GECKO_INTERVAL")?.parse()?;
    let fixer_interval = env::var("FIXER_INTERVAL")?.parse()?;
    let binance_interval = env::var("BINANCE_INTERVAL")?.parse()?;
    let pairs_interval = env::var("PAIRS_INTERVAL")?.parse()?;
    let tickers_interval = env::var("TICKERS_INTERVAL")?.parse()?;
    let retry_interval = env::var("RETRY_INTERVAL")?.parse()?;
    let refresh_check_interval = env::var("REFRESH_CHECK_INTERVAL")?.parse()?;
    let pairs_days = env::var("PAIRS_DAYS")?.parse()?;
    let fixer_max_age = env::var("FIXER_MAX_AGE")?.parse()?;
    let max_concurrent_requests = env::var("MAX_CONCURRENT_REQUESTS")?.parse()?;

    let config = Config {
        server_host,
        port,
        timeout,
        is_testing,
        cache_dir,
        mm2_db_dir,
        netids,
        seed_node_host,
        seed_node_user,
        seed_node_db_path,
        sync_interval,
        coins_url,
        coins_config_url,
        coingecko_api,
        fixer_api,
        fixer_api_key,
        binance_api,
        kdf_rpc_url,
        kdf_userpass,
        ip2location_db,
        geo_blocklist,
        coins_interval,
        gecko_interval,
        fixer_interval,
        binance_interval,
        pairs_interval,
        tickers_interval,
        retry_interval,
        refresh_check_interval,
        pairs_days,
        fixer_max_age,
        max_concurrent_requests,
    };
    config.validate()?;

    Ok(config)
}

/// Loads `stats.conf` and, when present, `.env` into the process environment.
/// Variables already set in the real environment win.
pub fn set_configuration() -> Result<(), Error> {
    let directory = env!("CARGO_MANIFEST_DIR");
    let stats_config_path = format!("{}/{}", directory, "stats.conf");
    let env_path = format!("{}/{}", directory, ".env");

    let mut params = vec![];

    if let Ok(env_string) = fs::read_to_string(env_path) {
        params.extend(parse_config_string(&env_string));
    }

    let stats_config_string = fs::read_to_string(stats_config_path)?;
    params.extend(parse_config_string(&stats_config_string));

    for (key, value) in params {
        if env::var_os(&key).is_none() {
            env::set_var(key, value);
        }
    }

    Ok(())
}

fn parse_config_string(config: &str) -> Vec<(String, String)> {
    config
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_string() {
        let params = parse_config_string(
            "# comment\nPORT=7068\n\nCOINS_URL=https://a/b?c=d\nEMPTY=\nbroken",
        );
        assert_eq!(
            params,
            vec![
                (String::from("PORT"), String::from("7068")),
                (String::from("COINS_URL"), String::from("https://a/b?c=d")),
                (String::from("EMPTY"), String::new()),
            ]
        );
    }

    #[test]
    fn test_urls() {
        let config = Config::for_tests(Path::new("/tmp"));
        let markets = config
            .coingecko_markets_url(&[String::from("komodo"), String::from("litecoin")])
            .unwrap();
        assert_eq!(markets.path(), "/gecko/coins/markets");
        assert!(markets
            .query()
            .unwrap()
            .contains("ids=komodo%2Clitecoin"));

        let fixer = config.fixer_latest_url().unwrap();
        assert_eq!(fixer.query(), Some("access_key="));
    }

    #[test]
    fn test_ttl() {
        let config = Config::for_tests(Path::new("/tmp"));
        assert_eq!(config.ttl(CacheName::Coins), Duration::from_secs(86400));
        assert_eq!(config.ttl(CacheName::FixerRates), Duration::from_secs(600));
        assert_eq!(
            config.cache_file_path(CacheName::TickersSummary),
            PathBuf::from("/tmp/cache/tickers_summary.json")
        );
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let config = Config::for_tests(Path::new("/tmp"));
        assert!(config.validate().is_ok());

        let retry = Config {
            retry_interval: 0,
            ..config.clone()
        };
        match retry.validate() {
            Err(Error::ConfigurationError(message)) => {
                assert!(message.contains("RETRY_INTERVAL"))
            },
            other => panic!("unexpected {:?}", other),
        }

        let sync = Config {
            sync_interval: 0,
            ..config.clone()
        };
        assert!(matches!(sync.validate(), Err(Error::ConfigurationError(_))));

        let days = Config {
            pairs_days: 0,
            ..config
        };
        assert!(matches!(days.validate(), Err(Error::ConfigurationError(_))));
    }
}
