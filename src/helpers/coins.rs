use std::collections::{BTreeMap, BTreeSet};

use bigdecimal::{BigDecimal, Zero};

use crate::{
    error::Error,
    helpers::{decimal::parse_decimal, pair},
    types::{CoinsConfig, CoinsList, GeckoSource},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub ticker: String,
    pub platform: Option<String>,
    pub coin_type: String,
    pub is_testnet: bool,
    pub is_wallet_only: bool,
    pub has_segwit: bool,
    pub coingecko_id: Option<String>,
    pub usd_price: BigDecimal,
    pub usd_market_cap: BigDecimal,
}

impl Coin {
    pub fn is_tradable(&self) -> bool {
        !self.is_testnet && !self.is_wallet_only && self.coin_type != "Delisted"
    }
}

/// Coin metadata joined with the latest CoinGecko prices. Built per producer
/// run from the snapshots it was handed, never shared globally.
#[derive(Debug, Clone, Default)]
pub struct Coins {
    coins: BTreeMap<String, Coin>,
}

impl Coins {
    pub fn new(
        config: &CoinsConfig,
        coins: Option<&CoinsList>,
        gecko: Option<&GeckoSource>,
    ) -> Coins {
        let mut map = BTreeMap::new();

        for (ticker, item) in config {
            let coingecko_id = Some(item.coingecko_id.trim())
                .filter(|id| !id.is_empty() && *id != "test-coin")
                .map(str::to_owned);

            let (usd_price, usd_market_cap) = coingecko_id
                .as_ref()
                .and_then(|id| gecko.and_then(|source| source.get(id)))
                .map(|price| {
                    (
                        parse_decimal(&price.usd_price).unwrap_or_default(),
                        parse_decimal(&price.usd_market_cap).unwrap_or_default(),
                    )
                })
                .unwrap_or_default();

            let listed_wallet_only = coins
                .and_then(|list| list.get(ticker))
                .map(|entry| entry.wallet_only)
                .unwrap_or(false);

            let segwit = format!("{}-segwit", pair::deplatform_ticker(ticker));

            map.insert(
                ticker.to_owned(),
                Coin {
                    ticker: ticker.to_owned(),
                    platform: pair::platform(ticker).map(str::to_owned),
                    coin_type: item.coin_type.to_owned(),
                    is_testnet: item.is_testnet,
                    is_wallet_only: item.wallet_only || listed_wallet_only,
                    has_segwit: config.contains_key(&segwit),
                    coingecko_id,
                    usd_price,
                    usd_market_cap,
                },
            );
        }

        Coins { coins: map }
    }

    pub fn get(&self, ticker: &str) -> Result<&Coin, Error> {
        self.coins
            .get(ticker)
            .ok_or_else(|| Error::CoinNotFound(ticker.to_owned()))
    }

    pub fn tradable(&self, ticker: &str) -> Result<&Coin, Error> {
        let coin = self.get(ticker)?;
        if !coin.is_tradable() {
            return Err(Error::CoinWalletOnly(ticker.to_owned()));
        }
        Ok(coin)
    }

    pub fn is_tradable_pair(&self, base: &str, quote: &str) -> bool {
        self.tradable(base).is_ok() && self.tradable(quote).is_ok()
    }

    /// USD price of a ticker. Variants without their own price fall back to
    /// the deplatformed ticker.
    pub fn usd_price(&self, ticker: &str) -> BigDecimal {
        self.lookup(ticker, |coin| &coin.usd_price)
    }

    pub fn market_cap(&self, ticker: &str) -> BigDecimal {
        self.lookup(ticker, |coin| &coin.usd_market_cap)
    }

    fn lookup<F>(&self, ticker: &str, field: F) -> BigDecimal
    where
        F: Fn(&Coin) -> &BigDecimal,
    {
        let own = self
            .coins
            .get(ticker)
            .map(&field)
            .filter(|value| !value.is_zero());

        if let Some(value) = own {
            return value.clone();
        }

        self.coins
            .get(pair::deplatform_ticker(ticker))
            .map(&field)
            .cloned()
            .unwrap_or_else(BigDecimal::zero)
    }

    /// Orders two tickers as `(base, quote)`: the coin with the larger market
    /// cap is the quote, ties go alphabetical.
    pub fn standard_pair(&self, a: &str, b: &str) -> (String, String) {
        let cap_a = self.market_cap(a);
        let cap_b = self.market_cap(b);

        let a_is_quote = match cap_a.cmp(&cap_b) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => a > b,
        };

        if a_is_quote {
            (b.to_owned(), a.to_owned())
        } else {
            (a.to_owned(), b.to_owned())
        }
    }

    pub fn gecko_ids(&self) -> Vec<String> {
        self.coins
            .values()
            .filter_map(|coin| coin.coingecko_id.to_owned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    /// CoinGecko id -> tickers using it.
    pub fn gecko_coin_ids(&self) -> BTreeMap<String, Vec<String>> {
        let mut ids: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for coin in self.coins.values() {
            if let Some(id) = &coin.coingecko_id {
                ids.entry(id.to_owned())
                    .or_default()
                    .push(coin.ticker.to_owned());
            }
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}
