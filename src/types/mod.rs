pub use self::{
    binance::{BinancePrices, BinanceTickerPrice},
    coin_gecko::{GeckoCoin, GeckoMarket, GeckoPrice, GeckoSource},
    coins_config::{CoinConfig, CoinsConfig, CoinsFileEntry, CoinsList},
    fixer::{FixerError, FixerRates, FixerResponse},
    orderbook::{KdfOrder, KdfOrderbook, KdfOrderbookRequest},
    pair_views::{
        OrderbookEntry, PairLastTraded, PairMap, PairOrderbookExtended,
        PairPrices, PairVolume,
    },
    tickers_summary::{TickerItem, TickersSummary},
};

mod binance;
mod coin_gecko;
mod coins_config;
mod fixer;
mod orderbook;
mod pair_views;
mod tickers_summary;
