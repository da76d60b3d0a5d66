//! Pair identifiers
//!
//! A pair is `BASE_QUOTE` where each side is a coin ticker, optionally carrying a
//! platform variant after the first dash (`LTC-segwit`, `USDC-BEP20`).

use crate::error::Error;

pub const MAX_PAIR_LENGTH: usize = 32;
pub const PAIR_SEPARATOR: char = '_';
pub const PLATFORM_SEPARATOR: char = '-';

pub fn validate_pair(pair: &str) -> Result<(), Error> {
    if pair.len() > MAX_PAIR_LENGTH {
        return Err(Error::BadPairFormat(format!(
            "{} is longer than {} characters",
            pair, MAX_PAIR_LENGTH
        )));
    }

    if pair.matches(PAIR_SEPARATOR).count() != 1 {
        return Err(Error::BadPairFormat(format!(
            "{} must contain exactly one '{}'",
            pair, PAIR_SEPARATOR
        )));
    }

    match pair.split_once(PAIR_SEPARATOR) {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Ok(()),
        _ => Err(Error::BadPairFormat(format!(
            "{} has an empty side",
            pair
        ))),
    }
}

pub fn base_quote(pair: &str) -> Result<(String, String), Error> {
    validate_pair(pair)?;
    let (base, quote) = pair
        .split_once(PAIR_SEPARATOR)
        .ok_or_else(|| Error::BadPairFormat(pair.to_owned()))?;

    Ok((base.to_owned(), quote.to_owned()))
}

pub fn join(base: &str, quote: &str) -> String {
    format!("{}{}{}", base, PAIR_SEPARATOR, quote)
}

/// Swaps base and quote. Strings without a separator are returned unchanged.
pub fn invert(pair: &str) -> String {
    match pair.split_once(PAIR_SEPARATOR) {
        Some((base, quote)) => join(quote, base),
        None => pair.to_owned(),
    }
}

pub fn deplatform_ticker(ticker: &str) -> &str {
    match ticker.split_once(PLATFORM_SEPARATOR) {
        Some((coin, _)) => coin,
        None => ticker,
    }
}

pub fn platform(ticker: &str) -> Option<&str> {
    ticker
        .split_once(PLATFORM_SEPARATOR)
        .map(|(_, platform)| platform)
}

pub fn deplatform(pair: &str) -> String {
    match pair.split_once(PAIR_SEPARATOR) {
        Some((base, quote)) => {
            join(deplatform_ticker(base), deplatform_ticker(quote))
        },
        None => deplatform_ticker(pair).to_owned(),
    }
}

pub fn suffix(days: u32) -> String {
    match days {
        1 => String::from("24h"),
        d => format!("{}d", d),
    }
}
