use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, One, Zero};

use crate::{
    configuration::{AppState, State},
    error::Error,
    helpers::decimal::{decimal_from_number, format_10f, safe_div},
    types::{FixerRates, FixerResponse},
};

pub const USD: &str = "USD";
pub const DATA_EXPIRED: &str = "Data expired";

pub async fn build_fixer_rates(
    app_state: &AppState<State>,
) -> Result<FixerRates, Error> {
    let fetched = app_state.http.get_fixer_latest().await?;
    fixer_rates(fetched.data)
}

/// Validates a Fixer response and re-bases its rates to USD.
pub fn fixer_rates(response: FixerResponse) -> Result<FixerRates, Error> {
    if !response.success {
        let cause = response
            .error
            .map(|e| format!("{} {}: {}", e.code, e.kind, e.info))
            .unwrap_or_else(|| String::from("fixer request unsuccessful"));
        return Err(Error::Upstream(cause));
    }

    let timestamp = response
        .timestamp
        .ok_or_else(|| Error::UpstreamDecode(String::from("fixer response has no timestamp")))?;
    let rates = response
        .rates
        .ok_or_else(|| Error::UpstreamDecode(String::from("fixer response has no rates")))?;
    let base = response.base.unwrap_or_else(|| String::from("EUR"));

    let mut decimals = BTreeMap::new();
    for (code, rate) in &rates {
        decimals.insert(code.to_owned(), decimal_from_number(rate)?);
    }

    let usd_rate = if base == USD {
        BigDecimal::one()
    } else {
        decimals.get(USD).cloned().unwrap_or_else(BigDecimal::zero)
    };
    if usd_rate.is_zero() {
        return Err(Error::UpstreamDecode(format!(
            "fixer response has no USD rate for base {}",
            base
        )));
    }

    let mut rebased: BTreeMap<String, String> = decimals
        .iter()
        .map(|(code, rate)| (code.to_owned(), format_10f(&safe_div(rate, &usd_rate))))
        .collect();
    rebased.insert(base, format_10f(&safe_div(&BigDecimal::one(), &usd_rate)));
    rebased.insert(String::from(USD), format_10f(&BigDecimal::one()));

    Ok(FixerRates {
        timestamp,
        date: response.date.unwrap_or_default(),
        base: String::from(USD),
        rates: rebased,
    })
}

/// Rates older than `max_age` seconds are not served.
pub fn check_fresh(rates: &FixerRates, now: i64, max_age: i64) -> Result<(), Error> {
    if now - rates.timestamp > max_age {
        return Err(Error::UpstreamStale(String::from(DATA_EXPIRED)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> FixerResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_rebase_to_usd() {
        let rates = fixer_rates(response(
            r#"{"success":true,"timestamp":1700000000,"base":"EUR","date":"2023-11-14",
                "rates":{"USD":1.25,"GBP":0.875,"EUR":1}}"#,
        ))
        .unwrap();

        assert_eq!(rates.base, "USD");
        assert_eq!(rates.rates["USD"], "1.0000000000");
        assert_eq!(rates.rates["GBP"], "0.7000000000");
        assert_eq!(rates.rates["EUR"], "0.8000000000");
        assert_eq!(rates.date, "2023-11-14");
    }

    #[test]
    fn test_invalid_responses() {
        assert!(matches!(
            fixer_rates(response(r#"{"success":true,"rates":{"USD":1}}"#)),
            Err(Error::UpstreamDecode(_))
        ));
        assert!(matches!(
            fixer_rates(response(
                r#"{"success":false,"error":{"code":101,"type":"invalid_access_key","info":"bad key"}}"#
            )),
            Err(Error::Upstream(_))
        ));
        assert!(matches!(
            fixer_rates(response(
                r#"{"success":true,"timestamp":1,"base":"EUR","rates":{"GBP":0.8}}"#
            )),
            Err(Error::UpstreamDecode(_))
        ));
    }

    #[test]
    fn test_check_fresh() {
        let mut rates = crate::helpers::templates::fixer_rates();
        rates.timestamp = 10_000;

        assert!(check_fresh(&rates, 10_900, 900).is_ok());
        let stale = check_fresh(&rates, 11_000, 900).unwrap_err();
        assert!(matches!(stale, Error::UpstreamStale(_)));
        assert_eq!(stale.to_string(), DATA_EXPIRED);
    }
}
