pub mod coins;
pub mod decimal;
pub mod inversion;
pub mod pair;
pub mod swaps;
pub mod templates;

use chrono::Utc;

pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

/// Splits a comma separated config value, dropping empty items.
pub fn parse_list(data: &str) -> Vec<String> {
    data.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("7777, 8762,"), vec!["7777", "8762"]);
        assert!(parse_list("").is_empty());
    }
}
