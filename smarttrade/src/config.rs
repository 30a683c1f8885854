//! Environment-driven configuration (spec §6.4), loaded once at startup so
//! no other crate in the workspace reads `std::env::var` directly.

use smarttrade_core::engine::supervisor::PairFilter;
use smarttrade_markets::Pair;

const DEFAULT_STATSD_HOST: &str = "statsd.infra";
const DEFAULT_STATSD_PORT: u16 = 8125;

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// `MODE`: `All`, `Bitcoin`, `Altcoins`, or an exact pair such as `ADA_USDT`.
    pub pair_filter: PairFilter,
    /// `LOCAL=true` restricts intake to a single account and relaxes lock
    /// timeouts/logging to development defaults.
    pub local: bool,
    /// Required when `local` is set; the only account this instance intakes for.
    pub account_id: Option<String>,
    pub statsd_host: String,
    pub statsd_port: u16,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        let mode = std::env::var("MODE").unwrap_or_else(|_| "All".to_string());
        let pair_filter = parse_mode(&mode);

        let local = std::env::var("LOCAL")
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let account_id = std::env::var("ACCOUNT_ID").ok();

        let statsd_host = std::env::var("STATSD_HOST").unwrap_or_else(|_| DEFAULT_STATSD_HOST.to_string());
        let statsd_port = std::env::var("STATSD_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_STATSD_PORT);

        Self {
            pair_filter,
            local,
            account_id,
            statsd_host,
            statsd_port,
        }
    }
}

fn parse_mode(mode: &str) -> PairFilter {
    match mode {
        "All" => PairFilter::All,
        "Bitcoin" => PairFilter::Bitcoin,
        "Altcoins" => PairFilter::Altcoins,
        exact => PairFilter::Exact(Pair::new(exact)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_mode_falls_back_to_an_exact_pair() {
        assert_eq!(parse_mode("ADA_USDT"), PairFilter::Exact(Pair::new("ADA_USDT")));
    }

    #[test]
    fn named_modes_parse_to_their_variant() {
        assert_eq!(parse_mode("All"), PairFilter::All);
        assert_eq!(parse_mode("Bitcoin"), PairFilter::Bitcoin);
        assert_eq!(parse_mode("Altcoins"), PairFilter::Altcoins);
    }
}
