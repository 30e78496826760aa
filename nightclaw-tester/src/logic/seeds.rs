use anyhow::{Result, bail};

use super::policy::GameplayStrategy;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse seed tokens. Accepts decimal and `0x`-prefixed hexadecimal.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::with_capacity(tokens.len());
    for token in tokens {
        let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => token.parse::<u64>().ok(),
        };
        let Some(seed) = parsed else {
            bail!("Unrecognized seed token: {token}");
        };
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        bail!("At least one seed is required");
    }
    Ok(seeds)
}

/// Expand strategy keys; `all` selects every built-in strategy.
pub fn resolve_strategies(tokens: &[String]) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            for strategy in GameplayStrategy::ALL {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            continue;
        }
        let Some(strategy) = GameplayStrategy::from_key(token) else {
            bail!("Unknown strategy: {token} (see --list-strategies)");
        };
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        bail!("At least one strategy is required");
    }
    Ok(strategies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn resolves_decimal_and_hex_seeds() {
        let seeds = resolve_seed_inputs(&split_csv("1337, 0xff, 1337")).unwrap();
        assert_eq!(seeds, vec![1337, 255]);
        assert!(resolve_seed_inputs(&split_csv("banana")).is_err());
        assert!(resolve_seed_inputs(&[]).is_err());
    }

    #[test]
    fn all_expands_every_strategy_once() {
        let strategies = resolve_strategies(&split_csv("survivalist,all")).unwrap();
        assert_eq!(strategies.len(), GameplayStrategy::ALL.len());
        assert_eq!(strategies[0], GameplayStrategy::Survivalist);
        assert!(resolve_strategies(&split_csv("monte-carlo")).is_err());
    }
}
