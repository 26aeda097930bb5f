// src/token_registry.rs
// Coin-type -> token symbol resolution for Sui type strings.
// Prioritized table lookup first (longest matching suffix pattern wins), then
// a heuristic parse of the last path segment, then a truncated raw identifier.
// Resolution never fails: an unrecognized token still values, at price zero.

/// Static metadata for a known token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub decimals: u8,
    pub stable: bool,
}

/// Default decimals for tokens the registry does not know.
pub const DEFAULT_COIN_DECIMALS: u8 = 9;

// Patterns are matched as substrings of the full Sui coin type
// (e.g. "0x2::sui::SUI"); the longest match takes priority.
const KNOWN_TOKENS: &[(&str, TokenInfo)] = &[
    ("::sui::SUI", TokenInfo { symbol: "SUI", decimals: 9, stable: false }),
    ("::usdc::USDC", TokenInfo { symbol: "USDC", decimals: 6, stable: true }),
    ("::usdt::USDT", TokenInfo { symbol: "USDT", decimals: 6, stable: true }),
    ("::cetus::CETUS", TokenInfo { symbol: "CETUS", decimals: 9, stable: false }),
    ("::eth::ETH", TokenInfo { symbol: "ETH", decimals: 8, stable: false }),
    ("::btc::BTC", TokenInfo { symbol: "BTC", decimals: 8, stable: false }),
    ("::apt::APT", TokenInfo { symbol: "APT", decimals: 8, stable: false }),
    ("::sol::SOL", TokenInfo { symbol: "SOL", decimals: 8, stable: false }),
    ("::bnb::BNB", TokenInfo { symbol: "BNB", decimals: 8, stable: false }),
    ("::tia::TIA", TokenInfo { symbol: "TIA", decimals: 6, stable: false }),
    ("::hasui::HASUI", TokenInfo { symbol: "HASUI", decimals: 9, stable: false }),
];

/// Outcome of resolving a coin type string.
///
/// The unknown branch keeps the raw identifier for display instead of
/// coercing to a guessed symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedToken {
    /// Matched the registry table.
    Known(&'static TokenInfo),
    /// Heuristic parse of the last `::` path segment.
    Parsed(String),
    /// Unparseable; truncated raw identifier.
    Unknown(String),
}

impl ResolvedToken {
    pub fn symbol(&self) -> &str {
        match self {
            ResolvedToken::Known(info) => info.symbol,
            ResolvedToken::Parsed(s) | ResolvedToken::Unknown(s) => s,
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            ResolvedToken::Known(info) => info.decimals,
            _ => DEFAULT_COIN_DECIMALS,
        }
    }

    pub fn is_stable(&self) -> bool {
        match self {
            ResolvedToken::Known(info) => info.stable,
            _ => false,
        }
    }
}

/// Resolve a Sui coin type string (e.g. `0x2::sui::SUI`) to a token.
pub fn resolve_coin_type(coin_type: &str) -> ResolvedToken {
    // Longest matching pattern wins so e.g. a wrapped-asset module cannot be
    // shadowed by a shorter generic pattern.
    let best = KNOWN_TOKENS
        .iter()
        .filter(|(pattern, _)| coin_type.contains(pattern))
        .max_by_key(|(pattern, _)| pattern.len());
    if let Some((_, info)) = best {
        return ResolvedToken::Known(info);
    }

    let parts: Vec<&str> = coin_type.split("::").collect();
    if parts.len() >= 3 {
        let last = parts[parts.len() - 1].trim_end_matches('>');
        if !last.is_empty() {
            return ResolvedToken::Parsed(last.to_string());
        }
    }

    let truncated: String = coin_type.chars().take(10).collect();
    ResolvedToken::Unknown(format!("{}...", truncated))
}

/// Stable designation by display symbol, for spot-price fallbacks on tokens
/// that did not come through the registry.
pub fn is_stable_symbol(symbol: &str) -> bool {
    matches!(symbol.to_ascii_uppercase().as_str(), "USDC" | "USDT")
}
