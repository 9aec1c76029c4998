//! Well-known mainnet mints and their decimals.

use crate::Pubkey;

/// A mint this crate knows the decimals of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownToken {
    pub symbol: &'static str,
    pub mint: &'static str,
    pub decimals: u32,
}

impl KnownToken {
    /// Parsed mint address.
    pub fn pubkey(&self) -> Pubkey {
        self.mint.parse().unwrap()
    }
}

/// Wrapped SOL.
pub const SOL: KnownToken = KnownToken {
    symbol: "SOL",
    mint: "So11111111111111111111111111111111111111112",
    decimals: 9,
};

pub const USDC: KnownToken = KnownToken {
    symbol: "USDC",
    mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
    decimals: 6,
};

pub const USDT: KnownToken = KnownToken {
    symbol: "USDT",
    mint: "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
    decimals: 6,
};

/// Marinade staked SOL.
pub const MSOL: KnownToken = KnownToken {
    symbol: "MSOL",
    mint: "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So",
    decimals: 9,
};

/// Jito staked SOL.
pub const JITOSOL: KnownToken = KnownToken {
    symbol: "JITOSOL",
    mint: "J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn",
    decimals: 9,
};

pub const JUP: KnownToken = KnownToken {
    symbol: "JUP",
    mint: "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN",
    decimals: 6,
};

pub const BONK: KnownToken = KnownToken {
    symbol: "BONK",
    mint: "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
    decimals: 5,
};

pub const KNOWN_TOKENS: &[KnownToken] = &[SOL, USDC, USDT, MSOL, JITOSOL, JUP, BONK];

/// Looks up a token by symbol, case-insensitively.
pub fn by_symbol(symbol: &str) -> Option<&'static KnownToken> {
    KNOWN_TOKENS
        .iter()
        .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
}

/// Looks up a token by mint.
pub fn by_mint(mint: &Pubkey) -> Option<&'static KnownToken> {
    KNOWN_TOKENS.iter().find(|token| token.pubkey() == *mint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_mints_parse() {
        for token in KNOWN_TOKENS {
            assert!(token.mint.parse::<Pubkey>().is_ok(), "{}", token.symbol);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(by_symbol("usdc"), Some(&USDC));
        assert_eq!(by_mint(&MSOL.pubkey()).map(|t| t.decimals), Some(9));
        assert_eq!(by_symbol("DOGE"), None);
    }
}
