//! Conversions between raw integer base units and decimal display amounts.
//!
//! Every monetary field an adapter returns goes through this module. Amounts are
//! held as [`rust_decimal::Decimal`], never as binary floating point.
//!
//! ```
//! use solsdk::units::{from_base_units, to_base_units};
//! use rust_decimal::dec;
//!
//! // 1.5 SOL in lamports
//! assert_eq!(to_base_units(dec!(1.5), 9).unwrap(), 1_500_000_000);
//! assert_eq!(from_base_units(1_500_000_000, 9).unwrap(), dec!(1.5));
//! ```

use std::fmt;

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::{Error, Result};

/// Largest scale the decimal type can represent.
pub const MAX_DECIMALS: u32 = 28;

/// Decimals of native SOL (lamports).
pub const SOL_DECIMALS: u32 = 9;

/// Basis points in one whole.
pub const BPS_DENOMINATOR: u64 = 10_000;

const OP: &str = "units";

#[inline]
fn check_decimals(decimals: u32) -> Result<()> {
    if decimals > MAX_DECIMALS {
        return Err(Error::invalid_argument(
            OP,
            format!("decimals {decimals} exceeds maximum of {MAX_DECIMALS}"),
        ));
    }
    Ok(())
}

/// Converts a display amount to signed base units, truncating toward zero.
///
/// Use this only where negative amounts are meaningful upstream (PnL, funding).
pub fn to_signed_base_units(display: Decimal, decimals: u32) -> Result<i128> {
    check_decimals(decimals)?;
    let mut value = display.round_dp_with_strategy(decimals, RoundingStrategy::ToZero);
    value.rescale(decimals);
    // rescale settles on a smaller scale when the mantissa would overflow
    if value.scale() != decimals {
        return Err(Error::invalid_argument(
            OP,
            format!("{display} does not fit with {decimals} decimals"),
        ));
    }
    Ok(value.mantissa())
}

/// Converts a display amount to base units, truncating toward zero.
///
/// Negative amounts are rejected with `InvalidArgument`.
pub fn to_base_units(display: Decimal, decimals: u32) -> Result<u64> {
    if display.is_sign_negative() && !display.is_zero() {
        return Err(Error::invalid_argument(
            OP,
            format!("negative amount {display} not allowed"),
        ));
    }
    let raw = to_signed_base_units(display, decimals)?;
    u64::try_from(raw).map_err(|_| {
        Error::invalid_argument(OP, format!("{display} overflows u64 base units"))
    })
}

/// Converts base units to a display amount. Exact.
pub fn from_base_units(raw: u64, decimals: u32) -> Result<Decimal> {
    check_decimals(decimals)?;
    Ok(Decimal::from_i128_with_scale(i128::from(raw), decimals).normalize())
}

/// Converts signed base units to a display amount. Exact.
pub fn from_signed_base_units(raw: i128, decimals: u32) -> Result<Decimal> {
    check_decimals(decimals)?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .map(|value| value.normalize())
        .map_err(|err| Error::invalid_argument(OP, format!("{raw}e-{decimals}: {err}")))
}

/// Scales an oracle mantissa by a base-10 exponent, `mantissa * 10^expo`.
pub fn from_exponent(mantissa: i64, expo: i32) -> Result<Decimal> {
    if expo <= 0 {
        return from_signed_base_units(i128::from(mantissa), expo.unsigned_abs());
    }
    let factor = Decimal::TEN
        .checked_powu(u64::from(expo.unsigned_abs()))
        .ok_or_else(|| Error::invalid_argument(OP, format!("exponent {expo} overflows")))?;
    Decimal::from(mantissa)
        .checked_mul(factor)
        .ok_or_else(|| Error::invalid_argument(OP, format!("{mantissa}e{expo} overflows")))
}

/// Parses a decimal string sent by an upstream, e.g. `"145.2301"` or `"1.2e-7"`.
///
/// Unparseable input is a malformed upstream body and classifies as `Unknown`.
pub fn ui_amount_to_decimal(value: &str) -> Result<Decimal> {
    let value = value.trim();
    Decimal::from_str_exact(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map(|value| value.normalize())
        .map_err(|err| Error::malformed(OP, format!("{value:?}: {err}")))
}

/// Returns `floor(amount * bps / 10_000)`.
#[must_use]
pub fn bps_of(amount: u64, bps: u16) -> u64 {
    // saturates only when bps > 10_000
    let value = u128::from(amount) * u128::from(bps) / u128::from(BPS_DENOMINATOR);
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// An unsigned token amount in base units together with its decimals.
///
/// The display value is always derived from `raw` and `decimals`.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAmount")]
pub struct Amount {
    #[serde_as(as = "DisplayFromStr")]
    raw: u64,
    decimals: u32,
}

#[serde_as]
#[derive(Deserialize)]
struct RawAmount {
    #[serde_as(as = "DisplayFromStr")]
    raw: u64,
    decimals: u32,
}

impl TryFrom<RawAmount> for Amount {
    type Error = Error;

    fn try_from(value: RawAmount) -> Result<Self> {
        Self::new(value.raw, value.decimals)
    }
}

impl Amount {
    /// Creates an amount from base units.
    pub fn new(raw: u64, decimals: u32) -> Result<Self> {
        check_decimals(decimals)?;
        Ok(Self { raw, decimals })
    }

    /// Creates an amount of native SOL from lamports.
    #[must_use]
    pub const fn lamports(raw: u64) -> Self {
        Self {
            raw,
            decimals: SOL_DECIMALS,
        }
    }

    /// Creates an amount from a display value, truncating toward zero.
    pub fn from_display(display: Decimal, decimals: u32) -> Result<Self> {
        let raw = to_base_units(display, decimals)?;
        Ok(Self { raw, decimals })
    }

    /// Raw base units.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.raw
    }

    /// Number of decimals.
    #[must_use]
    pub const fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.raw == 0
    }

    /// Display value, `raw / 10^decimals`.
    #[must_use]
    pub fn display(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.raw), self.decimals).normalize()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// A signed amount in base units, for values that can go negative (PnL, positions).
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSignedAmount")]
pub struct SignedAmount {
    #[serde_as(as = "DisplayFromStr")]
    raw: i128,
    decimals: u32,
}

#[serde_as]
#[derive(Deserialize)]
struct RawSignedAmount {
    #[serde_as(as = "DisplayFromStr")]
    raw: i128,
    decimals: u32,
}

impl TryFrom<RawSignedAmount> for SignedAmount {
    type Error = Error;

    fn try_from(value: RawSignedAmount) -> Result<Self> {
        Self::new(value.raw, value.decimals)
    }
}

impl SignedAmount {
    /// Creates a signed amount, rejecting values the decimal type cannot hold.
    pub fn new(raw: i128, decimals: u32) -> Result<Self> {
        from_signed_base_units(raw, decimals)?;
        Ok(Self { raw, decimals })
    }

    /// Raw base units.
    #[must_use]
    pub const fn raw(&self) -> i128 {
        self.raw
    }

    /// Number of decimals.
    #[must_use]
    pub const fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Display value, `raw / 10^decimals`.
    #[must_use]
    pub fn display(&self) -> Decimal {
        // validated in `new`
        Decimal::try_from_i128_with_scale(self.raw, self.decimals)
            .map(|value| value.normalize())
            .unwrap_or_default()
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
