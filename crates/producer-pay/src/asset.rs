//! Token symbols and quantities

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Maximum symbol code length
pub const MAX_SYMBOL_CODE_LEN: usize = 7;

/// Token symbol: decimal precision in the low byte, uppercase code above it
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u64);

impl Symbol {
    pub fn new(code: &str, precision: u8) -> Result<Self> {
        if code.is_empty()
            || code.len() > MAX_SYMBOL_CODE_LEN
            || !code.bytes().all(|c| c.is_ascii_uppercase())
        {
            return Err(Error::InvalidSymbol(code.to_string()));
        }
        if precision > 18 {
            return Err(Error::InvalidSymbol(format!("{},{}", precision, code)));
        }

        Ok(Self::from_code_unchecked(code.as_bytes(), precision))
    }

    /// Build a symbol without validating the code. For constants.
    pub const fn from_code_unchecked(code: &[u8], precision: u8) -> Self {
        let mut raw = precision as u64;
        let mut i = 0;
        while i < code.len() {
            raw |= (code[i] as u64) << (8 * (i + 1));
            i += 1;
        }
        Self(raw)
    }

    pub fn precision(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn code(&self) -> String {
        let mut code = String::new();
        let mut tmp = self.0 >> 8;
        while tmp & 0xff != 0 {
            code.push((tmp & 0xff) as u8 as char);
            tmp >>= 8;
        }
        code
    }
}

impl FromStr for Symbol {
    type Err = Error;

    /// Parse `precision,CODE`, e.g. `4,CBSCH`
    fn from_str(s: &str) -> Result<Self> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| Error::InvalidSymbol(s.to_string()))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|_| Error::InvalidSymbol(s.to_string()))?;
        Self::new(code.trim(), precision)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            u64::deserialize(deserializer).map(Symbol)
        }
    }
}

/// Token quantity in fixed-point base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision() as u32;
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();

        if precision == 0 {
            return write!(f, "{}{} {}", sign, abs, self.symbol.code());
        }

        let scale = 10u64.pow(precision);
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / scale,
            abs % scale,
            self.symbol.code(),
            width = precision as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_parse() {
        let sym: Symbol = "4,CBSCH".parse().unwrap();
        assert_eq!(sym.precision(), 4);
        assert_eq!(sym.code(), "CBSCH");
        assert_eq!(sym.to_string(), "4,CBSCH");
    }

    #[test]
    fn test_symbol_rejects_bad_codes() {
        assert!("4,cbs".parse::<Symbol>().is_err());
        assert!("4,TOOLONGX".parse::<Symbol>().is_err());
        assert!("CBS".parse::<Symbol>().is_err());
        assert!("x,CBS".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_asset_display() {
        let sym: Symbol = "4,CBSCH".parse().unwrap();
        assert_eq!(Asset::new(6_000_000, sym).to_string(), "600.0000 CBSCH");
        assert_eq!(Asset::new(5, sym).to_string(), "0.0005 CBSCH");
        assert_eq!(Asset::new(-12_345, sym).to_string(), "-1.2345 CBSCH");

        let whole: Symbol = "0,VOTE".parse().unwrap();
        assert_eq!(Asset::new(42, whole).to_string(), "42 VOTE");
    }
}
