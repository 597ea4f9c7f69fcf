//! Domain primitives: Conid, TransactionId, Side, AssetCategory, OpenCloseFlag.

use serde::{Deserialize, Serialize};

/// Instrument contract id as reported by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Conid(pub i64);

impl Conid {
    /// Create a Conid from a raw id.
    pub fn new(id: i64) -> Self {
        Conid(id)
    }

    /// Get the underlying id value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Conid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broker transaction id. Globally unique per record; FIFO lots are ordered
/// by the originating transaction id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl TransactionId {
    /// Create a TransactionId from a raw id.
    pub fn new(id: i64) -> Self {
        TransactionId(id)
    }

    /// Get the underlying id value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade side: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy side.
    Buy,
    /// Sell side.
    Sell,
}

impl Side {
    /// Get the signed multiplier for this side (+1 for Buy, -1 for Sell).
    pub fn sign(&self) -> i32 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    /// Broker wire form ("BUY"/"SELL").
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Parse the broker wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broker asset category. `STK` and `OPT` drive the tax classification;
/// everything else passes through untagged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetCategory {
    /// Stock (`STK`).
    Stock,
    /// Option (`OPT`).
    Option,
    /// Any other category (futures, cash, ...), kept verbatim.
    Other(String),
}

impl AssetCategory {
    /// Broker wire form.
    pub fn as_str(&self) -> &str {
        match self {
            AssetCategory::Stock => "STK",
            AssetCategory::Option => "OPT",
            AssetCategory::Other(s) => s,
        }
    }
}

impl From<String> for AssetCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "STK" => AssetCategory::Stock,
            "OPT" => AssetCategory::Option,
            _ => AssetCategory::Other(s),
        }
    }
}

impl From<AssetCategory> for String {
    fn from(cat: AssetCategory) -> Self {
        cat.as_str().to_string()
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Open/close flag on a record.
///
/// Anything outside `Open`/`Close` is preserved as `Unknown` so the matcher
/// can abort the run on it rather than failing at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OpenCloseFlag {
    /// Opens a new lot.
    Open,
    /// Closes against the earliest open lot.
    Close,
    /// Corrupted or unexpected flag value.
    Unknown(String),
}

impl OpenCloseFlag {
    /// Broker wire form.
    pub fn as_str(&self) -> &str {
        match self {
            OpenCloseFlag::Open => "Open",
            OpenCloseFlag::Close => "Close",
            OpenCloseFlag::Unknown(s) => s,
        }
    }
}

impl From<String> for OpenCloseFlag {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Open" => OpenCloseFlag::Open,
            "Close" => OpenCloseFlag::Close,
            _ => OpenCloseFlag::Unknown(s),
        }
    }
}

impl From<OpenCloseFlag> for String {
    fn from(flag: OpenCloseFlag) -> Self {
        flag.as_str().to_string()
    }
}

impl std::fmt::Display for OpenCloseFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
