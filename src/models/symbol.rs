//! Decoded symbol model

use serde::{Deserialize, Serialize};

/// Barcode symbology of a decoded payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolFormat {
    Qr,
    Ean13,
    Ean8,
    UpcA,
    Code128,
    Unknown,
}

impl SymbolFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolFormat::Qr => "QR",
            SymbolFormat::Ean13 => "EAN-13",
            SymbolFormat::Ean8 => "EAN-8",
            SymbolFormat::UpcA => "UPC-A",
            SymbolFormat::Code128 => "Code 128",
            SymbolFormat::Unknown => "unknown",
        }
    }
}

/// A successfully decoded symbol
///
/// `text` is never empty; a structural match that yields no payload is
/// reported as a decode failure instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedSymbol {
    pub text: String,
    pub format: SymbolFormat,
}

impl DecodedSymbol {
    pub fn new(text: impl Into<String>, format: SymbolFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}
