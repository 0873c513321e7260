//! Data models
//!
//! Rust structs representing pixel buffers, decoded symbols, and product
//! records.

mod pixel;
mod product;
mod symbol;

pub use pixel::PixelBuffer;
pub use product::{
    NormalizedProduct, NutrientEntry, NutrientKey, RawProductRecord, UnitMode, PLACEHOLDER_NAME,
};
pub use symbol::{DecodedSymbol, SymbolFormat};
