//! NutriScan Library
//!
//! Core functionality for barcode scanning and nutrition facts display.

pub mod build_info;
pub mod decode;
pub mod display;
pub mod models;
pub mod nutrition;
pub mod repository;
