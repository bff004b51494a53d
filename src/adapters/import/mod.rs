//! Upload readers for the bulk task importer.

pub mod spreadsheet;

pub use spreadsheet::read_grid;
