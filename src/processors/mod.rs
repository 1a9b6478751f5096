//! File processors

pub mod export;
