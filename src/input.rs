//! Sources of translation bundles.

pub mod translation;
