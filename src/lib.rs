//! blocksocial-i18n
//!
//! Internationalization core of the Blockchain Social Network frontend:
//! per-locale resource store, locale resolution and URL synchronization,
//! total translation accessors, and translation completeness checks.

pub mod checker;
pub mod config;
pub mod engine;
pub mod env;
pub mod input;
pub mod interpolate;
pub mod locale;
pub mod resolver;
pub mod service;
pub mod store;
pub mod tree;

pub use checker::{
    CheckerError,
    LocaleReport,
    MissingKeysReport,
};
pub use engine::{
    BundleEngine,
    LookupError,
    TranslationEngine,
};
pub use interpolate::Params;
pub use locale::{
    Locale,
    Locales,
    TextDirection,
};
pub use service::{
    SyncOutcome,
    TranslationService,
};
pub use store::ResourceStore;
pub use tree::TranslationTree;
