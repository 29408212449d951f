//! End-to-end tests: bundles loaded from disk through the translation service.

#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use std::fs;
use std::path::Path;

use blocksocial_i18n::config::{
    CONFIG_FILE_NAME,
    ConfigManager,
};
use blocksocial_i18n::env::{
    Environment,
    FilePreferenceStore,
    History,
    MemoryHistory,
    MemoryPreferenceStore,
    PreferenceStore,
    StaticLanguagePreferences,
};
use blocksocial_i18n::input::translation::DirectorySource;
use blocksocial_i18n::resolver::extract_locale_from_path;
use blocksocial_i18n::{
    Locales,
    Params,
    ResourceStore,
    SyncOutcome,
    TranslationService,
};
use googletest::prelude::*;
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct Phase {
    title: String,
    items: Vec<String>,
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Workspace with English and German bundles plus a broken Russian one.
fn workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write(
        root,
        CONFIG_FILE_NAME,
        r#"{"localesDir": "public/locales", "preferenceFile": ".state/locale"}"#,
    );
    write(
        root,
        "public/locales/en/translation.json",
        r#"{
            "common": {"hello": "Hello", "reserve": "Reserve {amount} BSN"},
            "aboutPage": {"team": {"title": "Our team"}},
            "roadmap": {"phases": [{"title": "Genesis", "items": ["Testnet", "Faucet"]}]}
        }"#,
    );
    write(
        root,
        "public/locales/de/translation.jsonc",
        r#"{
            // partial translation
            "common": {"hello": "Hallo", "reserve": "{amount} BSN reservieren",},
        }"#,
    );
    write(root, "public/locales/ru/translation.json", "{ not json");
    temp_dir
}

struct Loaded {
    locales: Locales,
    store: ResourceStore,
    preference_file: std::path::PathBuf,
}

async fn load(root: &Path) -> Loaded {
    let mut config = ConfigManager::new();
    config.load_settings(Some(root.to_path_buf())).unwrap();
    let settings = config.get_settings();
    let locales = settings.build_locales().unwrap();
    let source =
        DirectorySource::discover(&config.locales_dir(), &settings.file_pattern, &locales).unwrap();
    let store = ResourceStore::load(&source, &locales).await;
    Loaded { locales, store, preference_file: config.preference_file().unwrap() }
}

#[tokio::test]
async fn lookups_against_bundles_on_disk() {
    let temp_dir = workspace();
    let loaded = load(temp_dir.path()).await;
    let history = MemoryHistory::new("/de/faucet");
    let env = Environment::new(
        history,
        MemoryPreferenceStore::default(),
        StaticLanguagePreferences::default(),
    );
    let service = TranslationService::new(loaded.locales, loaded.store, env);
    let params = Params::new().with("amount", 250);

    assert_that!(service.active_locale().code, eq("de"));
    assert_that!(service.translate("common.reserve", "Reserve", &params), eq("250 BSN reservieren"));
    // present in English only: no cross-locale fallback
    assert_that!(service.translate("aboutPage.team.title", "Team", &params), eq("Team"));
    assert_that!(service.translate("nowhere.at.all", "Fallback", &params), eq("Fallback"));
}

#[tokio::test]
async fn broken_bundle_degrades_to_fallbacks() {
    let temp_dir = workspace();
    let loaded = load(temp_dir.path()).await;
    let env = Environment::new(
        MemoryHistory::new("/ru"),
        MemoryPreferenceStore::default(),
        StaticLanguagePreferences::default(),
    );
    let service = TranslationService::new(loaded.locales, loaded.store, env);

    assert_that!(service.store().tree("ru").map(|tree| tree.is_empty()), some(eq(true)));
    assert_that!(service.translate("common.hello", "Hello", &Params::new()), eq("Hello"));
    assert_that!(
        service.translate_object("roadmap.phases", Vec::<Phase>::new()),
        is_empty()
    );
}

#[tokio::test]
async fn structured_content_from_disk() {
    let temp_dir = workspace();
    let loaded = load(temp_dir.path()).await;
    let service =
        TranslationService::new(loaded.locales, loaded.store, Environment::in_memory());

    let phases: Vec<Phase> = service.translate_object("roadmap.phases", Vec::new());

    assert_eq!(
        phases,
        vec![Phase {
            title: "Genesis".to_string(),
            items: vec!["Testnet".to_string(), "Faucet".to_string()],
        }]
    );
}

#[tokio::test]
async fn locale_switch_persists_to_preference_file() {
    let temp_dir = workspace();
    let loaded = load(temp_dir.path()).await;
    let preference = FilePreferenceStore::new(loaded.preference_file.clone());
    let history = MemoryHistory::new("/en/roadmap#phase-2");
    let env = Environment::new(
        history.clone(),
        preference.clone(),
        StaticLanguagePreferences::default(),
    );
    let mut service = TranslationService::new(loaded.locales, loaded.store, env);

    service.set_active_locale("de");

    assert_that!(history.current_path(), eq("/de/roadmap#phase-2"));
    assert_that!(preference.get(), some(eq("de")));
    assert_that!(service.translate("common.hello", "Hi", &Params::new()), eq("Hallo"));

    // a later visit without a locale in the URL picks the persisted choice
    let next_visit = Environment::new(
        MemoryHistory::new("/about"),
        FilePreferenceStore::new(loaded.preference_file),
        StaticLanguagePreferences::new(["ja"]),
    );
    let service = TranslationService::new(Locales::builtin(), ResourceStore::default(), next_visit);
    assert_that!(service.resolve_initial_locale(), eq("de"));
}

#[googletest::test]
fn startup_synchronization_scenario() {
    let locales = Locales::builtin();
    expect_that!(extract_locale_from_path("/de/about", &locales), some(eq("de")));
    expect_that!(extract_locale_from_path("/about", &locales), none());

    let history = MemoryHistory::new("/about");
    let env = Environment::new(
        history.clone(),
        MemoryPreferenceStore::default(),
        StaticLanguagePreferences::new(["fr-FR"]),
    );
    let mut service = TranslationService::new(locales, ResourceStore::default(), env);

    let outcome = service.synchronize_on_load();

    assert_eq!(outcome, SyncOutcome::InsertedSegment("en".to_string()));
    expect_that!(history.current_path(), eq("/en/about"));
    expect_that!(history.log().entries.len(), eq(1));
}

#[googletest::test]
fn repeated_locale_selection_leaves_url_untouched() {
    let history = MemoryHistory::new("/ja/faq?q=wallet");
    let env = Environment::new(
        history.clone(),
        MemoryPreferenceStore::default(),
        StaticLanguagePreferences::default(),
    );
    let mut service = TranslationService::new(Locales::builtin(), ResourceStore::default(), env);
    let before = history.log();

    service.set_active_locale("ja");
    service.set_active_locale("ja");

    assert_eq!(history.log(), before);
}
