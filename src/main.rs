//! `blocksocial-i18n`: translation diagnostics for the site's locale bundles.

use std::io::{
    self,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use blocksocial_i18n::checker::{
    self,
    ENTIRE_LOCALE_MISSING,
    LocaleReport,
};
use blocksocial_i18n::config::{
    ConfigError,
    ConfigManager,
};
use blocksocial_i18n::env::{
    EnvLanguagePreferences,
    Environment,
    FilePreferenceStore,
    History,
    LanguagePreferences,
    MemoryHistory,
    MemoryPreferenceStore,
    PreferenceStore,
    StaticLanguagePreferences,
};
use blocksocial_i18n::input::translation::{
    DirectorySource,
    SourceError,
};
use blocksocial_i18n::resolver;
use blocksocial_i18n::{
    CheckerError,
    Locales,
    Params,
    ResourceStore,
    TranslationService,
    TranslationTree,
};
use clap::{
    Args,
    Parser,
    Subcommand,
};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Exit code when `check --fail-under` finds a locale below the threshold.
const EXIT_BELOW_THRESHOLD: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "blocksocial-i18n", version, about = "Translation diagnostics for locale bundles")]
struct Cli {
    /// Workspace root containing `.blocksocial-i18n.json`
    #[arg(long, global = true, env = "BLOCKSOCIAL_I18N_WORKSPACE", default_value = ".")]
    workspace: PathBuf,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Completeness of every locale against the reference locale
    Check(CheckArgs),
    /// Reference keys a locale lacks, grouped by section
    Missing(LocaleArgs),
    /// Keys a locale has that the reference does not
    Extra(LocaleArgs),
    /// Reference-shaped bundle for a locale with blanks for missing keys
    Fill(FillArgs),
    /// Which locale a visitor would get, and the synchronized URL
    Resolve(ResolveArgs),
    /// Look up a key the way the site does
    Translate(TranslateArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Print the reports as JSON
    #[arg(long)]
    json: bool,

    /// Exit with status 2 if any locale is below this completeness percentage
    #[arg(long, value_name = "PERCENT")]
    fail_under: Option<f64>,
}

#[derive(Args, Debug)]
struct LocaleArgs {
    /// Locale code
    locale: String,
}

#[derive(Args, Debug)]
struct FillArgs {
    /// Locale code
    locale: String,

    /// Write the bundle here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// URL path of the visit
    #[arg(long, default_value = "/")]
    path: String,

    /// Persisted preference; defaults to the configured preference file
    #[arg(long)]
    preference: Option<String>,

    /// Preferred language tags in order; defaults to LANGUAGE / LC_* / LANG
    #[arg(long = "language", value_name = "TAG")]
    languages: Vec<String>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Key path
    key: String,

    /// Locale to translate into; defaults to the resolved locale
    #[arg(long)]
    locale: Option<String>,

    /// Text returned when the key does not resolve
    #[arg(long, default_value = "")]
    fallback: String,

    /// Interpolation parameter
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Print the structured value as JSON instead of a string
    #[arg(long)]
    object: bool,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Checker(#[from] CheckerError),

    #[error("Unsupported locale '{0}'")]
    UnknownLocale(String),

    #[error("Invalid log file path {0:?}")]
    InvalidLogFile(PathBuf),

    #[error("Failed to write {path:?}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings, locale registry and loaded bundles of one workspace.
struct Workspace {
    /// Loaded settings
    config: ConfigManager,
    /// Supported locales from the settings
    locales: Locales,
    /// Bundles discovered under the locales directory
    store: ResourceStore,
}

impl Workspace {
    /// Loads settings and every locale's bundle.
    async fn load(root: PathBuf) -> Result<Self, CliError> {
        let mut config = ConfigManager::new();
        config.load_settings(Some(root))?;
        let settings = config.get_settings();
        let locales = settings.build_locales()?;
        let source =
            DirectorySource::discover(&config.locales_dir(), &settings.file_pattern, &locales)?;
        let store = ResourceStore::load(&source, &locales).await;
        Ok(Self { config, locales, store })
    }

    /// Configured key-path separator.
    fn separator(&self) -> &str {
        &self.config.get_settings().key_separator
    }

    /// Locale the checker compares against.
    fn reference_code(&self) -> &str {
        &self.config.get_settings().reference_locale
    }

    /// Tree of a supported locale; unloaded locales yield an empty tree.
    fn tree(&self, code: &str) -> Result<TranslationTree, CliError> {
        if !self.locales.contains(code) {
            return Err(CliError::UnknownLocale(code.to_string()));
        }
        Ok(self.store.tree(code).cloned().unwrap_or_default())
    }

    /// Persisted preference from the configured file, if any.
    fn persisted_preference(&self) -> Option<String> {
        self.config.preference_file().and_then(|path| FilePreferenceStore::new(path).get())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_tracing(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => return report_error(&err),
    };

    match run(cli).await {
        Ok(code) => code,
        Err(err) => report_error(&err),
    }
}

/// Installs the global subscriber; the guard must live until exit.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(path) = log_file else {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
        return Ok(None);
    };

    let file_name =
        path.file_name().ok_or_else(|| CliError::InvalidLogFile(path.to_path_buf()))?;
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
    Ok(Some(guard))
}

/// Prints `err` to stderr and maps it to exit status 1.
fn report_error(err: &CliError) -> ExitCode {
    let _ = writeln!(io::stderr().lock(), "error: {err}");
    ExitCode::FAILURE
}

/// Loads the workspace and dispatches the subcommand.
async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let workspace = Workspace::load(cli.workspace).await?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Check(args) => check(&workspace, &args, &mut out),
        Command::Missing(args) => missing(&workspace, &args, &mut out),
        Command::Extra(args) => extra(&workspace, &args, &mut out),
        Command::Fill(args) => fill(&workspace, &args, &mut out).await,
        Command::Resolve(args) => resolve(&workspace, args, &mut out),
        Command::Translate(args) => translate(&workspace, args, &mut out),
    }
}

/// `check`: one summary per non-reference locale.
fn check(workspace: &Workspace, args: &CheckArgs, out: &mut impl Write) -> Result<ExitCode, CliError> {
    let reports = checker::check_all_locales(
        workspace.store.trees(),
        workspace.reference_code(),
        workspace.separator(),
    )?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&reports)?)?;
    } else {
        writeln!(out, "Reference: {}", workspace.reference_code())?;
        for (code, report) in &reports {
            writeln!(out, "{}", summary_line(code, report))?;
        }
    }

    let below = args.fail_under.map_or(0, |threshold| {
        reports.values().filter(|report| report.completeness < threshold).count()
    });
    if below > 0 {
        tracing::warn!(below, "Locales below the completeness threshold");
        return Ok(ExitCode::from(EXIT_BELOW_THRESHOLD));
    }
    Ok(ExitCode::SUCCESS)
}

/// One row of the text `check` output.
fn summary_line(code: &str, report: &LocaleReport) -> String {
    if report.entire_locale_missing {
        return format!("{code:<6} {:>6.1}%  {ENTIRE_LOCALE_MISSING}", report.completeness);
    }
    format!(
        "{code:<6} {:>6.1}%  {}/{} keys, {} missing, {} extra",
        report.completeness,
        report.reference_key_count.saturating_sub(report.missing_count()),
        report.reference_key_count,
        report.missing_count(),
        report.extra_count(),
    )
}

/// `missing`: reference keys absent from a locale, by section.
fn missing(
    workspace: &Workspace,
    args: &LocaleArgs,
    out: &mut impl Write,
) -> Result<ExitCode, CliError> {
    let reference = workspace.tree(workspace.reference_code())?;
    let target = workspace.tree(&args.locale)?;

    if target.is_empty() && !reference.is_empty() {
        writeln!(out, "{}: {ENTIRE_LOCALE_MISSING}", args.locale)?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = checker::find_missing_keys(&reference, &target, workspace.separator());
    if report.is_empty() {
        writeln!(out, "{}: no missing keys", args.locale)?;
    }
    for (section, paths) in &report {
        writeln!(out, "{section} ({})", paths.len())?;
        for path in paths {
            writeln!(out, "  {path}")?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// `extra`: keys absent from the reference.
fn extra(workspace: &Workspace, args: &LocaleArgs, out: &mut impl Write) -> Result<ExitCode, CliError> {
    let reference = workspace.tree(workspace.reference_code())?;
    let target = workspace.tree(&args.locale)?;

    for path in checker::find_extra_keys(&reference, &target, workspace.separator()) {
        writeln!(out, "{path}")?;
    }
    Ok(ExitCode::SUCCESS)
}

/// `fill`: reference-shaped bundle keeping existing translations.
async fn fill(workspace: &Workspace, args: &FillArgs, out: &mut impl Write) -> Result<ExitCode, CliError> {
    let reference = workspace.tree(workspace.reference_code())?;
    let existing = workspace.tree(&args.locale)?;
    let filled = checker::create_filled_translations(&reference, &existing);
    let json = serde_json::to_string_pretty(&filled)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, format!("{json}\n"))
                .await
                .map_err(|source| CliError::WriteFile { path: path.clone(), source })?;
            tracing::info!(
                locale = %args.locale,
                path = %path.display(),
                keys = checker::count_keys(&filled),
                "Wrote filled bundle"
            );
        }
        None => writeln!(out, "{json}")?,
    }
    Ok(ExitCode::SUCCESS)
}

/// `resolve`: initial locale and the URL after startup synchronization.
fn resolve(workspace: &Workspace, args: ResolveArgs, out: &mut impl Write) -> Result<ExitCode, CliError> {
    let persisted = args.preference.or_else(|| workspace.persisted_preference());
    let languages: Vec<String> = if args.languages.is_empty() {
        EnvLanguagePreferences.preferred_languages()
    } else {
        args.languages
    };

    let resolved = resolver::resolve_initial_locale(
        &workspace.locales,
        &args.path,
        persisted.as_deref(),
        languages.as_slice(),
    );

    let history = MemoryHistory::new(&args.path);
    let env = Environment::new(
        history.clone(),
        MemoryPreferenceStore::new(persisted.as_deref()),
        StaticLanguagePreferences(languages),
    );
    let mut service =
        TranslationService::new(workspace.locales.clone(), ResourceStore::default(), env);
    service.synchronize_on_load();

    let locale = resolved.locale;
    writeln!(out, "{} {} ({})", locale.flag, locale.display_name, locale.code)?;
    writeln!(out, "source: {}", resolved.source)?;
    writeln!(out, "url: {}", history.current_path())?;
    Ok(ExitCode::SUCCESS)
}

/// `translate`: a lookup through [`TranslationService`].
fn translate(
    workspace: &Workspace,
    args: TranslateArgs,
    out: &mut impl Write,
) -> Result<ExitCode, CliError> {
    let path = match &args.locale {
        Some(code) if !workspace.locales.contains(code) => {
            return Err(CliError::UnknownLocale(code.clone()));
        }
        Some(code) => resolver::with_locale_segment("/", code, &workspace.locales),
        None => "/".to_string(),
    };

    let env = Environment::new(
        MemoryHistory::new(&path),
        MemoryPreferenceStore::new(workspace.persisted_preference().as_deref()),
        EnvLanguagePreferences,
    );
    let service =
        TranslationService::new(workspace.locales.clone(), workspace.store.clone(), env)
            .with_key_separator(workspace.separator());

    if args.object {
        let fallback = serde_json::Value::String(args.fallback);
        let value = service.translate_object(&args.key, fallback);
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        let params: Params = args.params.into_iter().collect();
        writeln!(out, "{}", service.translate(&args.key, &args.fallback, &params))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Parses a `name=value` interpolation parameter.
fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}
