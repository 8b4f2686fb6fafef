//! Run composition: config, logging, session, command dispatch.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use hbsync_core::{ErrorPolicy, LibraryPage, Session, SessionOptions};
use tracing::debug;

use crate::ProcessExit;
use crate::app::config::{FileConfig, VerbositySetting, load_config};
use crate::app::{exit_handler, terminal};
use crate::cli::{Cli, Command, DownloadArgs};
use crate::commands::{self, DownloadSettings};

/// How chatty the run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputLevel {
    Quiet,
    Normal,
    Verbose,
    Trace,
}

impl OutputLevel {
    /// CLI flags win over the config file.
    pub(crate) fn resolve(verbose: u8, quiet: bool, setting: Option<VerbositySetting>) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => {}
            1 => return Self::Verbose,
            _ => return Self::Trace,
        }
        match setting {
            Some(VerbositySetting::Quiet) => Self::Quiet,
            Some(VerbositySetting::Verbose) => Self::Verbose,
            Some(VerbositySetting::Debug) => Self::Trace,
            Some(VerbositySetting::Default) | None => Self::Normal,
        }
    }

    /// Default `tracing` filter for this level.
    pub(crate) fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::Trace => "trace",
        }
    }

    pub(crate) fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Trace)
    }
}

/// Runs the parsed command line and maps any error to an exit outcome.
pub(crate) async fn run(cli: Cli) -> ProcessExit {
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            return ProcessExit::Usage;
        }
    };

    let level = OutputLevel::resolve(cli.verbose, cli.quiet, config.verbosity);
    let no_color = terminal::is_no_color_requested(cli.no_color);
    terminal::init_tracing(level.log_filter(), no_color);
    debug!(?cli, "CLI arguments parsed");

    match execute(cli, &config, level).await {
        Ok(exit) => exit,
        Err(error) => {
            if level.is_verbose() {
                eprintln!("error: {error:?}");
            } else {
                eprintln!("error: {error:#}");
            }
            exit_handler::exit_for_error(&error)
        }
    }
}

async fn execute(cli: Cli, config: &FileConfig, level: OutputLevel) -> Result<ProcessExit> {
    let Cli {
        cookie_jar,
        command,
        ..
    } = cli;

    match command {
        Command::List(args) => {
            let session = open_session(cookie_jar, config)?;
            let mut stdout = io::stdout().lock();
            commands::run_list(&session, &LibraryPage, &args, &mut stdout).await?;
            Ok(ProcessExit::Success)
        }
        Command::Download(args) => {
            let settings = resolve_download_settings(&args, config, level)?;
            let session = open_session(cookie_jar, config)?;
            let summary = commands::run_download(&session, &settings).await?;
            Ok(exit_handler::determine_exit_outcome(&summary))
        }
    }
}

fn open_session(cookie_jar: Option<PathBuf>, config: &FileConfig) -> Result<Session> {
    let cookie_jar = resolve_cookie_jar(cookie_jar, config)?;
    let options = resolve_session_options(config);
    Ok(Session::initialize(&cookie_jar, &options)?)
}

fn resolve_cookie_jar(cli_value: Option<PathBuf>, config: &FileConfig) -> Result<PathBuf> {
    cli_value
        .or_else(|| config.cookie_jar.clone())
        .context("No cookie file given. Pass --cookie-jar <PATH> or set `cookie_jar` in the config file")
}

pub(crate) fn resolve_session_options(config: &FileConfig) -> SessionOptions {
    let mut options = config
        .base_url
        .clone()
        .map_or_else(SessionOptions::default, SessionOptions::with_base_url);
    if let Some(secs) = config.connect_timeout_secs {
        options.connect_timeout = Duration::from_secs(secs);
    }
    options.read_timeout = config.read_timeout_secs.map(Duration::from_secs);
    options
}

pub(crate) fn resolve_download_settings(
    args: &DownloadArgs,
    config: &FileConfig,
    level: OutputLevel,
) -> Result<DownloadSettings> {
    let format = args
        .format
        .clone()
        .or_else(|| config.format.clone())
        .context("No format given. Pass --format <FORMAT> or set `format` in the config file")?;
    if format.trim().is_empty() {
        bail!("--format must not be empty");
    }
    let library_path = args
        .library_path
        .clone()
        .or_else(|| config.library_path.clone())
        .context(
            "No library path given. Pass --library-path <DIR> or set `library_path` in the config file",
        )?;
    if args.key.trim().is_empty() {
        bail!("--key must not be empty");
    }

    let continue_on_error = args.continue_on_error || config.continue_on_error.unwrap_or(false);
    let show_progress = terminal::should_show_progress(
        io::stderr().is_terminal(),
        level == OutputLevel::Quiet,
        terminal::is_dumb_terminal(),
    );

    Ok(DownloadSettings {
        key: args.key.trim().into(),
        format: format.trim().to_string(),
        library_path,
        policy: if continue_on_error {
            ErrorPolicy::ContinueOnError
        } else {
            ErrorPolicy::FailFast
        },
        dedupe: args.dedupe || config.dedupe.unwrap_or(false),
        show_progress,
        quiet: level == OutputLevel::Quiet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn download_args() -> DownloadArgs {
        DownloadArgs {
            key: "aBcD1234".to_string(),
            ..DownloadArgs::default()
        }
    }

    #[test]
    fn test_output_level_cli_wins_over_config() {
        assert_eq!(
            OutputLevel::resolve(0, true, Some(VerbositySetting::Debug)),
            OutputLevel::Quiet
        );
        assert_eq!(
            OutputLevel::resolve(1, false, Some(VerbositySetting::Quiet)),
            OutputLevel::Verbose
        );
        assert_eq!(OutputLevel::resolve(3, false, None), OutputLevel::Trace);
    }

    #[test]
    fn test_output_level_falls_back_to_config() {
        assert_eq!(
            OutputLevel::resolve(0, false, Some(VerbositySetting::Verbose)),
            OutputLevel::Verbose
        );
        assert_eq!(OutputLevel::resolve(0, false, None), OutputLevel::Normal);
        assert_eq!(OutputLevel::Normal.log_filter(), "info");
        assert_eq!(OutputLevel::Quiet.log_filter(), "error");
    }

    #[test]
    fn test_download_settings_from_config_defaults() {
        let config = FileConfig {
            format: Some("pdf".to_string()),
            library_path: Some(PathBuf::from("/srv/books")),
            continue_on_error: Some(true),
            dedupe: Some(true),
            ..FileConfig::default()
        };
        let settings =
            resolve_download_settings(&download_args(), &config, OutputLevel::Normal).unwrap();
        assert_eq!(settings.format, "pdf");
        assert_eq!(settings.library_path, PathBuf::from("/srv/books"));
        assert_eq!(settings.policy, ErrorPolicy::ContinueOnError);
        assert!(settings.dedupe);
    }

    #[test]
    fn test_download_settings_cli_overrides_config() {
        let config = FileConfig {
            format: Some("pdf".to_string()),
            library_path: Some(PathBuf::from("/srv/books")),
            ..FileConfig::default()
        };
        let args = DownloadArgs {
            format: Some("epub".to_string()),
            library_path: Some(PathBuf::from("/tmp/lib")),
            ..download_args()
        };
        let settings = resolve_download_settings(&args, &config, OutputLevel::Normal).unwrap();
        assert_eq!(settings.format, "epub");
        assert_eq!(settings.library_path, PathBuf::from("/tmp/lib"));
        assert_eq!(settings.policy, ErrorPolicy::FailFast);
        assert!(!settings.dedupe);
    }

    #[test]
    fn test_download_settings_require_format() {
        let config = FileConfig {
            library_path: Some(PathBuf::from("/srv/books")),
            ..FileConfig::default()
        };
        let err = resolve_download_settings(&download_args(), &config, OutputLevel::Normal)
            .unwrap_err();
        assert!(err.to_string().contains("--format"));
    }

    #[test]
    fn test_missing_cookie_jar_is_usage_error() {
        let err = resolve_cookie_jar(None, &FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--cookie-jar"));
        assert_eq!(exit_handler::exit_for_error(&err), ProcessExit::Usage);
    }

    #[test]
    fn test_session_options_from_config() {
        let config = FileConfig {
            base_url: Some(Url::parse("http://127.0.0.1:9000/").unwrap()),
            connect_timeout_secs: Some(5),
            read_timeout_secs: Some(60),
            ..FileConfig::default()
        };
        let options = resolve_session_options(&config);
        assert_eq!(options.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
        assert_eq!(options.read_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_session_options_defaults() {
        let options = resolve_session_options(&FileConfig::default());
        assert_eq!(options.base_url.as_str(), hbsync_core::DEFAULT_BASE_URL);
        assert_eq!(options.read_timeout, None);
    }
}
