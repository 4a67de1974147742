use std::{io::IsTerminal, process::ExitCode};

use autosubs::{
    cancel::Cancellation,
    cleanup::PlainTextCleanup,
    cli::Args,
    config::Settings,
    logging::init_logging,
    naming::ConventionalNames,
    orchestrator::Orchestrator,
    outside::Ytdl,
    report::ConsoleReporter,
    repository::FsSubtitleRepository,
    result::Error,
};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::{debug, info};

/// Conventional exit code of a process stopped by SIGINT
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> Result<ExitCode> {
    // Initialize the environment & CLI
    let args = Args::parse();
    let settings = Settings::load(&args)?;
    init_logging(settings.log_level()?, settings.log_file())?;
    debug!("Settings: {settings:?}");

    let cancel = Cancellation::new();
    cancel.install_ctrlc_handler()?;

    let config = settings.run_config()?;
    let ytdl = Ytdl::new(settings.cookies_from_browser.clone())?;
    let repository = FsSubtitleRepository::new(&config.out_dir);
    let names = ConventionalNames::new(settings.numbering);
    let cleanup = PlainTextCleanup;

    info!(
        "Downloading '{}' subtitles of {} into {}",
        config.languages,
        config.channel_url,
        repository.out_dir().display()
    );

    let mut reporter = ConsoleReporter::stdout(std::io::stdout().is_terminal());
    let (res, final_progress) = {
        let mut orchestrator =
            Orchestrator::new(config, &ytdl, &ytdl, &repository, &names, cancel.clone())
                .with_observer(&mut reporter);
        if settings.clean_text {
            orchestrator = orchestrator.with_cleanup(&cleanup);
        }
        let res = orchestrator.run();
        (res, orchestrator.final_progress().cloned())
    };

    let report = match res {
        Ok(report) => report,
        Err(Error::Cancelled) => return Ok(ExitCode::from(EXIT_INTERRUPTED)),
        Err(err) => {
            // Aborted after the listing: still show how far the run went
            if let Some(progress) = final_progress {
                reporter.summary(&progress, false).into_diagnostic()?;
            }
            return Err(err.into());
        }
    };

    reporter.summary(&report.progress, report.cancelled).into_diagnostic()?;

    if report.cancelled || cancel.is_cancelled() {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }

    info!("All videos handled");
    Ok(ExitCode::SUCCESS)
}
