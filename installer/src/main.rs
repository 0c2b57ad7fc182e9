//! Stage3 installer CLI entrypoint.
//!
//! This binary finds the newest Gentoo stage3 release on a mirror, downloads
//! and verifies it, and places the verified archive in the installation
//! target, optionally unpacking it there.

use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;
use stage3_installer::cli::Cli;
use stage3_installer::clock::sync_clock;
use stage3_installer::command::{CommandExecutor, SystemCommandExecutor};
use stage3_installer::config::InstallerConfig;
use stage3_installer::error::{InstallerError, Result};
use stage3_installer::extract::{extract_archive, extraction_executor};
use stage3_installer::fetch::{RedirectFetcher, UreqTransport};
use stage3_installer::output::{DryRunInfo, success_message, write_stderr_line};
use stage3_installer::pipeline::{PipelineContext, ReleasePipeline};

fn main() {
    let cli = Cli::parse();
    stage3_installer::logging::init(cli.verbosity, cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = InstallerConfig::resolve(cli)?;
    let context = config.pipeline_context(&current_dir()?, cli.quiet)?;
    let transport = UreqTransport::new(config.timeout());
    let fetcher = RedirectFetcher::with_max_redirects(&transport, config.mirror.max_redirects);
    let executor = SystemCommandExecutor::default();
    let mut pipeline = ReleasePipeline::new(&context, &fetcher, &executor);

    // Dry-run mode: discover the release without downloading
    if cli.dry_run {
        let plan = pipeline.plan(stderr)?;
        let info = DryRunInfo {
            mirror_url: &config.mirror.url,
            archive_family: context.naming.to_string(),
            work_dir: &context.work_dir,
            target_dir: &context.target_dir,
            extract: cli.extract,
            plan: &plan,
        };
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    if !cli.skip_time_sync {
        progress(&context, stderr, "Synchronising system clock...");
        sync_clock(&executor);
    }

    let verified = pipeline.run(stderr)?;
    let archive_path = verified.path().to_owned();

    if cli.extract {
        unpack(&context, &extraction_executor(), verified, stderr)?;
    }

    progress(&context, stderr, "");
    progress(&context, stderr, success_message(&archive_path, cli.extract));
    Ok(())
}

/// Unpacks the verified archive into the target directory.
fn unpack(
    context: &PipelineContext,
    executor: &dyn CommandExecutor,
    verified: stage3_installer::stage::VerifiedArchive,
    stderr: &mut dyn Write,
) -> Result<()> {
    progress(
        context,
        stderr,
        format!("Unpacking {verified} into {}...", context.target_dir),
    );
    extract_archive(executor, verified, &context.target_dir)
}

fn progress(context: &PipelineContext, stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if !context.quiet {
        write_stderr_line(stderr, message);
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| InstallerError::StagingFailed {
        reason: format!("current directory is not valid UTF-8: {e}"),
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
