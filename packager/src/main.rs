//! Omnibus Docker packager CLI entrypoint.
//!
//! This binary stages an omnibus project, renders its Dockerfile and builds
//! the artefact archive, or prints the artefact filename with `name`.

use camino::Utf8Path;
use clap::Parser;
use omnibus_docker_packager::cli::{BuildArgs, Cli, Command, ProjectArgs};
use omnibus_docker_packager::error::{PackagerError, Result};
use omnibus_docker_packager::executor::{CommandExecutor, SystemCommandExecutor};
use omnibus_docker_packager::naming::PackageIdentity;
use omnibus_docker_packager::output::{
    dry_run_json, dry_run_text, success_message, write_stderr_line,
};
use omnibus_docker_packager::pipeline::{PackageRequest, Packager};
use omnibus_docker_packager::platform::{OS_RELEASE_PATH, detect_platform};
use omnibus_docker_common::PlatformInfo;
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    init_logging(cli.quiet, &mut stderr);

    let run_result = run(&cli, &SystemCommandExecutor, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install a stderr log subscriber honouring `RUST_LOG`.
///
/// A failed install is reported on `stderr` and the run continues unlogged.
fn init_logging(quiet: bool, stderr: &mut dyn Write) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(err) = installed {
        write_stderr_line(stderr, format!("warning: failed to initialise logging: {err}"));
    }
}

fn run(
    cli: &Cli,
    executor: &dyn CommandExecutor,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    match &cli.command {
        Command::Build(args) => run_build(args, cli.quiet, executor, stdout, stderr),
        Command::Name(args) => run_name(args, executor, stdout),
    }
}

fn run_build(
    args: &BuildArgs,
    quiet: bool,
    executor: &dyn CommandExecutor,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let config = args.load_config()?;
    let request = PackageRequest {
        project: args.project.load_project()?,
        platform: resolve_platform(&args.project, executor)?,
        staging_dir: args.staging_dir.clone(),
        output_dir: args.output_dir.clone(),
    };
    let mut packager = Packager::new(&config, executor);

    if args.dry_run {
        let plan = packager.plan(&request)?;
        if args.json {
            writeln!(stdout, "{}", dry_run_json(&plan)?)
                .map_err(|source| PackagerError::WriteFailed { source })?;
        } else {
            write_stderr_line(stderr, dry_run_text(&plan));
        }
        return Ok(());
    }

    let outcome = packager.package(&request)?;
    if !quiet {
        write_stderr_line(stderr, success_message(&outcome));
    }
    Ok(())
}

fn run_name(
    args: &ProjectArgs,
    executor: &dyn CommandExecutor,
    stdout: &mut dyn Write,
) -> Result<()> {
    let project = args.load_project()?;
    let platform = resolve_platform(args, executor)?;
    let identity = PackageIdentity::resolve(&project, &platform);
    writeln!(stdout, "{}", identity.artefact_name())
        .map_err(|source| PackagerError::WriteFailed { source })
}

fn resolve_platform(args: &ProjectArgs, executor: &dyn CommandExecutor) -> Result<PlatformInfo> {
    detect_platform(
        executor,
        Utf8Path::new(OS_RELEASE_PATH),
        &args.platform_overrides(),
    )
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
