use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use precheck::Precheck;
use precheck::config::{DEFAULT_PDK_NAME, PrecheckConfig, default_threads};
use precheck::error::Error;
use precheck::tech::Tech;
use tracing_subscriber::EnvFilter;

/// Exit code for runs that could not start.
const PRECONDITION_FAILURE: u8 = 2;

/// Arguments to [`precheck`].
#[derive(ClapParser)]
#[command(
    version,
    about,
    long_about = "Check a Tiny Tapeout GDS submission before it is merged into the shuttle"
)]
pub struct Args {
    /// The layout to check, as `.gds` or `.gds.br`.
    ///
    /// `info.yaml` is looked up in its directory and the directories above it.
    #[arg(long)]
    gds: PathBuf,

    /// The root directory of the installed PDKs.
    #[arg(long, env = "PDK_ROOT")]
    pdk_root: Option<PathBuf>,

    /// The PDK variant.
    #[arg(long, env = "PDK_NAME", default_value = DEFAULT_PDK_NAME)]
    pdk_name: String,

    /// The process technology.
    #[arg(long, default_value_t)]
    tech: Tech,

    /// Where results and engine reports are written.
    #[arg(long, default_value = "reports")]
    reports_dir: PathBuf,

    /// The directory containing the KLayout DRC runsets.
    #[arg(long, default_value = "tech-files")]
    tech_files: PathBuf,

    /// Scratch directory for engine run scripts and logs.
    ///
    /// Defaults to `work` inside the reports directory.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Worker threads requested from DRC engines.
    #[arg(long)]
    threads: Option<usize>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match precheck(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(PRECONDITION_FAILURE)
        }
    }
}

fn precheck(args: Args) -> Result<u8, Error> {
    let pdk_root = args.pdk_root.ok_or(Error::MissingPdkRoot)?;
    let config = PrecheckConfig {
        pdk_root,
        pdk_name: args.pdk_name,
        tech: args.tech,
        work_dir: args
            .work_dir
            .unwrap_or_else(|| args.reports_dir.join("work")),
        reports_dir: args.reports_dir,
        tech_files_dir: args.tech_files,
        threads: args.threads.unwrap_or_else(default_threads),
    };
    tracing::info!(
        gds = %args.gds.display(),
        pdk = %config.pdk_name,
        tech = %config.tech,
        "starting precheck"
    );

    let precheck = Precheck::prepare(config, &args.gds)?;
    let report = precheck.run()?;
    Ok(precheck.finish(&report))
}
