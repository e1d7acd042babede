use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use subfetch::config::{Config, MuxBackend, TranslateMode};
use subfetch::fetch::PlaylistRange;
use subfetch::housekeeping::purge_workspace;
use subfetch::interactive::{confirm_purge, run_menu, MenuAction};
use subfetch::tools::{check_dependencies, required_tools, RunMode};
use subfetch::translate::GoogleTranslator;
use subfetch::{print_summary, print_translate_summary, Pipeline, SubfetchError};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "subfetch")]
#[command(version, about = "Download videos with translated captions")]
#[command(
    long_about = "Download videos or playlists with yt-dlp, translate their captions and mux them \
into the container. Runs an interactive menu when no subcommand is given."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Output directory for finished videos
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Language of the original captions (e.g., en)
    #[arg(long, global = true)]
    source_lang: Option<String>,

    /// Language to translate captions into (e.g., es)
    #[arg(long, global = true)]
    target_lang: Option<String>,

    /// Name of the muxed caption track
    #[arg(long, global = true)]
    track_name: Option<String>,

    /// Mux backend: mkvmerge, ffmpeg
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Translation granularity: block, line
    #[arg(long, global = true)]
    mode: Option<String>,

    /// Delete temporary files without asking
    #[arg(short, long, global = true)]
    yes: bool,

    /// Keep temporary files without asking
    #[arg(long, global = true, conflicts_with = "yes")]
    keep_temp: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Download a video or playlist and attach translated captions
    Fetch {
        url: String,

        /// Playlist items to download (e.g., 1-5, 3, 7-)
        #[arg(short, long)]
        range: Option<String>,
    },
    /// Attach captions to videos already in a folder
    Process { dir: PathBuf },
    /// Translate every caption file in a folder
    Translate { dir: PathBuf },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(ref output) = cli.output {
        config.output_dir = output.clone();
    }
    if let Some(ref lang) = cli.source_lang {
        config.source_lang = lang.clone();
    }
    if let Some(ref lang) = cli.target_lang {
        config.target_lang = lang.clone();
    }
    if let Some(ref name) = cli.track_name {
        config.track_name = name.clone();
    }
    if let Some(ref backend) = cli.backend {
        config.mux_backend = backend
            .parse::<MuxBackend>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(ref mode) = cli.mode {
        config.translate_mode = mode
            .parse::<TranslateMode>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}

fn menu_action(command: Option<Command>, config: &Config) -> Result<MenuAction> {
    let action = match command {
        Some(Command::Fetch { url, range }) => {
            let range = match range {
                Some(r) => PlaylistRange::parse(&r)?,
                None => None,
            };
            MenuAction::Fetch { url, range }
        }
        Some(Command::Process { dir }) => MenuAction::ProcessFolder(dir),
        Some(Command::Translate { dir }) => MenuAction::TranslateFolder(dir),
        None => run_menu(config)?,
    };
    Ok(action)
}

fn run_mode(action: &MenuAction) -> Option<RunMode> {
    match action {
        MenuAction::Fetch { .. } => Some(RunMode::Fetch),
        MenuAction::ProcessFolder(_) => Some(RunMode::ProcessFolder),
        MenuAction::TranslateFolder(_) => Some(RunMode::TranslateFolder),
        MenuAction::Exit => None,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli)?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let (yes, keep_temp) = (cli.yes, cli.keep_temp);
    let action = menu_action(cli.command, &config)?;
    let Some(mode) = run_mode(&action) else {
        println!("Bye.");
        return Ok(());
    };

    check_dependencies(&required_tools(&config, mode))?;
    debug!("Config: {:?}", config);

    let translator = GoogleTranslator::new(&config)?;
    let pipeline = Pipeline::new(&config, &translator);

    match action {
        MenuAction::Fetch { url, range } => {
            info!("Fetching {}", url);
            let summary = pipeline.run_fetch(&url, range).await?;
            print_summary(&summary);
            purge(&config.temp_dir, yes, keep_temp)?;
        }
        MenuAction::ProcessFolder(dir) => {
            info!("Processing {}", dir.display());
            let summary = pipeline.run_folder(&dir).await?;
            print_summary(&summary);
        }
        MenuAction::TranslateFolder(dir) => {
            info!("Translating captions in {}", dir.display());
            let summary = pipeline.translate_folder(&dir).await?;
            print_translate_summary(&summary);
        }
        MenuAction::Exit => {}
    }

    Ok(())
}

fn purge(workspace: &Path, yes: bool, keep_temp: bool) -> Result<()> {
    let confirmed = if yes {
        true
    } else if keep_temp {
        false
    } else {
        confirm_purge(workspace)?
    };

    if !confirmed {
        println!(
            "{} Temporary files kept in {}",
            style("→").cyan(),
            workspace.display()
        );
        return Ok(());
    }

    let report = purge_workspace(workspace);
    if report.failed.is_empty() {
        println!(
            "{} Removed {} temporary file(s)",
            style("✔").green(),
            report.removed
        );
    } else {
        println!(
            "{} Removed {} temporary file(s), {} could not be deleted",
            style("⚠").yellow(),
            report.removed,
            report.failed.len()
        );
        for path in &report.failed {
            println!("    {}", path.display());
        }
    }
    Ok(())
}

/// Ctrl+C inside a dialoguer prompt surfaces as an interrupted IO error.
fn is_interrupt(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(dialoguer::Error::IO(io)) = cause.downcast_ref::<dialoguer::Error>() {
            return io.kind() == std::io::ErrorKind::Interrupted;
        }
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::Interrupted)
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!("\n{} Cancelled", style("✘").red());
        std::process::exit(i32::from(EXIT_INTERRUPTED));
    }) {
        debug!("Could not install Ctrl+C handler: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_interrupt(&e) => {
            eprintln!("\n{} Cancelled", style("✘").red());
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("{} {:#}", style("✘").red(), e);
            if e
                .downcast_ref::<SubfetchError>()
                .is_some_and(SubfetchError::is_usage)
            {
                eprintln!("  {}", style("Run `subfetch --help` for usage.").dim());
            }
            ExitCode::FAILURE
        }
    }
}
