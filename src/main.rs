use catalog_dl::{
    AacType, AudioMode, CatalogClient, CatalogDownloader, Config, ContinuationSignal, Counters,
    Error, LoftyTagWriter, MvAudioType, Prompts, Result, RunOptions, SelectionPrompt, Toolset,
};
use async_trait::async_trait;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Download albums, playlists, songs, artists and music videos from catalog URLs
#[derive(Debug, Parser)]
#[command(name = "catalog-dl", version, about)]
struct Args {
    /// Album, playlist, song, artist or music-video URLs
    #[arg(required = true)]
    urls: Vec<String>,

    /// Configuration file
    #[arg(short, long, env = "CATALOG_DL_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Download Dolby Atmos renditions
    #[arg(long, conflicts_with = "aac")]
    atmos: bool,

    /// Download AAC renditions
    #[arg(long)]
    aac: bool,

    /// Choose tracks interactively
    #[arg(long)]
    select: bool,

    /// Download only the track named by the URL
    #[arg(long)]
    song: bool,

    /// Download every album of an artist without asking
    #[arg(long = "all-album")]
    all_album: bool,

    /// Show the available qualities of every track instead of downloading
    #[arg(long)]
    debug: bool,

    /// Download only lyrics
    #[arg(long)]
    lyrics_only: bool,

    /// Download only albums that offer Atmos
    #[arg(long)]
    atmos_only: bool,

    /// Skip every music video
    #[arg(long)]
    skip_mv: bool,

    /// Download only cover art
    #[arg(long = "cover-art")]
    cover_art: bool,

    /// ALAC sample-rate ceiling in Hz
    #[arg(long)]
    alac_max: Option<u32>,

    /// Atmos bitrate ceiling in kbps
    #[arg(long)]
    atmos_max: Option<u32>,

    /// AAC subtype: aac, aac-lc, aac-binaural, aac-downmix
    #[arg(long)]
    aac_type: Option<String>,

    /// Music-video audio preference: atmos, ac3, aac
    #[arg(long)]
    mv_audio_type: Option<String>,

    /// Music-video height ceiling
    #[arg(long)]
    mv_max: Option<u32>,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        let mode = if self.atmos {
            AudioMode::Atmos
        } else if self.aac {
            AudioMode::Aac
        } else {
            AudioMode::Alac
        };
        RunOptions {
            mode,
            select: self.select,
            single_track: self.song,
            all_artist_albums: self.all_album,
            inspect: self.debug,
            lyrics_only: self.lyrics_only,
            atmos_only: self.atmos_only,
            skip_mv: self.skip_mv,
            cover_art_only: self.cover_art,
        }
    }

    /// Flags override the configuration file
    fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        let quality = &mut config.quality;
        if let Some(alac_max) = self.alac_max {
            quality.alac_max = alac_max;
        }
        if let Some(atmos_max) = self.atmos_max {
            quality.atmos_max = atmos_max;
        }
        if let Some(mv_max) = self.mv_max {
            quality.mv_max = mv_max;
        }
        if let Some(aac_type) = self.aac_type.as_deref() {
            quality.aac_type = aac_type.parse::<AacType>()?;
        }
        if let Some(mv_audio_type) = self.mv_audio_type.as_deref() {
            quality.mv_audio_type = mv_audio_type.parse::<MvAudioType>()?;
        }
        Ok(())
    }
}

/// Prompts on the controlling terminal
struct TerminalPrompt;

async fn read_answer(question: String) -> Result<String> {
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{question}")?;
        stdout.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    })
    .await
    .map_err(|e| Error::Other(format!("prompt task failed: {e}")))?
}

#[async_trait]
impl SelectionPrompt for TerminalPrompt {
    async fn choose(&self, title: &str, rows: &[String]) -> Result<String> {
        let mut question = format!("\n{title}\n");
        for row in rows {
            question.push_str(row);
            question.push('\n');
        }
        question.push_str("Select items (e.g. 1,3-5 or all): ");
        read_answer(question).await
    }
}

#[async_trait]
impl ContinuationSignal for TerminalPrompt {
    async fn should_continue(&self, counters: &Counters) -> bool {
        let question = format!("{} tracks failed. Retry? [y/N] ", counters.error);
        match read_answer(question).await {
            Ok(answer) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                warn!(error = %e, "could not read answer, not retrying");
                false
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(args).await {
        Ok(errors) if errors > 0 => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

/// Run the batch and return the error count of its last pass
async fn run(args: Args) -> Result<u32> {
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        warn!(path = %args.config.display(), "configuration file not found, using defaults");
        Config::default()
    };
    args.apply_overrides(&mut config)?;
    config.validate()?;

    let catalog = Arc::new(CatalogClient::new(&config.catalog)?);
    let tools = Toolset::from_config(&config);
    let prompt = Arc::new(TerminalPrompt);
    let prompts = Prompts {
        selection: prompt.clone(),
        continuation: prompt,
    };

    let downloader = CatalogDownloader::new(
        config,
        args.run_options(),
        catalog,
        tools,
        Arc::new(LoftyTagWriter),
        prompts,
    );
    let report = downloader.run(&args.urls).await;
    info!(
        passes = report.passes,
        completed = report.completed,
        errors = report.counters.error,
        "batch finished"
    );
    Ok(report.counters.error)
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false))
        .init();
}
