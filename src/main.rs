use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressStyle;
use serde::{de::DeserializeOwned, Serialize};
use sldl::{
    download::Downloader,
    library::{self, Library, Playlist, PlaylistExport},
    lookup::{Lookup, NullLookup, SpotifyLookup},
    playlist::Materializer,
    reconcile::{self, InquirePrompt},
    sanitize::{CommandSanitizer, FilenameSanitizer, Sanitizer},
    select::{self, SelectParams},
    Catalog, ClientCredentials, Resolver, Session,
};

/// Download your spotify library and saved playlists.
///
/// Reads the account data export (YourLibrary.json and Playlist1.json), resolves every saved
/// artist, album and track to a spotify uri, downloads them with an external downloader and
/// recreates the playlists as m3u8 files pointing at the downloaded songs.
#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    /// Folder containing the files 'YourLibrary.json' and 'Playlist1.json'.
    #[clap(long, short = 'd', env = "SLDL_DATA_DIR", default_value = "./MyData")]
    spotify_data: PathBuf,

    /// Directory where songs are downloaded and playlists are written.
    #[clap(long, short = 'o', env = "SLDL_OUTPUT_DIR", default_value = "./library")]
    output_dir: PathBuf,

    /// For every song, download the entire album it belongs to.
    #[clap(long)]
    complete_albums: bool,

    /// For every song and album, download the entire artist it belongs to.
    #[clap(long)]
    complete_artist: bool,

    /// Download songs only from the playlists.
    #[clap(long)]
    no_library: bool,

    /// Download songs only from the library.
    #[clap(long)]
    no_playlists: bool,

    /// Only create playlists with existing songs, do not download.
    #[clap(long, conflicts_with = "only_download")]
    only_playlists: bool,

    /// Download only, do not create playlists.
    #[clap(long)]
    only_download: bool,

    /// Do not search spotify, only use the uris present in the export.
    ///
    /// Elements without a uri are offered for manual entry.
    #[clap(long)]
    offline: bool,

    /// Write the catalog built from the export to this file.
    #[clap(long, env = "SLDL_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Enable debug logging.
    #[clap(long, short = 'v', alias = "debug")]
    verbose: bool,

    #[clap(flatten)]
    group_auth: GroupAuth,

    #[clap(flatten)]
    group_downloader: GroupDownloader,

    #[clap(flatten)]
    group_sanitizer: GroupSanitizer,
}

#[derive(Debug, Parser)]
struct GroupAuth {
    /// Spotify application client id.
    ///
    /// If it is not set then the credentials are read from the config file.
    #[clap(long, env = "SLDL_CLIENT_ID", requires = "client_secret")]
    client_id: Option<String>,

    /// Spotify application client secret.
    #[clap(long, env = "SLDL_CLIENT_SECRET", requires = "client_id")]
    client_secret: Option<String>,

    /// JSON file with 'client_id' and 'client_secret'.
    #[clap(long, env = "SLDL_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[derive(Debug, Parser)]
struct GroupDownloader {
    /// Downloader executable, invoked once per uri.
    #[clap(long, env = "SLDL_DOWNLOADER", default_value = sldl::download::DEFAULT_PROGRAM)]
    downloader: PathBuf,

    /// Path to AtomicParsley, forwarded to the downloader.
    #[clap(long, env = "SLDL_ATOMIC_PARSLEY")]
    atomic_parsley: Option<PathBuf>,

    /// Directory for the downloader's captured output.
    #[clap(long, env = "SLDL_LOG_DIR", default_value = "log")]
    log_dir: PathBuf,
}

impl GroupDownloader {
    fn create_downloader(&self, output_dir: &Path) -> Downloader {
        Downloader::new(&self.downloader, output_dir)
            .with_atomic_parsley(self.atomic_parsley.clone())
            .with_log_dir(&self.log_dir)
    }
}

#[derive(Debug, Parser)]
struct GroupSanitizer {
    /// External command used to make playlist, artist, album and track names filesystem safe.
    ///
    /// It is invoked as '<command> <name> --replacement <replacement>'.
    /// If this is not set then a built-in sanitizer is used.
    #[clap(long, env = "SLDL_SANITIZER", num_args = 1.., value_delimiter = ' ')]
    sanitizer_command: Option<Vec<String>>,

    /// Replacement for characters that are not allowed in file names.
    #[clap(long, default_value = "_")]
    replacement: String,
}

impl GroupSanitizer {
    fn create_sanitizer(&self) -> Box<dyn Sanitizer> {
        match self.sanitizer_command.as_deref() {
            Some([program, args @ ..]) => Box::new(CommandSanitizer::new(
                program,
                args.to_vec(),
                &self.replacement,
            )),
            _ => Box::new(FilenameSanitizer::new(&self.replacement)),
        }
    }
}

async fn run(args: Args) -> Result<()> {
    if args.no_library && args.no_playlists {
        anyhow::bail!("--no-library and --no-playlists leave nothing to do");
    }

    let mut catalog = Catalog::new();
    tracing::info!("populating the catalog");

    if !args.no_library {
        let path = args.spotify_data.join(library::LIBRARY_FILE_NAME);
        tracing::info!("using data in {}", path.display());
        let library: Library = helper_read_json(&path)
            .await
            .with_context(|| format!("reading library {}", path.display()))?;
        catalog.load_library(&library);
    }

    let mut playlists: Vec<Playlist> = Vec::new();
    if !args.no_playlists {
        let path = args.spotify_data.join(library::PLAYLIST_FILE_NAME);
        tracing::info!("using data in {}", path.display());
        let export: PlaylistExport = helper_read_json(&path)
            .await
            .with_context(|| format!("reading playlists {}", path.display()))?;
        playlists = export.playlists();
        catalog.load_playlists(&playlists);
    }

    tracing::info!(
        "catalog has {} artists, {} albums, {} tracks",
        catalog.artist_count(),
        catalog.album_count(),
        catalog.track_count()
    );

    if !args.only_playlists {
        let params = SelectParams {
            complete_artist: args.complete_artist,
            complete_album: args.complete_albums,
        };
        if args.offline {
            helper_download(&args, &mut catalog, NullLookup, params).await?;
        } else {
            let credentials = helper_get_credentials(&args.group_auth).await?;
            let session = Session::connect(&credentials)
                .await
                .context("authenticating with spotify")?;
            helper_download(&args, &mut catalog, SpotifyLookup::new(session), params).await?;
        }
    } else if let Some(snapshot) = &args.snapshot {
        helper_write_json(snapshot, &catalog).await?;
    }

    if !args.only_download && !args.no_playlists {
        let sanitizer = args.group_sanitizer.create_sanitizer();
        let materializer = Materializer::new(&args.output_dir, sanitizer.as_ref())
            .context("resolving output directory")?;
        let reports = materializer
            .write_all(&playlists)
            .await
            .context("writing playlists")?;
        let missing: usize = reports.iter().map(|report| report.missing).sum();
        if missing > 0 {
            tracing::warn!("{} playlist entries have no downloaded file", missing);
        }
    }

    Ok(())
}

async fn helper_download<L>(
    args: &Args,
    catalog: &mut Catalog,
    lookup: L,
    params: SelectParams,
) -> Result<()>
where
    L: Lookup,
{
    let resolver = Resolver::new(lookup);
    let selection = select::select(catalog, &resolver, params).await;
    let mut items = selection.items;

    if !selection.failures.is_empty() {
        reconcile::report_failures(&selection.failures);
        let corrected = reconcile::reconcile(catalog, &selection.failures, &mut InquirePrompt)
            .context("reading uris")?;
        items.extend(corrected);
    }
    let items = select::sort_items(items);

    if let Some(snapshot) = &args.snapshot {
        helper_write_json(snapshot, &*catalog).await?;
    }

    tracing::info!(
        "calling {} to download {} items",
        args.group_downloader.downloader.display(),
        items.len()
    );
    let downloader = args.group_downloader.create_downloader(&args.output_dir);

    let disable_progress = std::env::var_os("SLDL_DISABLE_PROGRESS").is_some();
    let pb = if disable_progress {
        indicatif::ProgressBar::hidden()
    } else {
        indicatif::ProgressBar::new(items.len() as u64)
    };
    let template = "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}";
    pb.set_style(ProgressStyle::with_template(template)?.progress_chars("##-"));
    pb.enable_steady_tick(Duration::from_millis(200));

    let report = downloader
        .download_all(&items, |done, item| {
            pb.set_position(done as u64);
            pb.set_message(format!("{} {}", item.uri.resource, item.name()));
        })
        .await
        .context("running downloader")?;
    pb.finish_and_clear();

    tracing::info!(
        "download complete: {} succeeded, {} failed",
        report.succeeded,
        report.failed.len()
    );
    for uri in &report.failed {
        tracing::warn!("not downloaded: {}", uri);
    }

    Ok(())
}

async fn helper_get_credentials(auth: &GroupAuth) -> Result<ClientCredentials> {
    if let (Some(client_id), Some(client_secret)) = (&auth.client_id, &auth.client_secret) {
        return Ok(ClientCredentials {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        });
    }
    tracing::debug!("loading {}", auth.config.display());
    helper_read_json(&auth.config)
        .await
        .with_context(|| format!("reading credentials from {}", auth.config.display()))
}

async fn helper_read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let json = tokio::fs::read_to_string(path)
        .await
        .context("reading json")?;
    let obj = serde_json::from_str(&json).context("deserializing json")?;
    Ok(obj)
}

async fn helper_write_json<T>(path: &Path, v: &T) -> Result<()>
where
    T: Serialize,
{
    let serialized = serde_json::to_string_pretty(v).context("serializing json")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context("creating snapshot directory")?;
    }
    tokio::fs::write(path, serialized)
        .await
        .context("writing json")?;
    tracing::info!("wrote catalog snapshot to {}", path.display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let args = Args::parse();
    let default_filter = if args.verbose {
        "warn,sldl=debug"
    } else {
        "warn,sldl=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;
    tracing_subscriber::fmt::fmt()
        .with_env_filter(filter)
        .init();

    run(args).await
}
