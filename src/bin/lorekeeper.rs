use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lorekeeper", version)]
struct Cli {
    /// Log resolution and compositing decisions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the effective snapshot of a wiki entry or map.
    Resolve(ResolveArgs),
    /// Compose a map for a reader position and print the view state.
    Compose(ComposeArgs),
    /// Print an entity's snapshot history in effective order.
    History(HistoryArgs),
    /// Print the viewport frame for an image size.
    Bounds(BoundsArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct EntityArg {
    /// Wiki entry id.
    #[arg(long)]
    wiki: Option<u64>,

    /// Map id.
    #[arg(long)]
    map: Option<u64>,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Input content document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    entity: EntityArg,

    /// Reader branch; omit with --chapter for the unrestricted view.
    #[arg(long, requires = "chapter")]
    branch: Option<u64>,

    /// Reader chapter.
    #[arg(long, requires = "branch")]
    chapter: Option<u64>,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input content document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Map id.
    #[arg(long)]
    map: u64,

    /// Reader branch.
    #[arg(long)]
    branch: u64,

    /// Reader chapter.
    #[arg(long)]
    chapter: u64,

    /// Initial zoom.
    #[arg(long, allow_negative_numbers = true)]
    zoom: Option<f64>,

    /// Lowest zoom level.
    #[arg(long, allow_negative_numbers = true)]
    min_zoom: Option<f64>,

    /// Highest zoom level.
    #[arg(long, allow_negative_numbers = true)]
    max_zoom: Option<f64>,
}

#[derive(Parser, Debug)]
struct HistoryArgs {
    /// Input content document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    entity: EntityArg,
}

#[derive(Parser, Debug)]
struct BoundsArgs {
    /// Image width in pixels.
    #[arg(long)]
    width: u32,

    /// Image height in pixels.
    #[arg(long)]
    height: u32,
}

/// Presents nothing; the plan is printed instead.
struct Headless;

impl lorekeeper::SpatialLibrary for Headless {
    fn present(&mut self, _plan: &lorekeeper::RenderPlan) -> anyhow::Result<()> {
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Resolve(args) => cmd_resolve(args),
        Command::Compose(args) => cmd_compose(args),
        Command::History(args) => cmd_history(args),
        Command::Bounds(args) => cmd_bounds(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn read_store(path: &Path) -> anyhow::Result<lorekeeper::ContentStore> {
    let f = File::open(path)
        .with_context(|| format!("open content document '{}'", path.display()))?;
    let doc: lorekeeper::ContentDocument =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse content document JSON")?;
    let store = lorekeeper::ContentStore::from_document(doc, lorekeeper::LineageConfig::default())
        .with_context(|| format!("load content document '{}'", path.display()))?;
    Ok(store)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value).with_context(|| "serialize output")?;
    println!("{s}");
    Ok(())
}

fn resolution_json<S: serde::Serialize>(res: lorekeeper::Resolution<'_, S>) -> serde_json::Value {
    match res {
        lorekeeper::Resolution::Revealed(s) => json!({ "status": "revealed", "snapshot": s }),
        lorekeeper::Resolution::Unrevealed => json!({ "status": "unrevealed" }),
    }
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let store = read_store(&args.in_path)?;
    let position = match (args.branch, args.chapter) {
        (Some(b), Some(c)) => Some(lorekeeper::ReaderPosition::new(
            lorekeeper::BranchId(b),
            lorekeeper::ChapterId(c),
        )),
        _ => None,
    };

    let out = match (args.entity.wiki, args.entity.map) {
        (Some(id), _) => {
            resolution_json(store.resolve_wiki(lorekeeper::WikiEntryId(id), position)?)
        }
        (None, Some(id)) => resolution_json(store.resolve_map(lorekeeper::MapId(id), position)?),
        (None, None) => anyhow::bail!("one of --wiki or --map is required"),
    };
    print_json(&out)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let store = read_store(&args.in_path)?;

    let mut settings = lorekeeper::ComposeSettings::default();
    if let Some(z) = args.min_zoom {
        settings.viewport.min_zoom = z;
    }
    if let Some(z) = args.max_zoom {
        settings.viewport.max_zoom = z;
    }
    if let Some(z) = args.zoom {
        settings.viewport.initial_zoom = z;
    }
    settings.viewport.validate()?;

    let position = lorekeeper::ReaderPosition::new(
        lorekeeper::BranchId(args.branch),
        lorekeeper::ChapterId(args.chapter),
    );
    let mut session = lorekeeper::ReaderSession::new(&store, position)?;
    let mut view = lorekeeper::MapView::new(settings);
    view.load_library(|| Ok(Headless))?;

    let state = view.render(&mut session, lorekeeper::MapId(args.map))?;
    if let lorekeeper::MapViewState::Ready { plan } = &state {
        for rejected in &plan.rejected {
            eprintln!(
                "skipped object {} in layer {}: {}",
                rejected.object_id, rejected.layer_id, rejected.error
            );
        }
    }
    print_json(&state)
}

fn cmd_history(args: HistoryArgs) -> anyhow::Result<()> {
    let store = read_store(&args.in_path)?;
    match (args.entity.wiki, args.entity.map) {
        (Some(id), _) => print_json(&store.wiki_history(lorekeeper::WikiEntryId(id))?),
        (None, Some(id)) => print_json(&store.map_history(lorekeeper::MapId(id))?),
        (None, None) => anyhow::bail!("one of --wiki or --map is required"),
    }
}

fn cmd_bounds(args: BoundsArgs) -> anyhow::Result<()> {
    let canvas = lorekeeper::MapCanvas {
        width: args.width,
        height: args.height,
    };
    let viewport = lorekeeper::Viewport::new(canvas, lorekeeper::ViewportConfig::default())?;
    print_json(&viewport)
}
