use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use collage_core::compositing::RgbaBackend;
use collage_core::config::{CollageConfig, CornerStrategy, CostFunction, SortOrder};
use collage_core::{Collage, CollageError, ImageCatalog, Layout, Size};
use globset::{Glob, GlobSetBuilder};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Parser, Debug)]
#[command(
    name = "collage",
    about = "Pack a folder of pictures onto as few fixed-size canvases as possible",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack pictures and render one PNG per canvas plus a JSON layout
    Pack(PackArgs),
    /// Layout-only export (no PNGs): compute placements and write JSON
    Layout(PackArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Layout base name (metadata goes to name.json; canvases are canvasN.png)
    #[arg(short, long, default_value = "collage", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (overrides the matching options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Only look at the top level of the input directory
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    no_recurse: bool,

    // Layout
    /// Canvas size, WxH
    #[arg(long, default_value = "1920x1080", help_heading = "Layout")]
    area: String,
    /// Permitted overhang (and smallest kept leftover), WxH
    #[arg(long, default_value = "20x20", help_heading = "Layout")]
    overlap: String,
    /// Candidate cost: axis | area
    #[arg(long, default_value = "axis", help_heading = "Layout")]
    cost: String,
    /// Corner choice: random | nearest | tl | tr | bl | br
    #[arg(long, default_value = "random", help_heading = "Layout")]
    corner: String,
    /// Seed for random corners and shuffling
    #[arg(long, help_heading = "Layout")]
    seed: Option<u64>,
    /// Input order: area_desc | shuffle | none
    #[arg(long, default_value = "area_desc", help_heading = "Layout")]
    order: String,
    /// Do not shrink pictures larger than the canvas; they are reported as unplaceable
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    keep_oversized: bool,

    // Rendering
    /// Draw a red outline around every placed picture
    #[arg(long, default_value_t = false, help_heading = "Rendering")]
    outlines: bool,

    // Export
    /// Metadata format: json | json-hash
    #[arg(long, default_value = "json", value_parser = ["json", "json-hash"], help_heading = "Export")]
    metadata: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,

    #[arg(skip)]
    layout_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Layout(args) => {
            let mut a = args.clone();
            a.layout_only = true;
            run_pack(&a, cli.progress && !cli.quiet)
        }
    }
}

/// Configuration as printed by `--print-config`.
#[derive(Serialize)]
struct EffectiveConfig<'a> {
    #[serde(flatten)]
    collage: &'a CollageConfig,
    order: SortOrder,
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = CollageConfig {
        canvas_size: parse_size(&cli.area).context("--area")?,
        tolerance: Size::parse_tolerance(&cli.overlap).context("--overlap")?,
        cost: parse_cost(&cli.cost)?,
        corner: parse_corner(&cli.corner)?,
        seed: cli.seed,
        ..Default::default()
    };
    let mut order = parse_sort_order(&cli.order)?;

    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.apply(&mut cfg, &mut order)?;
    }
    cfg.validate()?;

    if cli.print_config {
        let effective = EffectiveConfig {
            collage: &cfg,
            order,
        };
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&effective)?),
            _ => println!("{}", serde_json::to_string_pretty(&effective)?),
        }
        return Ok(());
    }

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude, !cli.no_recurse)?;
    let mut catalog = probe_with_progress(&paths, show_progress);
    info!(count = catalog.len(), "probed input images");
    if catalog.is_empty() {
        return Err(CollageError::Empty)
            .with_context(|| format!("no images found under {}", cli.input.display()));
    }

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    catalog.arrange(order, &mut rng);
    if !cli.keep_oversized {
        let scaled = catalog.constrain_to(&cfg.canvas_size)?;
        if scaled > 0 {
            info!(scaled, "shrunk oversized images to the canvas");
        }
    }

    let mut collage = Collage::new(cfg, catalog.into_items())?;
    let report = collage.plan_with_rng(&mut rng)?;
    for u in &report.unplaced {
        warn!(key = %u.key, size = %u.size, reason = ?u.reason, "not placed");
    }

    let layout = collage.layout();
    let stats = layout.stats();
    info!(
        canvases = stats.num_canvases,
        placed = stats.num_placed,
        unplaced = stats.num_unplaced,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    if !cli.layout_only && !cli.dry_run {
        let backend = RgbaBackend {
            outlines: cli.outlines,
            ..Default::default()
        };
        #[cfg(feature = "parallel")]
        let canvases = collage.render_par(&backend)?;
        #[cfg(not(feature = "parallel"))]
        let canvases = collage.render(&backend)?;
        for (sheet, rgba) in layout.sheets.iter().zip(&canvases) {
            let png_path = cli.out_dir.join(format!("{}.png", sheet.name));
            rgba.save(&png_path)
                .with_context(|| format!("write {}", png_path.display()))?;
            info!(?png_path, id = sheet.id, "wrote canvas");
        }
    }

    if !cli.dry_run {
        write_metadata(cli, &layout)?;
    }

    if let Some(stats_path) = &cli.export_stats {
        let value = serde_json::json!({
            "canvases": stats.num_canvases,
            "placed": stats.num_placed,
            "unplaced": stats.num_unplaced,
            "used_area": stats.used_area.round() as u64,
            "total_area": stats.total_canvas_area.round() as u64,
            "occupancy": stats.occupancy,
        });
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&value)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        } else {
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

fn write_metadata(cli: &PackArgs, layout: &Layout) -> anyhow::Result<()> {
    let json_value = match cli.metadata.as_str() {
        "json-hash" => collage_core::to_json_hash(layout),
        _ => collage_core::to_json_layout(layout),
    };
    let json_path = cli.out_dir.join(format!("{}.json", cli.name));
    let json = serde_json::to_string_pretty(&json_value)?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(?json_path, canvases = layout.sheets.len(), "layout written");
    Ok(())
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
    recurse: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .max_depth(if recurse { usize::MAX } else { 1 });
        for entry in walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<globset::GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if exclude.is_some_and(|ex| ex.is_match(&s)) {
        return true;
    }
    include.is_some_and(|inc| !inc.is_match(&s))
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp")
    )
}

/// Reads image headers only; pixels are decoded later, one canvas at a time.
fn probe_with_progress(paths: &[PathBuf], progress: bool) -> ImageCatalog {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = progress.then(|| {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} probing {pos}/{len} [{elapsed_precise}] {wide_msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        b
    });
    let catalog = ImageCatalog::probe_with(paths, |p| {
        if let Some(b) = &bar {
            let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
            b.set_message(msg.to_string());
            b.inc(1);
        }
    });
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    catalog
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    area: Option<String>,
    overlap: Option<String>,
    cost: Option<String>,
    corner: Option<String>,
    seed: Option<u64>,
    order: Option<String>,
    filter_empty: Option<bool>,
}

impl YamlConfig {
    fn apply(self, cfg: &mut CollageConfig, order: &mut SortOrder) -> anyhow::Result<()> {
        if let Some(v) = self.area {
            cfg.canvas_size = parse_size(&v).context("config area")?;
        }
        if let Some(v) = self.overlap {
            cfg.tolerance = Size::parse_tolerance(&v).context("config overlap")?;
        }
        if let Some(v) = self.cost {
            cfg.cost = parse_cost(&v)?;
        }
        if let Some(v) = self.corner {
            cfg.corner = parse_corner(&v)?;
        }
        if let Some(v) = self.seed {
            cfg.seed = Some(v);
        }
        if let Some(v) = self.order {
            *order = parse_sort_order(&v)?;
        }
        if let Some(v) = self.filter_empty {
            cfg.filter_empty = v;
        }
        Ok(())
    }
}

fn parse_size(s: &str) -> anyhow::Result<Size> {
    Ok(s.parse::<Size>()?)
}

fn parse_cost(s: &str) -> anyhow::Result<CostFunction> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown cost function: {}", s))
}

fn parse_corner(s: &str) -> anyhow::Result<CornerStrategy> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown corner: {}", s))
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}
