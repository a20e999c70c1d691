use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sprite_forge_core::{
    Atlas, ExpectedSize, ForgeConfig, Frame, SliceOptions, SourceError, SpriteImage, SpriteSpec,
    SpriteValidation, StripRequest, StripSource, ValidationDocument, ValidationStatus,
    dominant_corner_color, ensure_alpha_channel, forge, frame_name, pack,
    remove_near_color_background, slice_grid, slice_strip_with, to_animation_json, to_atlas_json,
    to_plist, validate,
};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "sprite-forge",
    about = "Validate, repair and slice animation strips, then pack them into a sprite sheet",
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
    /// Check images for an alpha channel, size and a transparent border
    Validate(ValidateArgs),
    /// Add an alpha channel and clear a flat background color
    Fix(FixArgs),
    /// Cut a strip (or grid) into one PNG per frame
    Slice(SliceArgs),
    /// Pack loose frame PNGs (`<animation>_<index>.png`) into a sheet
    Pack(PackArgs),
    /// Build a sprite sheet from a sprite spec and a directory of strips
    Build(BuildArgs),
}

#[derive(Parser, Debug, Clone)]
struct ValidateArgs {
    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Required width
    #[arg(long)]
    width: Option<u32>,
    /// Required height
    #[arg(long)]
    height: Option<u32>,
    /// YAML config file path (only the `validator` section is used)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Minimum transparent border share in percent
    #[arg(long)]
    min_transparent: Option<f64>,
    /// Alpha at or below this counts as transparent
    #[arg(long)]
    alpha_threshold: Option<u8>,
    /// Write the validation document here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct FixArgs {
    /// Input image
    input: PathBuf,
    /// Output PNG
    #[arg(short, long)]
    out: PathBuf,
    /// Background color as hex (e.g. ff00ff); defaults to the dominant corner color
    #[arg(long)]
    color: Option<String>,
    /// Per-channel distance treated as background
    #[arg(long, default_value_t = 24)]
    tolerance: u8,
    /// Only add the alpha channel, keep every pixel opaque
    #[arg(long, default_value_t = false)]
    alpha_only: bool,
}

#[derive(Parser, Debug, Clone)]
struct SliceArgs {
    /// Strip image
    strip: PathBuf,
    #[arg(long)]
    frame_width: u32,
    #[arg(long)]
    frame_height: u32,
    /// Frames per row
    #[arg(long)]
    frames: u32,
    /// Rows (values above 1 slice a grid)
    #[arg(long, default_value_t = 1)]
    rows: u32,
    /// Output directory
    #[arg(short, long, default_value = "frames")]
    out_dir: PathBuf,
    /// File name prefix (defaults to the strip's file stem)
    #[arg(long)]
    name: Option<String>,
    /// Reject strips whose size does not match the frame layout
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Frame files or directories
    #[arg(required = true, help_heading = "Input/Output")]
    inputs: Vec<PathBuf>,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Sheet base name (files will be name.png/.json)
    #[arg(short, long, default_value = "sheet", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (only the `packer` section is used)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Pixels around every frame
    #[arg(long, help_heading = "Layout")]
    padding: Option<u32>,
    /// Row width limit
    #[arg(long, help_heading = "Layout")]
    max_width: Option<u32>,
    /// Round sheet dims up to powers of two
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Draw red outlines (debug)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    outlines: bool,
    /// Frame rate recorded for every animation
    #[arg(long, default_value_t = 12, help_heading = "Animation")]
    fps: u32,
    /// Mark animations as non-looping
    #[arg(long, default_value_t = false, help_heading = "Animation")]
    no_loop: bool,
    /// Also write a plist next to the JSON
    #[arg(long, default_value_t = false, help_heading = "Export")]
    plist: bool,
}

#[derive(Parser, Debug, Clone)]
struct BuildArgs {
    // Input/Output
    /// Sprite spec (JSON)
    #[arg(help_heading = "Input/Output")]
    spec: PathBuf,
    /// Directory holding one `<animation>.png` strip per animation
    #[arg(long, help_heading = "Input/Output")]
    strips: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// YAML config file path (flags below override it)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Layout
    /// Pixels around every frame
    #[arg(long, help_heading = "Layout")]
    padding: Option<u32>,
    /// Row width limit
    #[arg(long, help_heading = "Layout")]
    max_width: Option<u32>,
    /// Round sheet dims up to powers of two
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Draw red outlines (debug)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    outlines: bool,

    // Strips
    /// Resize strips to the expected size before slicing
    #[arg(long, default_value_t = false, help_heading = "Strips")]
    resize: bool,
    /// Fail on strips whose size does not match the frame layout
    #[arg(long, default_value_t = false, help_heading = "Strips")]
    strict: bool,
    /// Do not try to repair strips that fail validation
    #[arg(long, default_value_t = false, help_heading = "Strips")]
    no_fix: bool,
    /// Attempts per strip
    #[arg(long, help_heading = "Strips")]
    max_attempts: Option<u32>,

    // Export
    /// Also write a plist next to the JSON
    #[arg(long, default_value_t = false, help_heading = "Export")]
    plist: bool,
    /// Print the merged configuration (after YAML/flags) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: build the sheet but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Validate(args) => run_validate(args, progress),
        Commands::Fix(args) => run_fix(args),
        Commands::Slice(args) => run_slice(args),
        Commands::Pack(args) => run_pack(args, progress),
        Commands::Build(args) => run_build(args, progress),
    }
}

fn run_validate(args: &ValidateArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?.validator;
    if let Some(p) = args.min_transparent {
        cfg.min_transparent_border_percent = p;
    }
    if let Some(t) = args.alpha_threshold {
        cfg.alpha_threshold = t;
    }
    cfg.validate()?;
    let expected = ExpectedSize {
        width: args.width,
        height: args.height,
    };

    let mut paths = Vec::new();
    for input in &args.inputs {
        paths.extend(gather_images(input)?);
    }
    anyhow::ensure!(!paths.is_empty(), "no images found");

    let bar = progress_bar(paths.len() as u64, "validating", show_progress)?;
    let mut doc = ValidationDocument::new(std::iter::empty());
    for p in &paths {
        let file = p.to_string_lossy().replace('\\', "/");
        if let Some(b) = &bar {
            b.set_message(file.clone());
        }
        match SpriteImage::open(p) {
            Ok(img) => {
                let report = validate(&img, expected, &cfg);
                for w in &report.warnings {
                    warn!(%file, "{w}");
                }
                doc.sprites.push(SpriteValidation::from_report(file, &report));
            }
            Err(e) => {
                error!(%file, error = %e, "cannot decode image");
                doc.sprites.push(SpriteValidation {
                    file,
                    status: ValidationStatus::Fail,
                    alpha_channel_present: false,
                    transparent_pixels: 0.0,
                    issues: vec![e.to_string()],
                });
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }

    let json = serde_json::to_string_pretty(&doc)?;
    match &args.report {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            info!(?path, "validation report written");
        }
        None => println!("{json}"),
    }

    let failed = doc
        .sprites
        .iter()
        .filter(|s| s.status == ValidationStatus::Fail)
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} image(s) failed validation", doc.sprites.len());
    }
    info!(count = doc.sprites.len(), "all images passed");
    Ok(())
}

fn run_fix(args: &FixArgs) -> anyhow::Result<()> {
    let img = SpriteImage::open(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let mut fixed = ensure_alpha_channel(&img);
    if !args.alpha_only {
        let color = match &args.color {
            Some(hex) => Some(parse_hex_color(hex)?),
            None => dominant_corner_color(&fixed),
        };
        if let Some(color) = color {
            fixed = remove_near_color_background(&fixed, color, args.tolerance);
        }
    }

    let report = validate(&fixed, ExpectedSize::any(), &Default::default());
    if !report.is_valid {
        warn!(errors = ?report.errors, "image still fails validation after repair");
    }
    fixed
        .save_png(&args.out)
        .with_context(|| format!("write {}", args.out.display()))?;
    info!(out = ?args.out, valid = report.is_valid, "image written");
    Ok(())
}

fn run_slice(args: &SliceArgs) -> anyhow::Result<()> {
    let strip = SpriteImage::open(&args.strip)
        .with_context(|| format!("read {}", args.strip.display()))?;
    let out = if args.rows > 1 {
        slice_grid(&strip, args.frame_width, args.frame_height, args.frames, args.rows)
    } else {
        slice_strip_with(
            &strip,
            args.frame_width,
            args.frame_height,
            args.frames,
            &SliceOptions {
                strict: args.strict,
            },
        )?
    };
    for w in &out.warnings {
        warn!("{w}");
    }
    anyhow::ensure!(!out.frames.is_empty(), "no frames could be cut from the strip");

    let prefix = match &args.name {
        Some(n) => n.clone(),
        None => args
            .strip
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame")
            .to_string(),
    };
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    for f in &out.frames {
        let path = args
            .out_dir
            .join(format!("{}.png", frame_name(&prefix, f.frame_index)));
        f.image
            .save_png(&path)
            .with_context(|| format!("write {}", path.display()))?;
    }
    info!(frames = out.frames.len(), out_dir = ?args.out_dir, "frames written");
    Ok(())
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?.packer;
    if let Some(p) = args.padding {
        cfg.padding = p;
    }
    if let Some(w) = args.max_width {
        cfg.max_width = w;
    }
    if args.pow2 {
        cfg.power_of_two = true;
    }
    if args.outlines {
        cfg.outlines = true;
    }
    cfg.image_file_name = format!("{}.png", args.name);

    let mut paths = Vec::new();
    for input in &args.inputs {
        paths.extend(gather_images(input)?);
    }
    let frames = load_frames_with_progress(&paths, args.fps, !args.no_loop, show_progress)?;
    info!(count = frames.len(), "loaded frames");
    let out = pack(&frames, &cfg)?;

    let stats = out.stats();
    info!(
        width = out.atlas.sheet.width,
        height = out.atlas.sheet.height,
        animations = out.animations.len(),
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "sheet packed"
    );

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    write_sheet(&args.out_dir, &args.name, &out.atlas, args.plist)?;
    write_json(
        &args.out_dir.join(format!("{}.animations.json", args.name)),
        &to_animation_json(&out.animations),
    )?;
    Ok(())
}

fn load_frames_with_progress(
    paths: &[PathBuf],
    fps: u32,
    looping: bool,
    show_progress: bool,
) -> anyhow::Result<Vec<Frame>> {
    let bar = progress_bar(paths.len() as u64, "loading", show_progress)?;
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
        if let Some(b) = &bar {
            b.set_message(stem.to_string());
        }
        match SpriteImage::open(p) {
            Ok(img) => {
                let (animation, index) = split_frame_stem(stem);
                list.push(Frame::new(index, img).attach(animation, fps, looping));
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

/// `walk_3` -> (`walk`, 3); a stem without a numeric suffix is frame 0 of
/// an animation named after the whole stem.
fn split_frame_stem(stem: &str) -> (&str, u32) {
    match stem.rsplit_once('_') {
        Some((animation, index)) if !animation.is_empty() => match index.parse() {
            Ok(i) => (animation, i),
            Err(_) => (stem, 0),
        },
        _ => (stem, 0),
    }
}

fn run_build(args: &BuildArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = build_config(args)?;
    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let spec = SpriteSpec::from_path(&args.spec)
        .with_context(|| format!("load spec {}", args.spec.display()))?;
    cfg.packer.image_file_name = format!("{}.png", spec.name);

    let bar = progress_bar(spec.animations.len() as u64, "strips", show_progress)?;
    let mut source = DirectoryStripSource::new(&args.strips).with_progress(bar.clone());
    let out = forge(&spec, &mut source, &cfg)?;
    if let Some(b) = &bar {
        b.finish_and_clear();
    }

    for r in &out.reports {
        for w in &r.slice_warnings {
            warn!(animation = %r.animation, "{w}");
        }
        if !r.report.is_valid {
            warn!(animation = %r.animation, errors = ?r.report.errors, "strip failed validation");
        }
    }
    let stats = out.atlas.stats();
    info!(
        width = out.atlas.sheet.width,
        height = out.atlas.sheet.height,
        frames = stats.num_frames,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "sheet built"
    );
    if args.dry_run {
        return Ok(());
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    write_sheet(&args.out_dir, &spec.name, &out.atlas, args.plist)?;
    write_json(
        &args.out_dir.join(format!("{}.animations.json", spec.name)),
        &to_animation_json(&out.animations),
    )?;
    let doc = out.validation_document();
    write_json(
        &args.out_dir.join(format!("{}.validation.json", spec.name)),
        &doc.to_json(),
    )?;
    if !doc.all_passed() {
        warn!("some strips failed validation; see the validation report");
    }
    Ok(())
}

/// YAML file (when given) with the build flags applied on top.
fn build_config(args: &BuildArgs) -> anyhow::Result<ForgeConfig> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(p) = args.padding {
        cfg.packer.padding = p;
    }
    if let Some(w) = args.max_width {
        cfg.packer.max_width = w;
    }
    if args.pow2 {
        cfg.packer.power_of_two = true;
    }
    if args.outlines {
        cfg.packer.outlines = true;
    }
    if args.resize {
        cfg.resize_strips = true;
    }
    if args.strict {
        cfg.slice.strict = true;
    }
    if args.no_fix {
        cfg.fix.auto_fix = false;
    }
    if let Some(n) = args.max_attempts {
        cfg.retry.max_attempts = n;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ForgeConfig> {
    match path {
        Some(path) => {
            let file = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            let cfg: ForgeConfig = serde_yaml::from_str(&file)
                .with_context(|| format!("parse config {}", path.display()))?;
            Ok(cfg)
        }
        None => Ok(ForgeConfig::default()),
    }
}

/// Writes `<name>.png`, `<name>.json` and optionally `<name>.plist`.
fn write_sheet(out_dir: &Path, name: &str, atlas: &Atlas, plist: bool) -> anyhow::Result<()> {
    let png_path = out_dir.join(&atlas.sheet.image_file_name);
    atlas
        .image
        .save(&png_path)
        .with_context(|| format!("write {}", png_path.display()))?;
    info!(?png_path, "wrote sheet");
    write_json(&out_dir.join(format!("{name}.json")), &to_atlas_json(atlas))?;
    if plist {
        let plist_path = out_dir.join(format!("{name}.plist"));
        fs::write(&plist_path, to_plist(atlas))
            .with_context(|| format!("write {}", plist_path.display()))?;
        info!(?plist_path, "plist written");
    }
    Ok(())
}

fn write_json(path: &Path, value: &serde_json::Value) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    info!(?path, "json written");
    Ok(())
}

/// Reads pre-rendered strips from disk: `<dir>/<animation>.png`, falling back
/// to `<dir>/<sprite>_<animation>.png`.
struct DirectoryStripSource {
    dir: PathBuf,
    bar: Option<ProgressBar>,
}

impl DirectoryStripSource {
    fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            bar: None,
        }
    }

    fn with_progress(mut self, bar: Option<ProgressBar>) -> Self {
        self.bar = bar;
        self
    }

    fn candidates(&self, request: &StripRequest) -> [PathBuf; 2] {
        [
            self.dir.join(format!("{}.png", request.animation)),
            self.dir
                .join(format!("{}_{}.png", request.sprite, request.animation)),
        ]
    }
}

impl StripSource for DirectoryStripSource {
    fn attempt(&mut self, request: &StripRequest, _attempt: u32) -> Result<Vec<u8>, SourceError> {
        let candidates = self.candidates(request);
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Err(format!(
                "no strip for animation {:?} (looked for {})",
                request.animation,
                candidates[0].display()
            )
            .into());
        };
        let bytes = fs::read(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        if let Some(b) = &self.bar {
            b.set_message(request.animation.clone());
            b.inc(1);
        }
        Ok(bytes)
    }
}

fn gather_images(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        list.push(path.to_path_buf());
    } else if path.is_dir() {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    } else {
        anyhow::bail!("no such file or directory: {}", path.display());
    }
    Ok(list)
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg" | "webp")
    )
}

fn parse_hex_color(s: &str) -> anyhow::Result<[u8; 3]> {
    let hex = s.trim_start_matches('#');
    anyhow::ensure!(
        hex.len() == 6 && hex.is_ascii(),
        "color must be 6 hex digits, got {s:?}"
    );
    let mut out = [0u8; 3];
    for (i, c) in out.iter_mut().enumerate() {
        *c = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .with_context(|| format!("invalid hex color {s:?}"))?;
    }
    Ok(out)
}

fn progress_bar(len: u64, what: &str, enabled: bool) -> anyhow::Result<Option<ProgressBar>> {
    if !enabled {
        return Ok(None);
    }
    let b = ProgressBar::new(len);
    b.set_style(ProgressStyle::with_template(&format!(
        "{{spinner:.green}} {what} {{pos}}/{{len}} [{{elapsed_precise}}] {{wide_msg}}"
    ))?);
    Ok(Some(b))
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
