use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cardsmith", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the templates a card config offers.
    Templates(TemplatesArgs),
    /// Compose a card and export it.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct TemplatesArgs {
    /// Card config JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Card config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Template id from the config's catalog.
    #[arg(long)]
    template: String,

    /// User photo (any format the `image` crate decodes).
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Horizontal photo center as a fraction of the template width.
    #[arg(long)]
    photo_x: Option<f64>,

    /// Vertical photo center as a fraction of the template height.
    #[arg(long)]
    photo_y: Option<f64>,

    /// Photo zoom.
    #[arg(long)]
    scale: Option<f64>,

    /// Overlay text, as `id=value`. Repeatable.
    #[arg(long = "text", value_parser = parse_assignment)]
    texts: Vec<(String, String)>,

    /// Overlay colour, as `id=#rrggbb`. Repeatable.
    #[arg(long = "color", value_parser = parse_assignment)]
    colors: Vec<(String, String)>,

    /// Overlay horizontal position as a fraction of the template width, as `id=x`. Repeatable.
    #[arg(long = "text-x", value_parser = parse_fraction_assignment)]
    text_xs: Vec<(String, f64)>,

    /// Overlay vertical position as a fraction of the template height, as `id=y`. Repeatable.
    #[arg(long = "text-y", value_parser = parse_fraction_assignment)]
    text_ys: Vec<(String, f64)>,

    /// Overlay size multiplier, as `id=scale`. Repeatable.
    #[arg(long = "text-scale", value_parser = parse_scale_assignment)]
    text_scales: Vec<(String, f32)>,

    /// Output file; `.png` selects PNG, anything else JPEG.
    #[arg(long)]
    out: PathBuf,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected id=value, got '{s}'"))?;
    if k.trim().is_empty() {
        return Err(format!("empty id in '{s}'"));
    }
    Ok((k.trim().to_owned(), v.to_owned()))
}

fn parse_fraction_assignment(s: &str) -> Result<(String, f64), String> {
    let (id, v) = parse_assignment(s)?;
    let v: f64 = v
        .trim()
        .parse()
        .map_err(|e| format!("bad number in '{s}': {e}"))?;
    if !v.is_finite() {
        return Err(format!("non-finite value in '{s}'"));
    }
    Ok((id, v))
}

fn parse_scale_assignment(s: &str) -> Result<(String, f32), String> {
    let (id, v) = parse_fraction_assignment(s)?;
    if v <= 0.0 {
        return Err(format!("scale must be > 0 in '{s}'"));
    }
    Ok((id, v as f32))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Templates(args) => cmd_templates(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_config(path: &Path) -> anyhow::Result<cardsmith::CardConfig> {
    cardsmith::CardConfig::from_path(path)
        .with_context(|| format!("load card config '{}'", path.display()))
}

fn cmd_templates(args: TemplatesArgs) -> anyhow::Result<()> {
    let cfg = read_config(&args.config)?;
    let catalog = cfg.catalog()?;
    for entry in catalog.entries() {
        println!("{}\t{}\t{}", entry.id, entry.label, entry.source.display());
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = read_config(&args.config)?;
    let mut editor = cfg.build_editor()?;
    let loader = cardsmith::FsImageLoader;

    match editor.load_template_with(&loader, &args.template)? {
        cardsmith::LoadOutcome::Applied => {}
        other => anyhow::bail!("template '{}' could not be loaded ({other:?})", args.template),
    }

    if let Some(photo) = &args.photo {
        let outcome = editor.load_photo_with(&loader, cardsmith::ImageSource::path(photo));
        if outcome != cardsmith::LoadOutcome::Applied {
            anyhow::bail!("photo '{}' could not be loaded ({outcome:?})", photo.display());
        }
    }

    let mut events = Vec::new();
    events.extend(args.photo_x.map(cardsmith::ParamEvent::PhotoX));
    events.extend(args.photo_y.map(cardsmith::ParamEvent::PhotoY));
    events.extend(args.scale.map(cardsmith::ParamEvent::PhotoScale));
    for (id, text) in args.texts {
        events.push(cardsmith::ParamEvent::OverlayText { id, text });
    }
    for (id, hex) in args.colors {
        let color = cardsmith::assets::color::parse_hex_color(&hex)
            .with_context(|| format!("colour for overlay '{id}'"))?;
        events.push(cardsmith::ParamEvent::OverlayColor { id, color });
    }
    for (id, value) in args.text_xs {
        events.push(cardsmith::ParamEvent::OverlayX { id, value });
    }
    for (id, value) in args.text_ys {
        events.push(cardsmith::ParamEvent::OverlayY { id, value });
    }
    for (id, value) in args.text_scales {
        events.push(cardsmith::ParamEvent::OverlayScale { id, value });
    }
    for ev in events {
        editor.on_parameter_changed(ev);
    }
    editor.on_frame();
    if !editor.confirm() {
        anyhow::bail!("card is incomplete; a template and a photo are required");
    }

    let mut opts = cfg.export_opts();
    opts.format = match args.out.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => cardsmith::ExportFormat::Png,
        _ => cardsmith::ExportFormat::Jpeg,
    };
    opts.file_name = args
        .out
        .file_name()
        .and_then(|n| n.to_str())
        .context("output path has no file name")?
        .to_owned();
    let exporter = cardsmith::Exporter::new(opts)?;

    let dir = args
        .out
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut sink = cardsmith::FileSink::new(dir);
    match editor.export(&exporter, &mut sink) {
        cardsmith::ExportOutcome::Persisted(img) => {
            eprintln!(
                "wrote {} ({}x{}, {} bytes)",
                args.out.display(),
                img.width,
                img.height,
                img.bytes.len()
            );
            Ok(())
        }
        cardsmith::ExportOutcome::Disabled => anyhow::bail!("export is not available yet"),
        cardsmith::ExportOutcome::Failed(e) => {
            Err(anyhow::Error::new(e).context(format!("export '{}'", args.out.display())))
        }
    }
}
