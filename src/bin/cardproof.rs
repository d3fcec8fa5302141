use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "cardproof", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the full-card preview of one side as a PNG.
    Preview(RenderArgs),
    /// Render the safe-area print crop of one side as a PNG.
    PrintCrop(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input design JSON (the design store's edit payload).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Which side to render.
    #[arg(long, value_enum, default_value_t = SideChoice::Front)]
    side: SideChoice,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Corner radius in pixels; > 0 renders a rounded card.
    #[arg(long, default_value_t = 0.0)]
    radius: f64,

    /// Card trim length in inches (defaults to 3.5).
    #[arg(long)]
    length_in: Option<f64>,

    /// Card trim width in inches (defaults to 2).
    #[arg(long)]
    width_in: Option<f64>,

    /// Hold the card vertically (length maps to canvas height).
    #[arg(long)]
    vertical: bool,

    /// Map an image source reference to a local file: `SOURCE=PATH`.
    /// Sources without a mapping fall back to reference previews.
    #[arg(long = "image", value_name = "SOURCE=PATH")]
    images: Vec<String>,

    /// Register a font family from a file: `FAMILY=PATH`.
    #[arg(long = "font", value_name = "FAMILY=PATH")]
    fonts: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SideChoice {
    Front,
    Back,
}

impl From<SideChoice> for cardproof::SideId {
    fn from(side: SideChoice) -> Self {
        match side {
            SideChoice::Front => Self::Front,
            SideChoice::Back => Self::Back,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Preview(args) => cmd_render(args, Mode::FullCard),
        Command::PrintCrop(args) => cmd_render(args, Mode::PrintCrop),
    }
}

enum Mode {
    FullCard,
    PrintCrop,
}

fn read_design_json(path: &Path) -> anyhow::Result<cardproof::DesignEditPayload> {
    let f = File::open(path).with_context(|| format!("open design '{}'", path.display()))?;
    let r = BufReader::new(f);
    let payload: cardproof::DesignEditPayload =
        serde_json::from_reader(r).context("parse design JSON")?;
    Ok(payload)
}

fn split_mapping<'a>(raw: &'a str, flag: &str) -> anyhow::Result<(&'a str, &'a str)> {
    raw.split_once('=')
        .with_context(|| format!("--{flag} expects KEY=PATH, got '{raw}'"))
}

fn cmd_render(args: RenderArgs, mode: Mode) -> anyhow::Result<()> {
    let payload = read_design_json(&args.in_path)?;

    let size = match (args.length_in, args.width_in) {
        (Some(length_in), Some(width_in)) => Some(cardproof::PrintSize {
            length_in,
            width_in,
        }),
        _ => None,
    };
    let orientation = if args.vertical {
        cardproof::Orientation::Vertical
    } else {
        cardproof::Orientation::Horizontal
    };

    let mut editor = cardproof::EditorState::new(size, orientation);
    cardproof::load_initial(&mut editor, &payload);

    let mut pixels = cardproof::PixelSource::new();
    for mapping in &args.images {
        let (source, path) = split_mapping(mapping, "image")?;
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{path}'"))?;
        let prepared = cardproof::assets::decode_image(&bytes)
            .with_context(|| format!("decode image '{path}'"))?;
        pixels.insert(cardproof::ImageSourceRef(source.to_string()), prepared);
    }

    let mut fonts = cardproof::FontCatalog::new();
    for mapping in &args.fonts {
        let (family, path) = split_mapping(mapping, "font")?;
        let bytes = std::fs::read(path).with_context(|| format!("read font '{path}'"))?;
        fonts.register(family, bytes);
    }

    let mut compositor = cardproof::Compositor::new(fonts);
    let side = editor.side(args.side.into());
    let preview = match mode {
        Mode::FullCard => {
            compositor.render_full_card(side, &editor.preset, args.radius, &pixels)?
        }
        Mode::PrintCrop => compositor.render_print_crop(side, &editor.preset, &pixels)?,
    };

    let encoded = match preview {
        Some(cardproof::SidePreview::Encoded(bytes)) => bytes,
        Some(cardproof::SidePreview::Reference(url)) => {
            anyhow::bail!("'{url}' has no pixels; pass --image {url}=PATH to rasterize it")
        }
        None => anyhow::bail!("that side has no content to render"),
    };

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &encoded)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
