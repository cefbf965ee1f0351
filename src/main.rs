use anyhow::Result;
use clap::Parser;

use caption_server::caption::CaptionParams;

#[derive(Parser, Debug)]
#[command(
    name = "caption-server",
    version,
    about = "Serve images with a rendered caption box overlay"
)]
struct Cli {
    /// Listen address (overrides settings [server].addr)
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// Directory holding base images named <id>.jpg
    #[arg(long = "images-dir")]
    images_dir: Option<String>,

    /// Font used for glyph outlines (missing font falls back to text)
    #[arg(long = "font-path")]
    font_path: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Render one caption to this file and exit instead of serving
    #[arg(long = "render")]
    render: Option<String>,

    /// Base image id (with --render)
    #[arg(long = "img")]
    img: Option<String>,

    /// Body text; literal "\n" sequences become paragraph breaks (with --render)
    #[arg(long = "text")]
    text: Option<String>,

    /// Name label (with --render)
    #[arg(long = "name")]
    name: Option<String>,

    /// Stat label, may be percent-encoded (with --render)
    #[arg(long = "stat")]
    stat: Option<String>,

    /// Base font size (with --render)
    #[arg(long = "size")]
    size: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    caption_server::logging::init(cli.verbose)?;

    let render = cli.render.map(|output| caption_server::RenderConfig {
        output,
        params: CaptionParams {
            img: cli.img,
            text: cli.text.map(|text| text.replace("\\n", "\n")),
            name: cli.name,
            stat: cli.stat,
            size: cli.size,
        },
    });

    let output = caption_server::run(caption_server::Config {
        settings_path: cli.read_settings,
        addr: cli.addr,
        images_dir: cli.images_dir,
        font_path: cli.font_path,
        render,
    })
    .await?;

    if let Some(output) = output {
        println!("{}", output);
    }
    Ok(())
}
