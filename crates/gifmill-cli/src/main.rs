//! gifmill - Assemble still images into animated GIFs
//!
//! A command-line tool that encodes one or more input images as the frames
//! of a single GIF file.

use clap::{Parser, Subcommand, ValueEnum};
use gifmill::{DisposalMethod, GifEncoder, ImageOptions, Quantizer};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gifmill")]
#[command(version)]
#[command(about = "Assemble still images into animated GIFs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode one or more images as the frames of a GIF
    Encode {
        /// Input image files, in frame order (PNG, JPEG, GIF, WebP)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output GIF file
        #[arg(short, long)]
        output: PathBuf,

        /// Delay between frames in hundredths of a second
        #[arg(short, long, default_value = "10")]
        delay: u16,

        /// Number of times the animation repeats (0 = forever)
        #[arg(short, long, default_value = "0")]
        loop_count: u16,

        /// Color reduction strategy for frames with more than 256 colors
        #[arg(short, long, value_enum, default_value = "median-cut")]
        quantizer: QuantizerArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum QuantizerArg {
    MedianCut,
    KMeans,
    Uniform,
}

impl From<QuantizerArg> for Quantizer {
    fn from(arg: QuantizerArg) -> Self {
        match arg {
            QuantizerArg::MedianCut => Quantizer::MedianCut,
            QuantizerArg::KMeans => Quantizer::KMeans,
            QuantizerArg::Uniform => Quantizer::Uniform,
        }
    }
}

/// The logical screen descriptor stores 16-bit dimensions, so larger
/// images cannot be encoded at all.
fn screen_size(width: u32, height: u32) -> Result<(u16, u16), String> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(format!(
            "image is too large for GIF: {}x{} exceeds the 65535-pixel side limit",
            width, height
        )),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            inputs,
            output,
            delay,
            loop_count,
            quantizer,
        } => {
            // The first frame fixes the logical screen size; later frames
            // must fit inside it.
            let frames: Vec<_> = inputs
                .iter()
                .map(|path| {
                    let img = image::open(path)
                        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
                    Ok::<_, String>(img.to_rgb8())
                })
                .collect::<Result<_, _>>()?;
            let (width, height) = frames[0].dimensions();
            let (screen_width, screen_height) = screen_size(width, height)?;

            eprintln!(
                "Encoding {} frame(s) at {}x{}, delay={} cs",
                frames.len(),
                width,
                height,
                delay
            );

            let options = ImageOptions {
                quantizer: quantizer.into(),
                disposal_method: DisposalMethod::DoNotDispose,
                delay_centiseconds: delay,
                ..ImageOptions::default()
            };

            let sink = BufWriter::new(File::create(&output)?);
            let mut encoder = GifEncoder::new(sink, screen_width, screen_height, loop_count)?;
            for (path, frame) in inputs.iter().zip(&frames) {
                let rgb: Vec<u32> = frame
                    .pixels()
                    .map(|p| u32::from(p[0]) << 16 | u32::from(p[1]) << 8 | u32::from(p[2]))
                    .collect();
                encoder
                    .add_image_rgb(&rgb, frame.width() as usize, &options)
                    .map_err(|e| format!("Failed to encode '{}': {}", path.display(), e))?;
            }
            encoder.finish()?;

            eprintln!("Written '{}'", output.display());
        }
    }

    Ok(())
}
