//! The GIF stream orchestrator.
//!
//! `GifEncoder` owns the output sink and drives the per-frame pipeline:
//! histogram, quantization (when a frame exceeds 256 distinct colors),
//! dithering, color table construction, and LZW compression, wrapped in the
//! fixed-layout blocks the format prescribes.

use std::io::Write;

use crate::color::Color;
use crate::color_table::ColorTable;
use crate::dither::Ditherer;
use crate::image::Image;
use crate::lzw::LzwEncoder;
use crate::quant::Quantizer;
use crate::{GifError, Result, MAX_COLOR_COUNT};

const EXTENSION_INTRODUCER: u8 = 0x21;
const GRAPHICS_CONTROL_LABEL: u8 = 0xF9;
const APPLICATION_EXTENSION_LABEL: u8 = 0xFF;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;
const BLOCK_TERMINATOR: u8 = 0;
const MAX_SUB_BLOCK_LENGTH: usize = 255;

/// How a decoder should treat a frame's pixels once its delay elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    /// No preference; most decoders treat this like `DoNotDispose`.
    #[default]
    Unspecified,
    /// Leave the frame in place; the next frame draws over it.
    DoNotDispose,
    /// Clear the frame's region to the background color.
    RestoreToBackground,
    /// Restore whatever the region held before this frame was drawn.
    RestoreToPrevious,
}

impl DisposalMethod {
    fn field_value(self) -> u8 {
        match self {
            DisposalMethod::Unspecified => 0,
            DisposalMethod::DoNotDispose => 1,
            DisposalMethod::RestoreToBackground => 2,
            DisposalMethod::RestoreToPrevious => 3,
        }
    }
}

/// Per-frame encoding options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOptions {
    /// Horizontal offset of the frame within the logical screen.
    pub left: u16,
    /// Vertical offset of the frame within the logical screen.
    pub top: u16,
    /// Strategy used when the frame has more than 256 distinct colors.
    pub quantizer: Quantizer,
    /// Strategy for remapping pixels onto the quantized palette.
    pub ditherer: Ditherer,
    /// What happens to the frame once its delay elapses.
    pub disposal_method: DisposalMethod,
    /// How long the frame stays on screen, in hundredths of a second.
    pub delay_centiseconds: u16,
}

/// Streaming GIF encoder. Construction writes the file preamble; each
/// `add_image` call appends one frame; `finish` writes the trailer and
/// hands the sink back.
pub struct GifEncoder<W: Write> {
    sink: W,
    screen_width: u16,
    screen_height: u16,
}

impl<W: Write> GifEncoder<W> {
    /// Starts a GIF stream: header, logical screen descriptor, and the
    /// Netscape looping extension. A `loop_count` of 0 loops forever.
    pub fn new(mut sink: W, screen_width: u16, screen_height: u16, loop_count: u16) -> Result<Self> {
        if screen_width == 0 || screen_height == 0 {
            return Err(GifError::InvalidDimensions {
                width: screen_width as usize,
                height: screen_height as usize,
            });
        }
        write_header(&mut sink)?;
        write_logical_screen_descriptor(&mut sink, screen_width, screen_height)?;
        write_netscape_looping_extension(&mut sink, loop_count)?;
        Ok(Self {
            sink,
            screen_width,
            screen_height,
        })
    }

    /// Appends one frame.
    ///
    /// Frames with at most 256 distinct colors are encoded losslessly; any
    /// larger color population goes through the configured quantizer and
    /// ditherer first.
    pub fn add_image(&mut self, image: &Image, options: &ImageOptions) -> Result<()> {
        if usize::from(options.left) + image.width() > usize::from(self.screen_width)
            || usize::from(options.top) + image.height() > usize::from(self.screen_height)
        {
            return Err(GifError::ImageOutOfBounds {
                left: options.left,
                top: options.top,
                width: image.width(),
                height: image.height(),
                screen_width: self.screen_width,
                screen_height: self.screen_height,
            });
        }

        let histogram = image.color_histogram();
        let palette: Vec<Color>;
        let dithered: Option<Image>;
        if histogram.distinct_len() > MAX_COLOR_COUNT {
            palette = options.quantizer.quantize(&histogram, MAX_COLOR_COUNT);
            dithered = Some(options.ditherer.dither(image, &palette));
        } else {
            palette = histogram.distinct().collect();
            dithered = None;
        }
        let frame = dithered.as_ref().unwrap_or(image);

        let color_table = ColorTable::from_colors(palette);
        let padded_size = color_table.padded_size();
        let indices = color_table.indices(frame);

        write_graphics_control_extension(
            &mut self.sink,
            options.disposal_method,
            options.delay_centiseconds,
        )?;
        write_image_descriptor(
            &mut self.sink,
            options.left,
            options.top,
            frame.width() as u16,
            frame.height() as u16,
            color_table_size_field(padded_size),
        )?;
        color_table.write(&mut self.sink)?;

        let lzw = LzwEncoder::new(padded_size)?;
        let compressed = lzw.encode(&indices)?;
        write_image_data(&mut self.sink, lzw.minimum_code_size(), &compressed)?;
        Ok(())
    }

    /// Appends one frame given as a flat buffer of packed `0xRRGGBB` pixels.
    pub fn add_image_rgb(&mut self, rgb: &[u32], width: usize, options: &ImageOptions) -> Result<()> {
        self.add_image(&Image::from_rgb(rgb, width)?, options)
    }

    /// Writes the trailer and returns the sink. Call exactly once per file.
    pub fn finish(mut self) -> Result<W> {
        self.sink.write_all(&[TRAILER])?;
        Ok(self.sink)
    }
}

/// The "size of color table" field uses a 2^(n+1) representation.
fn color_table_size_field(padded_size: usize) -> u8 {
    let mut field = 0;
    while 1usize << (field + 1) < padded_size {
        field += 1;
    }
    field as u8
}

fn write_header<W: Write>(sink: &mut W) -> Result<()> {
    sink.write_all(b"GIF89a")?;
    Ok(())
}

fn write_logical_screen_descriptor<W: Write>(sink: &mut W, width: u16, height: u16) -> Result<()> {
    sink.write_all(&width.to_le_bytes())?;
    sink.write_all(&height.to_le_bytes())?;
    // Packed field: no global color table, color resolution 1, not sorted,
    // global color table size 0.
    sink.write_all(&[1 << 4])?;
    sink.write_all(&[0])?; // background color index
    sink.write_all(&[0])?; // pixel aspect ratio
    Ok(())
}

fn write_netscape_looping_extension<W: Write>(sink: &mut W, loop_count: u16) -> Result<()> {
    const APPLICATION: &[u8] = b"NETSCAPE2.0";
    sink.write_all(&[
        EXTENSION_INTRODUCER,
        APPLICATION_EXTENSION_LABEL,
        APPLICATION.len() as u8,
    ])?;
    sink.write_all(APPLICATION)?;
    sink.write_all(&[3, 1])?; // sub-block size, looping sub-block id
    sink.write_all(&loop_count.to_le_bytes())?;
    sink.write_all(&[BLOCK_TERMINATOR])?;
    Ok(())
}

fn write_graphics_control_extension<W: Write>(
    sink: &mut W,
    disposal_method: DisposalMethod,
    delay_centiseconds: u16,
) -> Result<()> {
    sink.write_all(&[EXTENSION_INTRODUCER, GRAPHICS_CONTROL_LABEL, 4])?;
    // Packed field: disposal method in bits 2-4; no user input, no
    // transparent color.
    sink.write_all(&[disposal_method.field_value() << 2])?;
    sink.write_all(&delay_centiseconds.to_le_bytes())?;
    sink.write_all(&[0])?; // transparent color index (unused)
    sink.write_all(&[BLOCK_TERMINATOR])?;
    Ok(())
}

fn write_image_descriptor<W: Write>(
    sink: &mut W,
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    color_table_size_field: u8,
) -> Result<()> {
    const LOCAL_COLOR_TABLE_FLAG: u8 = 1 << 7;
    sink.write_all(&[IMAGE_SEPARATOR])?;
    sink.write_all(&left.to_le_bytes())?;
    sink.write_all(&top.to_le_bytes())?;
    sink.write_all(&width.to_le_bytes())?;
    sink.write_all(&height.to_le_bytes())?;
    // Packed field: local color table present, no interlace, not sorted.
    sink.write_all(&[LOCAL_COLOR_TABLE_FLAG | color_table_size_field])?;
    Ok(())
}

/// Wraps the compressed stream into sub-blocks of at most 255 bytes,
/// terminated by a zero-length block.
fn write_image_data<W: Write>(sink: &mut W, minimum_code_size: u8, lzw_data: &[u8]) -> Result<()> {
    sink.write_all(&[minimum_code_size])?;
    for sub_block in lzw_data.chunks(MAX_SUB_BLOCK_LENGTH) {
        sink.write_all(&[sub_block.len() as u8])?;
        sink.write_all(sub_block)?;
    }
    sink.write_all(&[BLOCK_TERMINATOR])?;
    Ok(())
}
