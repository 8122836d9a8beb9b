//! GIF-variant LZW compression.
//!
//! Compresses a sequence of palette indices into the variable-code-width
//! bitstream the GIF image data block carries. The surrounding sub-block
//! chunking is the encoder's concern, not this module's.

use std::collections::HashMap;

use crate::{GifError, Result};

/// Code widths may not exceed 12 bits, so the code table caps at 4096
/// entries and resets via a clear code when full.
const MAX_CODE_TABLE_SIZE: u16 = 1 << 12;

/// GIF-variant LZW compressor over the alphabet `0..color_table_size`.
#[derive(Debug, Clone)]
pub struct LzwEncoder {
    color_table_size: usize,
    minimum_code_size: u8,
}

impl LzwEncoder {
    /// Creates a compressor for the given (padded) color table size, which
    /// must be a power of two no smaller than 2.
    pub fn new(color_table_size: usize) -> Result<Self> {
        if color_table_size < 2 || !color_table_size.is_power_of_two() {
            return Err(GifError::InvalidColorTableSize(color_table_size));
        }
        Ok(Self {
            color_table_size,
            minimum_code_size: compute_minimum_code_size(color_table_size),
        })
    }

    /// What the GIF specification calls the "code size": the smallest width
    /// (at least 2) holding every color index. Actual codes start one bit
    /// wider to make room for the clear and end-of-information codes.
    pub fn minimum_code_size(&self) -> u8 {
        self.minimum_code_size
    }

    /// Compresses a sequence of palette indices into the raw LZW byte
    /// stream: a leading clear code, the compressed phrases, and a trailing
    /// end-of-information code, bit-packed least-significant-bit first.
    ///
    /// Fails only if an index is out of range for the color table.
    pub fn encode(&self, indices: &[u8]) -> Result<Vec<u8>> {
        // The clear code must equal 2^minimum_code_size, so codes for the
        // full minimum-code-size range are reserved for colors even when
        // the actual table is smaller. Single-index phrases encode as the
        // index itself and are not stored in the map.
        let clear_code = 1u16 << self.minimum_code_size;
        let end_code = clear_code + 1;

        let mut table: HashMap<Vec<u8>, u16> = HashMap::new();
        let mut next_code = end_code + 1;
        let mut code_width = u32::from(self.minimum_code_size) + 1;

        let mut output = BitPacker::new();
        output.write_code(clear_code, code_width);

        let mut phrase: Vec<u8> = Vec::new();
        for &index in indices {
            if usize::from(index) >= self.color_table_size {
                return Err(GifError::IndexOutOfRange {
                    index: usize::from(index),
                    size: self.color_table_size,
                });
            }
            phrase.push(index);
            if phrase.len() == 1 || table.contains_key(&phrase) {
                continue;
            }

            // The extended phrase is new: emit the known prefix, register
            // the extension, and restart from the current index.
            output.write_code(code_for(&table, &phrase[..phrase.len() - 1]), code_width);
            if next_code == MAX_CODE_TABLE_SIZE {
                output.write_code(clear_code, code_width);
                table.clear();
                next_code = end_code + 1;
                code_width = u32::from(self.minimum_code_size) + 1;
            } else {
                table.insert(phrase.clone(), next_code);
                if u32::from(next_code) == 1 << code_width {
                    // The code just assigned no longer fits the current width.
                    code_width += 1;
                }
                next_code += 1;
            }
            phrase.clear();
            phrase.push(index);
        }

        if !phrase.is_empty() {
            output.write_code(code_for(&table, &phrase), code_width);
        }
        output.write_code(end_code, code_width);
        Ok(output.finish())
    }
}

fn code_for(table: &HashMap<Vec<u8>, u16>, phrase: &[u8]) -> u16 {
    if phrase.len() == 1 {
        u16::from(phrase[0])
    } else {
        table[phrase]
    }
}

fn compute_minimum_code_size(color_table_size: usize) -> u8 {
    let mut size = 2;
    while color_table_size > 1 << size {
        size += 1;
    }
    size
}

/// Packs variable-width codes least-significant-bit first into bytes.
struct BitPacker {
    bytes: Vec<u8>,
    accumulator: u32,
    bit_count: u32,
}

impl BitPacker {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            accumulator: 0,
            bit_count: 0,
        }
    }

    fn write_code(&mut self, code: u16, width: u32) {
        self.accumulator |= u32::from(code) << self.bit_count;
        self.bit_count += width;
        while self.bit_count >= 8 {
            self.bytes.push(self.accumulator as u8);
            self.accumulator >>= 8;
            self.bit_count -= 8;
        }
    }

    /// Flushes the final partial byte, zero-padded.
    fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.bytes.push(self.accumulator as u8);
        }
        self.bytes
    }
}
