/*
    kfx-stream
    https://github.com/dbalsom/kfx-stream

    Copyright 2024-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/block.rs

    Block classification for the stream protocol.

    The first byte of every block determines its kind and length. OOB blocks
    carry a subtype byte and a little-endian u16 payload size after the 0x0D
    header byte; all other blocks have a fixed length of 1 to 3 bytes.
*/
use binrw::binrw;

use crate::util::read_u16_le;
use crate::StreamError;

/// OOB subtype of the end-of-stream marker. Unlike every other OOB block,
/// its size field is padding and the block is always 4 bytes long.
pub const OOB_EOF: u8 = 0x0D;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlockType {
    Flux1,
    Flux2,
    Flux3,
    Nop1,
    Nop2,
    Nop3,
    Ovl16,
    Oob,
}

impl BlockType {
    pub fn classify(head: u8) -> BlockType {
        match head {
            0x00..=0x07 => BlockType::Flux2,
            0x08 => BlockType::Nop1,
            0x09 => BlockType::Nop2,
            0x0A => BlockType::Nop3,
            0x0B => BlockType::Ovl16,
            0x0C => BlockType::Flux3,
            0x0D => BlockType::Oob,
            _ => BlockType::Flux1,
        }
    }

    /// Total encoded length of the block beginning at `pos`, including the
    /// head byte. OOB lengths require the subtype and size field, so the
    /// lookup can itself run out of buffer.
    pub fn len(&self, buf: &[u8], pos: usize) -> Result<usize, StreamError> {
        let len = match self {
            BlockType::Flux1 | BlockType::Nop1 | BlockType::Ovl16 => 1,
            BlockType::Flux2 | BlockType::Nop2 => 2,
            BlockType::Flux3 | BlockType::Nop3 => 3,
            BlockType::Oob => {
                let subtype = *buf.get(pos + 1).ok_or(StreamError::MissingData)?;
                if subtype == OOB_EOF {
                    4
                }
                else {
                    let size = read_u16_le(buf, pos + 2).ok_or(StreamError::MissingData)?;
                    4 + size as usize
                }
            }
        };
        Ok(len)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OobType {
    StreamInfo,
    Index,
    StreamEnd,
    Info,
    Eof,
    Invalid(u8),
}

impl OobType {
    pub fn classify(subtype: u8) -> OobType {
        match subtype {
            0x01 => OobType::StreamInfo,
            0x02 => OobType::Index,
            0x03 => OobType::StreamEnd,
            0x04 => OobType::Info,
            OOB_EOF => OobType::Eof,
            _ => OobType::Invalid(subtype),
        }
    }
}

#[derive(Debug)]
#[binrw]
#[brw(little)]
pub struct StreamInfoBlock {
    pub size: u16,
    pub stream_pos: u32,
    pub transfer_time_ms: u32,
}

#[derive(Debug)]
#[binrw]
#[brw(little)]
pub struct IndexBlock {
    pub size: u16,
    pub stream_pos: u32,
    pub sample_counter: u32,
    pub index_counter: u32,
}

#[derive(Debug)]
#[binrw]
#[brw(little)]
pub struct StreamEndBlock {
    pub size: u16,
    pub stream_pos: u32,
    pub hw_status_code: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_the_opcode_table() {
        for head in 0x00..=0x07u8 {
            assert_eq!(BlockType::classify(head), BlockType::Flux2);
        }
        assert_eq!(BlockType::classify(0x08), BlockType::Nop1);
        assert_eq!(BlockType::classify(0x09), BlockType::Nop2);
        assert_eq!(BlockType::classify(0x0A), BlockType::Nop3);
        assert_eq!(BlockType::classify(0x0B), BlockType::Ovl16);
        assert_eq!(BlockType::classify(0x0C), BlockType::Flux3);
        assert_eq!(BlockType::classify(0x0D), BlockType::Oob);
        for head in 0x0E..=0xFFu8 {
            assert_eq!(BlockType::classify(head), BlockType::Flux1);
        }
    }

    #[test]
    fn oob_len_reads_the_size_field() {
        let buf = [0x0D, 0x04, 0x05, 0x00, b'a', b'b', b'c', b'd', 0x00];
        assert_eq!(BlockType::Oob.len(&buf, 0).unwrap(), 9);
    }

    #[test]
    fn oob_eof_len_ignores_the_size_field() {
        // A real capture pads the EOF size field with 0x0D bytes.
        let buf = [0x0D, 0x0D, 0x0D, 0x0D];
        assert_eq!(BlockType::Oob.len(&buf, 0).unwrap(), 4);
        let buf = [0x0D, 0x0D, 0xFF, 0xFF];
        assert_eq!(BlockType::Oob.len(&buf, 0).unwrap(), 4);
    }

    #[test]
    fn oob_len_fails_on_a_truncated_header() {
        let buf = [0x0D, 0x01, 0x08];
        assert!(matches!(
            BlockType::Oob.len(&buf, 0),
            Err(StreamError::MissingData)
        ));
    }
}
