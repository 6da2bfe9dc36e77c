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

    src/parser.rs

    The stream parser: a single linear walk over the buffered file.

    The walk folds Ovl16 overflow codes into a pending flux accumulator,
    emits a flux duration for every Flux1/Flux2/Flux3 opcode, and dispatches
    OOB blocks for index capture, transfer bookkeeping, hardware status and
    info text. The stream position counter covers non-OOB bytes only; it is
    the handshake the encoder stamps into StreamInfo and StreamEnd blocks,
    and index records use it to name the flux that follows the pulse.
*/
use binrw::BinRead;
use std::io::Cursor;

use crate::block::{BlockType, IndexBlock, OobType, StreamEndBlock, StreamInfoBlock};
use crate::StreamError;

pub(crate) const HW_STATUS_OK: u32 = 0;
pub(crate) const HW_STATUS_BUFFER: u32 = 1;
pub(crate) const HW_STATUS_INDEX: u32 = 2;

/// One index pulse, as captured by the hardware and completed by index
/// alignment.
#[derive(Clone, Debug, Default)]
pub struct IndexRecord {
    /// Encoder stream position of the first flux datum after the pulse.
    pub stream_pos: u32,
    /// Sub-cell sample count at detection time. The hardware reports 0 when
    /// the timer was sampled exactly on a flux edge; alignment replaces that
    /// with the residual count of the boundary flux.
    pub sample_counter: u32,
    /// Free-running index clock reading at detection time.
    pub index_counter: u32,
    /// Slot in the flux array of the flux spanning the pulse. Filled by
    /// alignment.
    pub flux_position: usize,
    /// Sample clocks from the start of that flux to the pulse. Filled by
    /// alignment.
    pub pre_index_time: u32,
    /// Sample clocks between this pulse and the previous one. Not meaningful
    /// for the first index of a stream. Filled by alignment.
    pub rotation_time: u32,
}

pub(crate) struct StreamParser {
    pub flux_values: Vec<u32>,
    pub flux_stream_positions: Vec<u32>,
    /// Count of emitted fluxes. The arrays hold one extra sentinel entry
    /// that alignment may promote to a real flux.
    pub flux_count: usize,
    pub index_records: Vec<IndexRecord>,
    pub info: String,
    pub stat_data_count: u32,
    pub stat_data_time: u32,
    pub stat_data_trans: u32,
    pub min_flux: u32,
    pub max_flux: u32,

    stream_pos: u32,
    pending_flux: u32,
    last_stream_pos: u32,
    last_index_pos: u32,
    hw_status: u32,
    eof_seen: bool,
}

impl StreamParser {
    pub fn new(input_len: usize) -> StreamParser {
        StreamParser {
            flux_values: Vec::with_capacity(input_len),
            flux_stream_positions: Vec::with_capacity(input_len),
            flux_count: 0,
            index_records: Vec::with_capacity(128),
            info: String::new(),
            stat_data_count: 0,
            stat_data_time: 0,
            stat_data_trans: 0,
            min_flux: u32::MAX,
            max_flux: 0,
            stream_pos: 0,
            pending_flux: 0,
            last_stream_pos: 0,
            last_index_pos: 0,
            hw_status: HW_STATUS_OK,
            eof_seen: false,
        }
    }

    pub fn parse(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        let mut pos = 0;

        while !self.eof_seen && pos < buf.len() {
            let head = buf[pos];
            let block_type = BlockType::classify(head);
            let block_len = block_type.len(buf, pos)?;

            if buf.len() - pos < block_len {
                log::error!(
                    "Block {:02X} at offset {} is {} bytes but only {} remain",
                    head,
                    pos,
                    block_len,
                    buf.len() - pos
                );
                return Err(StreamError::MissingData);
            }

            match block_type {
                BlockType::Flux1 => {
                    self.emit_flux(head as u32);
                }
                BlockType::Flux2 => {
                    self.emit_flux(((head as u32) << 8) | buf[pos + 1] as u32);
                }
                BlockType::Flux3 => {
                    self.emit_flux(((buf[pos + 1] as u32) << 8) | buf[pos + 2] as u32);
                }
                BlockType::Ovl16 => {
                    self.pending_flux = self.pending_flux.saturating_add(0x10000);
                }
                BlockType::Nop1 | BlockType::Nop2 | BlockType::Nop3 => {}
                BlockType::Oob => {
                    self.read_oob(buf, pos, block_len)?;
                }
            }

            // OOB blocks do not advance the stream position.
            if block_type != BlockType::Oob {
                self.stream_pos += block_len as u32;
            }
            pos += block_len;
        }

        // Trailing sentinel entry consulted by index alignment. Not counted
        // as an emitted flux.
        self.flux_values.push(self.pending_flux);
        self.flux_stream_positions.push(self.stream_pos);

        match self.hw_status {
            HW_STATUS_OK => {}
            HW_STATUS_BUFFER => {
                log::error!("Hardware reported a buffer under- or overrun; stream is corrupt");
                return Err(StreamError::DevBuffer);
            }
            HW_STATUS_INDEX => {
                log::error!("Hardware timed out waiting for an index pulse");
                return Err(StreamError::DevIndex);
            }
            code => {
                log::error!("Hardware reported transfer error code {:02X}", code);
                return Err(StreamError::Transfer);
            }
        }

        if !self.eof_seen {
            log::error!("Stream exhausted without an EOF block");
            return Err(StreamError::MissingEnd);
        }

        if !self.index_records.is_empty() && self.stream_pos < self.last_index_pos {
            log::error!(
                "Stream ends at position {} but the last index references position {}",
                self.stream_pos,
                self.last_index_pos
            );
            return Err(StreamError::IndexReference);
        }

        log::debug!(
            "Parsed {} fluxes and {} index records over {} transfers ({} bytes)",
            self.flux_count,
            self.index_records.len(),
            self.stat_data_trans,
            self.stat_data_count
        );

        Ok(())
    }

    fn emit_flux(&mut self, value: u32) {
        let flux = self.pending_flux.saturating_add(value);
        self.flux_values.push(flux);
        self.flux_stream_positions.push(self.stream_pos);
        self.flux_count += 1;
        self.min_flux = self.min_flux.min(flux);
        self.max_flux = self.max_flux.max(flux);
        self.pending_flux = 0;
    }

    fn read_oob(&mut self, buf: &[u8], pos: usize, block_len: usize) -> Result<(), StreamError> {
        // Payload structs begin with the size field at offset +2; fields sit
        // at fixed offsets regardless of the declared size, which only
        // governs how far the cursor advances.
        let payload = &buf[pos + 2..];

        match OobType::classify(buf[pos + 1]) {
            OobType::StreamInfo => {
                let sib = StreamInfoBlock::read(&mut Cursor::new(payload))
                    .map_err(|_| StreamError::MissingData)?;
                log::trace!(
                    "StreamInfo block: pos: {} time: {}",
                    sib.stream_pos,
                    sib.transfer_time_ms
                );

                if self.stream_pos != sib.stream_pos {
                    log::error!(
                        "StreamInfo position does not match stream position: {} != {}",
                        sib.stream_pos,
                        self.stream_pos
                    );
                    return Err(StreamError::WrongPosition);
                }

                if self.stream_pos != self.last_stream_pos {
                    self.stat_data_count += self.stream_pos - self.last_stream_pos;
                    self.stat_data_time += sib.transfer_time_ms;
                    self.stat_data_trans += 1;
                    self.last_stream_pos = self.stream_pos;
                }
            }
            OobType::Index => {
                let ib = IndexBlock::read(&mut Cursor::new(payload))
                    .map_err(|_| StreamError::MissingData)?;
                log::debug!(
                    "Index block: next_pos: {} sample_ct: {} index_ct: {}",
                    ib.stream_pos,
                    ib.sample_counter,
                    ib.index_counter
                );

                self.index_records.push(IndexRecord {
                    stream_pos: ib.stream_pos,
                    sample_counter: ib.sample_counter,
                    index_counter: ib.index_counter,
                    ..IndexRecord::default()
                });
                self.last_index_pos = ib.stream_pos;
            }
            OobType::StreamEnd => {
                let seb = StreamEndBlock::read(&mut Cursor::new(payload))
                    .map_err(|_| StreamError::MissingData)?;
                log::debug!(
                    "StreamEnd block: end_pos: {} stream_pos: {} hw_status: {:02X}",
                    seb.stream_pos,
                    self.stream_pos,
                    seb.hw_status_code
                );

                self.hw_status = seb.hw_status_code;
                if self.hw_status == HW_STATUS_OK && self.stream_pos != seb.stream_pos {
                    log::error!(
                        "StreamEnd position does not match stream position: {} != {}",
                        seb.stream_pos,
                        self.stream_pos
                    );
                    return Err(StreamError::WrongPosition);
                }
            }
            OobType::Info => {
                // Payload is text of size - 1 bytes; the last byte is a
                // terminator.
                let size = block_len - 4;
                if size > 0 {
                    let text = String::from_utf8_lossy(&buf[pos + 4..pos + 4 + size - 1]);
                    log::debug!("Info block: {}", text);
                    if !self.info.is_empty() {
                        self.info.push_str(", ");
                    }
                    self.info.push_str(&text);
                }
            }
            OobType::Eof => {
                log::debug!("EOF block");
                self.eof_seen = true;
            }
            OobType::Invalid(subtype) => {
                log::error!("Invalid OOB block type: {:02X}", subtype);
                return Err(StreamError::InvalidOob);
            }
        }

        Ok(())
    }
}
