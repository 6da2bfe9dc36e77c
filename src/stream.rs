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

    src/stream.rs

    A decoded stream file and its read-only views.
*/
use std::path::Path;

use crate::align::align_indexes;
use crate::parser::{IndexRecord, StreamParser};
use crate::stats::StreamStatistics;
use crate::{StreamError, KFX_DEFAULT_ICK, KFX_DEFAULT_SCK};

/// A fully decoded KryoFlux stream file.
///
/// Constructed by [KfxStream::decode] or [KfxStream::load]; all views are
/// read-only thereafter.
pub struct KfxStream {
    flux_values: Vec<u32>,
    flux_count: usize,
    index_records: Vec<IndexRecord>,
    info: String,
    statistics: StreamStatistics,
    sck: f64,
    ick: f64,
}

impl KfxStream {
    /// Return true if the buffer plausibly holds a stream file. A capture
    /// always opens with an OOB header byte.
    pub fn detect(buf: &[u8]) -> bool {
        buf.first() == Some(&0x0D)
    }

    /// Read and decode a stream file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<KfxStream, StreamError> {
        let buf = std::fs::read(path.as_ref()).map_err(|e| {
            log::error!("Failed to read {}: {}", path.as_ref().display(), e);
            StreamError::ReadError
        })?;
        KfxStream::decode(&buf)
    }

    /// Decode a fully buffered stream file.
    pub fn decode(buf: &[u8]) -> Result<KfxStream, StreamError> {
        let mut parser = StreamParser::new(buf.len());
        parser.parse(buf)?;
        align_indexes(&mut parser)?;

        let mut sck = KFX_DEFAULT_SCK;
        let mut ick = KFX_DEFAULT_ICK;

        // Host software stamps the effective clocks into the info text.
        let sck_text = info_value(&parser.info, "sck");
        if !sck_text.is_empty() {
            match sck_text.trim().parse::<f64>() {
                Ok(value) => {
                    log::debug!("Set SCK to {}", value);
                    sck = value;
                }
                Err(_) => log::warn!("Unparseable sck value in info text: {}", sck_text),
            }
        }
        let ick_text = info_value(&parser.info, "ick");
        if !ick_text.is_empty() {
            match ick_text.trim().parse::<f64>() {
                Ok(value) => {
                    log::debug!("Set ICK to {}", value);
                    ick = value;
                }
                Err(_) => log::warn!("Unparseable ick value in info text: {}", ick_text),
            }
        }

        let statistics = StreamStatistics::from_parser(&parser, sck);

        Ok(KfxStream {
            flux_values: parser.flux_values,
            flux_count: parser.flux_count,
            index_records: parser.index_records,
            info: parser.info,
            statistics,
            sck,
            ick,
        })
    }

    /// Flux transition durations in sample clocks, one per transition.
    pub fn flux_values(&self) -> &[u32] {
        &self.flux_values[..self.flux_count]
    }

    pub fn flux_count(&self) -> usize {
        self.flux_count
    }

    /// Completed index records, in stream order.
    pub fn indexes(&self) -> &[IndexRecord] {
        &self.index_records
    }

    pub fn index_count(&self) -> usize {
        self.index_records.len()
    }

    /// Count of complete revolutions captured between index pulses.
    pub fn revolution_count(&self) -> usize {
        self.index_records.len().saturating_sub(1)
    }

    /// Concatenated info text from every Info block in the stream.
    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn statistics(&self) -> &StreamStatistics {
        &self.statistics
    }

    /// Sample clock in Hz, either the board default or the stream's own.
    pub fn sample_clock(&self) -> f64 {
        self.sck
    }

    /// Index clock in Hz, either the board default or the stream's own.
    pub fn index_clock(&self) -> f64 {
        self.ick
    }

    /// Look up `name=value` in the info text. Returns an empty string when
    /// the key is absent.
    pub fn find_info(&self, name: &str) -> String {
        info_value(&self.info, name)
    }
}

fn info_value(info: &str, name: &str) -> String {
    match info.find(name) {
        Some(key_pos) => {
            // Value runs from just past "name=" to the next separator.
            let start = key_pos + name.len() + 1;
            let rest = match info.get(start..) {
                Some(rest) => rest,
                None => return String::new(),
            };
            let end = rest.find(',').unwrap_or(rest.len());
            rest[..end].to_string()
        }
        None => String::new(),
    }
}
