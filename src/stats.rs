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

    src/stats.rs

    Aggregate statistics over a decoded stream.
*/
use crate::parser::StreamParser;

/// Aggregates computed after index alignment. Rotation-derived fields are
/// zero when the stream holds fewer than two index pulses.
#[derive(Clone, Debug, Default)]
pub struct StreamStatistics {
    pub avg_rpm: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
    /// Average USB transfer rate in bytes per second, from StreamInfo
    /// bookkeeping.
    pub avg_bps: u32,
    /// Average count of flux transitions per revolution.
    pub avg_flux_per_rev: u32,
    pub min_flux: u32,
    pub max_flux: u32,
}

impl StreamStatistics {
    pub(crate) fn from_parser(p: &StreamParser, sck: f64) -> StreamStatistics {
        let mut stats = StreamStatistics::default();

        if p.stat_data_time > 0 {
            stats.avg_bps = (p.stat_data_count as u64 * 1000 / p.stat_data_time as u64) as u32;
        }

        // The first index opens the first revolution; only subsequent
        // records carry a meaningful rotation time.
        let index_ct = p.index_records.len();
        if index_ct > 1 {
            let mut sum: u64 = 0;
            let mut min_rotation = u32::MAX;
            let mut max_rotation = 0u32;
            for rec in &p.index_records[1..] {
                sum += rec.rotation_time as u64;
                min_rotation = min_rotation.min(rec.rotation_time);
                max_rotation = max_rotation.max(rec.rotation_time);
            }
            stats.avg_rpm = sck * (index_ct - 1) as f64 * 60.0 / sum as f64;
            stats.max_rpm = sck * 60.0 / min_rotation as f64;
            stats.min_rpm = sck * 60.0 / max_rotation as f64;
        }

        if index_ct > 2 {
            let mut slot_sum = 0usize;
            for i in 2..index_ct {
                slot_sum +=
                    p.index_records[i].flux_position - p.index_records[i - 1].flux_position;
            }
            stats.avg_flux_per_rev = (slot_sum / (index_ct - 2)) as u32;
        }

        if p.flux_count > 0 {
            stats.min_flux = p.min_flux;
            stats.max_flux = p.max_flux;
        }

        stats
    }
}
