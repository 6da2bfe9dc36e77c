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

    src/align.rs

    Index alignment: the second decoding pass.

    The hardware timestamps an index pulse with a stream position naming the
    flux datum that follows it, plus a sub-cell sample count. Reconciling
    that against the decoded flux array takes an overflow-count
    reconstruction: the upper 16 bits of a flux duration count the Ovl16
    codes folded into it, and the gap between the index's stream position
    and the boundary flux's stream position counts the Ovl16 codes that were
    emitted after the pulse fired. The difference, in 64Ki-clock units, plus
    the sample counter, is the time from the start of the boundary flux to
    the pulse.
*/
use crate::parser::StreamParser;
use crate::StreamError;

/// Place every raw index record on a flux slot and fill in `flux_position`,
/// `pre_index_time` and `rotation_time`.
pub(crate) fn align_indexes(p: &mut StreamParser) -> Result<(), StreamError> {
    if p.index_records.is_empty() {
        return Ok(());
    }

    // Sample clocks accumulated since the previous index pulse.
    let mut itime: u32 = 0;
    let mut iidx: usize = 0;
    let mut next_stream_pos = p.index_records[0].stream_pos;

    for fidx in 0..p.flux_count {
        itime = itime.wrapping_add(p.flux_values[fidx]);

        if iidx >= p.index_records.len() {
            break;
        }

        let mut nfidx = fidx + 1;
        if p.flux_stream_positions[nfidx] < next_stream_pos {
            continue;
        }
        // A pulse that fired during the very first flux has no earlier slot
        // to land on.
        if fidx == 0 && p.flux_stream_positions[0] >= next_stream_pos {
            nfidx = 0;
        }

        let mut rec = p.index_records[iidx].clone();
        rec.flux_position = nfidx;

        let mut iftime = p.flux_values[nfidx];

        // Timer sampled exactly on a flux edge: substitute the residual
        // sub-cell count of the boundary flux.
        if rec.sample_counter == 0 {
            rec.sample_counter = iftime & 0xFFFF;
        }

        // The boundary flux may be the unwritten sentinel, when the stream
        // ends before the flux the pulse points at. Complete it from the
        // sample counter.
        if nfidx >= p.flux_count && p.flux_stream_positions[nfidx] == next_stream_pos {
            iftime = iftime.wrapping_add(rec.sample_counter);
            p.flux_values[nfidx] = iftime;
        }

        // Overflow codes folded into the boundary flux, vs. overflow codes
        // that were emitted between the index marker and the flux itself.
        let ico = iftime >> 16;
        let pre = p.flux_stream_positions[nfidx] - next_stream_pos;
        if ico < pre {
            log::error!(
                "Index {} implies a negative overflow count: {} overflows, {} after the pulse",
                iidx,
                ico,
                pre
            );
            return Err(StreamError::MissingIndex);
        }
        rec.pre_index_time = ((ico - pre) << 16).wrapping_add(rec.sample_counter);

        // The previous boundary flux was summed into itime whole, but only
        // its post-index part belongs to this revolution.
        if iidx > 0 {
            itime = itime.wrapping_sub(p.index_records[iidx - 1].pre_index_time);
        }
        let elapsed = if nfidx == 0 { 0 } else { itime };
        rec.rotation_time = elapsed.wrapping_add(rec.pre_index_time);

        log::debug!(
            "Index {} at flux {}: pre_index_time: {} rotation_time: {}",
            iidx,
            nfidx,
            rec.pre_index_time,
            rec.rotation_time
        );

        p.index_records[iidx] = rec;
        iidx += 1;
        next_stream_pos = match p.index_records.get(iidx) {
            Some(rec) => rec.stream_pos,
            None => 0,
        };
        if nfidx != 0 {
            itime = 0;
        }
    }

    if iidx < p.index_records.len() {
        log::error!(
            "Only {} of {} index records could be aligned",
            iidx,
            p.index_records.len()
        );
        return Err(StreamError::MissingIndex);
    }

    // A final index that landed on the sentinel promotes it to a real flux.
    let last = p.index_records.len() - 1;
    if p.index_records[last].flux_position >= p.flux_count {
        let flux = p.flux_values[p.flux_count];
        p.min_flux = p.min_flux.min(flux);
        p.max_flux = p.max_flux.max(flux);
        p.flux_count += 1;
    }

    Ok(())
}
