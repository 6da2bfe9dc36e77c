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
*/

//! kfx-stream decodes KryoFlux stream protocol files (`.raw`).
//!
//! A stream file is the raw capture of a single disk surface pass: a sequence
//! of flux transition timings sampled by the board's hardware counter,
//! interleaved with out-of-band control blocks carrying index pulse
//! timestamps, transfer bookkeeping, hardware status and free-form info text.
//!
//! [KfxStream::decode] runs two passes over a fully buffered file: a linear
//! opcode walk that recovers the flux durations and raw control records, and
//! an index alignment pass that places each hardware index pulse on a
//! specific flux transition and splits that flux into pre- and post-index
//! durations. Aggregate statistics (RPM extremes, transfer rate, flux
//! extremes) are computed once alignment completes.

mod align;
mod block;
mod parser;
mod stats;
mod stream;
mod util;

use thiserror::Error;

/// Master clock of the KryoFlux board, in Hz.
pub const KFX_DEFAULT_MCK: f64 = ((18_432_000.0 * 73.0) / 14.0) / 2.0;
/// Default flux sample clock, in Hz. Streams may override this via the `sck`
/// key of their info text.
pub const KFX_DEFAULT_SCK: f64 = KFX_DEFAULT_MCK / 2.0;
/// Default index clock, in Hz. Streams may override this via the `ick` key
/// of their info text.
pub const KFX_DEFAULT_ICK: f64 = KFX_DEFAULT_SCK / 8.0;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("An IO error occurred reading the stream file")]
    ReadError,
    #[error("A block extends past the end of the stream buffer")]
    MissingData,
    #[error("A block opcode could not be classified")]
    InvalidCode,
    #[error("The encoder-reported stream position does not match the decoded position")]
    WrongPosition,
    #[error("The hardware reported a buffer under- or overrun")]
    DevBuffer,
    #[error("The hardware timed out waiting for an index pulse")]
    DevIndex,
    #[error("The hardware reported a transfer error")]
    Transfer,
    #[error("An out-of-band block has an unrecognized type")]
    InvalidOob,
    #[error("The stream ended without an EOF block")]
    MissingEnd,
    #[error("The stream ends before the last index position it references")]
    IndexReference,
    #[error("An index could not be aligned to a flux transition")]
    MissingIndex,
}

pub use crate::parser::IndexRecord;
pub use crate::stats::StreamStatistics;
pub use crate::stream::KfxStream;
