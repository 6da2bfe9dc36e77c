/*
    kfxtool
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
mod args;

use anyhow::Error;
use bpaf::Parser;
use histogram::Histogram;
use kfx_stream::KfxStream;

const HISTOGRAM_BAR_WIDTH: usize = 50;

fn main() -> Result<(), Error> {
    env_logger::init();

    let params = args::app_parser()
        .to_options()
        .descr("Decode a KryoFlux stream file and report its contents")
        .run();

    let stream = match KfxStream::load(&params.filename) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Failed to decode {}: {}", params.filename.display(), e);
            std::process::exit(1);
        }
    };

    print_report(&stream);

    if params.dump_info {
        dump_info(&stream);
    }
    if params.dump_indexes {
        dump_indexes(&stream);
    }
    if params.dump_flux {
        dump_flux(&stream);
    }
    if params.histogram {
        dump_histogram(&stream)?;
    }

    Ok(())
}

fn print_report(stream: &KfxStream) {
    let stats = stream.statistics();

    println!("Flux transitions:  {}", stream.flux_count());
    println!("Index pulses:      {}", stream.index_count());
    println!("Revolutions:       {}", stream.revolution_count());
    println!("Sample clock:      {:.4} Hz", stream.sample_clock());
    println!("Index clock:       {:.4} Hz", stream.index_clock());
    println!(
        "RPM min/avg/max:   {:.3} / {:.3} / {:.3}",
        stats.min_rpm, stats.avg_rpm, stats.max_rpm
    );
    println!("Transfer rate:     {} bytes/sec", stats.avg_bps);
    println!("Flux per rev:      {}", stats.avg_flux_per_rev);
    println!(
        "Flux extremes:     {} .. {} sample clocks",
        stats.min_flux, stats.max_flux
    );
}

fn dump_info(stream: &KfxStream) {
    println!();
    println!("Info text:");
    for pair in stream.info().split(',') {
        println!("  {}", pair.trim());
    }
}

fn dump_indexes(stream: &KfxStream) {
    let sck = stream.sample_clock();

    println!();
    println!("Index records:");
    for (i, index) in stream.indexes().iter().enumerate() {
        if i > 0 {
            println!(
                "  [{:2}] flux: {:8} pre_index: {:8} rotation: {:8} ({:.3} rpm)",
                i,
                index.flux_position,
                index.pre_index_time,
                index.rotation_time,
                sck * 60.0 / index.rotation_time as f64
            );
        }
        else {
            // The first pulse only opens the first revolution.
            println!(
                "  [{:2}] flux: {:8} pre_index: {:8}",
                i, index.flux_position, index.pre_index_time
            );
        }
    }
}

fn dump_flux(stream: &KfxStream) {
    let sck = stream.sample_clock();

    println!();
    println!("Flux transitions:");
    for (i, flux) in stream.flux_values().iter().enumerate() {
        println!(
            "  [{:8}] {:8} clocks  {:.3}us",
            i,
            flux,
            *flux as f64 / sck * 1_000_000.0
        );
    }
}

fn dump_histogram(stream: &KfxStream) -> Result<(), Error> {
    // Grouping power of 3 keeps peaks sharp; 2^24 sample clocks is far past
    // any plausible flux duration.
    let mut histogram = Histogram::new(3, 24)?;
    for flux in stream.flux_values() {
        _ = histogram.increment(*flux as u64);
    }

    let max_count = histogram
        .into_iter()
        .map(|bucket| bucket.count())
        .max()
        .unwrap_or(0);
    if max_count == 0 {
        println!();
        println!("No flux values to chart.");
        return Ok(());
    }

    println!();
    println!("Flux histogram (sample clocks):");
    for bucket in histogram.into_iter() {
        if bucket.count() == 0 {
            continue;
        }
        let bar = (bucket.count() as usize * HISTOGRAM_BAR_WIDTH).div_ceil(max_count as usize);
        println!(
            "  {:8} .. {:8} {:8} {}",
            bucket.start(),
            bucket.end(),
            bucket.count(),
            "#".repeat(bar)
        );
    }

    Ok(())
}
