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
use bpaf::*;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct AppParams {
    pub dump_flux: bool,
    pub dump_indexes: bool,
    pub dump_info: bool,
    pub histogram: bool,
    pub filename: PathBuf,
}

pub fn app_parser() -> impl Parser<AppParams> {
    let dump_flux = short('f')
        .help("Dump every flux transition duration")
        .switch();
    let dump_indexes = short('i').help("Dump completed index records").switch();
    let dump_info = short('n')
        .help("Dump the hardware info text, one pair per line")
        .switch();
    let histogram = short('h').help("Print a histogram of flux values").switch();
    let filename = positional::<PathBuf>("FILE").help("Path to a KryoFlux stream file");

    construct!(AppParams {
        dump_flux,
        dump_indexes,
        dump_info,
        histogram,
        filename
    })
}
