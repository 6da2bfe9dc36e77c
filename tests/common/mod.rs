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

    tests/common/mod.rs

    A stream encoder for test fixtures. Emits only well-formed blocks and
    stamps the correct encoder positions into StreamInfo/StreamEnd, so any
    stream it produces should round-trip through the decoder.
*/
#![allow(dead_code)]

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct StreamBuilder {
    buf: Vec<u8>,
    stream_pos: u32,
}

impl StreamBuilder {
    pub fn new() -> StreamBuilder {
        StreamBuilder::default()
    }

    /// Stream position the encoder would report right now: the count of
    /// non-OOB bytes emitted so far.
    pub fn stream_pos(&self) -> u32 {
        self.stream_pos
    }

    pub fn flux1(&mut self, value: u8) -> &mut Self {
        assert!(value >= 0x0E, "Flux1 values start at 0x0E");
        self.buf.push(value);
        self.stream_pos += 1;
        self
    }

    pub fn flux2(&mut self, value: u16) -> &mut Self {
        assert!(value < 0x800, "Flux2 values fit in 11 bits");
        self.buf.push((value >> 8) as u8);
        self.buf.push((value & 0xFF) as u8);
        self.stream_pos += 2;
        self
    }

    pub fn flux3(&mut self, value: u16) -> &mut Self {
        self.buf.push(0x0C);
        self.buf.push((value >> 8) as u8);
        self.buf.push((value & 0xFF) as u8);
        self.stream_pos += 3;
        self
    }

    pub fn ovl16(&mut self) -> &mut Self {
        self.buf.push(0x0B);
        self.stream_pos += 1;
        self
    }

    pub fn nop1(&mut self) -> &mut Self {
        self.buf.push(0x08);
        self.stream_pos += 1;
        self
    }

    pub fn nop2(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x09, 0x00]);
        self.stream_pos += 2;
        self
    }

    pub fn nop3(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x0A, 0x00, 0x00]);
        self.stream_pos += 3;
        self
    }

    /// StreamInfo stamped with the current encoder position.
    pub fn stream_info(&mut self, transfer_time_ms: u32) -> &mut Self {
        let stream_pos = self.stream_pos;
        self.stream_info_at(stream_pos, transfer_time_ms)
    }

    /// StreamInfo reporting an arbitrary position, for fault injection.
    pub fn stream_info_at(&mut self, stream_pos: u32, transfer_time_ms: u32) -> &mut Self {
        self.buf.extend_from_slice(&[0x0D, 0x01, 0x08, 0x00]);
        self.buf.extend_from_slice(&stream_pos.to_le_bytes());
        self.buf.extend_from_slice(&transfer_time_ms.to_le_bytes());
        self
    }

    /// Index pulse pointing at the next flux to be emitted.
    pub fn index_here(&mut self, sample_counter: u32, index_counter: u32) -> &mut Self {
        let stream_pos = self.stream_pos;
        self.index_at(stream_pos, sample_counter, index_counter)
    }

    pub fn index_at(
        &mut self,
        stream_pos: u32,
        sample_counter: u32,
        index_counter: u32,
    ) -> &mut Self {
        self.buf.extend_from_slice(&[0x0D, 0x02, 0x0C, 0x00]);
        self.buf.extend_from_slice(&stream_pos.to_le_bytes());
        self.buf.extend_from_slice(&sample_counter.to_le_bytes());
        self.buf.extend_from_slice(&index_counter.to_le_bytes());
        self
    }

    /// StreamEnd stamped with the current encoder position.
    pub fn stream_end(&mut self, hw_status: u32) -> &mut Self {
        let stream_pos = self.stream_pos;
        self.stream_end_at(stream_pos, hw_status)
    }

    /// StreamEnd reporting an arbitrary position, for fault injection.
    pub fn stream_end_at(&mut self, stream_pos: u32, hw_status: u32) -> &mut Self {
        self.buf.extend_from_slice(&[0x0D, 0x03, 0x08, 0x00]);
        self.buf.extend_from_slice(&stream_pos.to_le_bytes());
        self.buf.extend_from_slice(&hw_status.to_le_bytes());
        self
    }

    /// Null-terminated info text block.
    pub fn info(&mut self, text: &str) -> &mut Self {
        let size = (text.len() + 1) as u16;
        self.buf.extend_from_slice(&[0x0D, 0x04]);
        self.buf.extend_from_slice(&size.to_le_bytes());
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.push(0x00);
        self
    }

    /// End-of-file marker. The size field is padding in real captures.
    pub fn eof(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x0D, 0x0D, 0x0D, 0x0D]);
        self
    }

    /// Push raw bytes verbatim, for malformed-stream tests.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.buf.clone()
    }
}
