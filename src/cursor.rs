//! Bounded byte cursor shared by the PMX and VMD codecs.
//!
//! `Cursor` borrows its input for the lifetime of one decode and never
//! reads past `end`; once a read would overrun the buffer it flips into
//! an overflown state that callers check once, after the whole decode
//! sequence runs, rather than after every individual read.

use crate::text::TextCodec;

pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    overflown: bool,
}

macro_rules! read_primitive {
    ($name:ident, $ty:ty) => {
        pub(crate) fn $name(&mut self) -> $ty {
            let mut buf = [0u8; std::mem::size_of::<$ty>()];
            self.read_into(&mut buf);
            <$ty>::from_le_bytes(buf)
        }
    };
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Cursor {
            buf,
            pos: 0,
            overflown: false,
        }
    }

    pub(crate) fn overflown(&self) -> bool {
        self.overflown
    }

    pub(crate) fn at_eof(&self) -> bool {
        !self.overflown && self.pos == self.buf.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn read_into(&mut self, out: &mut [u8]) {
        let n = out.len();
        if self.overflown || n > self.remaining() {
            self.overflown = true;
            return;
        }
        out.copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        self.read_into(&mut out);
        out
    }

    /// Reads `value.len()` bytes and reports whether they match; false on
    /// mismatch or overflow.
    pub(crate) fn equal(&mut self, value: &[u8]) -> bool {
        let got = self.read_bytes(value.len());
        !self.overflown && got == value
    }

    read_primitive!(read_u8, u8);
    read_primitive!(read_i8, i8);
    read_primitive!(read_u16, u16);
    read_primitive!(read_i16, i16);
    read_primitive!(read_i32, i32);
    read_primitive!(read_u32, u32);
    read_primitive!(read_f32, f32);

    pub(crate) fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    pub(crate) fn read_vec2(&mut self) -> [f32; 2] {
        [self.read_f32(), self.read_f32()]
    }

    pub(crate) fn read_vec3(&mut self) -> [f32; 3] {
        [self.read_f32(), self.read_f32(), self.read_f32()]
    }

    pub(crate) fn read_vec4(&mut self) -> [f32; 4] {
        [
            self.read_f32(),
            self.read_f32(),
            self.read_f32(),
            self.read_f32(),
        ]
    }

    /// Reads exactly `n` code units, trims at the first null, and decodes
    /// with the injected codec.
    pub(crate) fn read_text_fixed(&mut self, n: usize, codec: &dyn TextCodec) -> String {
        let bytes = self.read_bytes(n);
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        codec.decode(&bytes[..end])
    }

    /// Reads a 4-byte byte-length prefix followed by that many bytes.
    pub(crate) fn read_text_prefixed(&mut self, codec: &dyn TextCodec) -> String {
        let len = self.read_i32();
        if len < 0 {
            self.overflown = true;
            return String::new();
        }
        let bytes = self.read_bytes(len as usize);
        codec.decode(&bytes)
    }

    /// Reads an unsigned index at 1 or 2 bytes, signed at 4 bytes, widened
    /// to `i32`. This is the vertex-index reading rule (§4.4).
    pub(crate) fn read_vertex_index(&mut self, width: u8) -> i32 {
        match width {
            1 => i32::from(self.read_u8()),
            2 => i32::from(self.read_u16()),
            4 => self.read_i32(),
            _ => {
                self.overflown = true;
                0
            }
        }
    }

    /// Reads a signed index at 1/2/4 bytes, widened to `i32`. Used for
    /// texture/material/bone/morph/rigid-body indices, which represent
    /// `-1` sentinels uniformly at every width.
    pub(crate) fn read_signed_index(&mut self, width: u8) -> i32 {
        match width {
            1 => i32::from(self.read_i8()),
            2 => i32::from(self.read_i16()),
            4 => self.read_i32(),
            _ => {
                self.overflown = true;
                0
            }
        }
    }
}

macro_rules! write_primitive {
    ($name:ident, $ty:ty) => {
        pub(crate) fn $name(&mut self, value: $ty) {
            self.buf.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// A growing byte buffer mirroring [`Cursor`]'s primitive writers.
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    write_primitive!(write_u8, u8);
    write_primitive!(write_i8, i8);
    write_primitive!(write_u16, u16);
    write_primitive!(write_i16, i16);
    write_primitive!(write_i32, i32);
    write_primitive!(write_u32, u32);
    write_primitive!(write_f32, f32);

    pub(crate) fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub(crate) fn write_vec2(&mut self, value: [f32; 2]) {
        self.write_f32(value[0]);
        self.write_f32(value[1]);
    }

    pub(crate) fn write_vec3(&mut self, value: [f32; 3]) {
        self.write_f32(value[0]);
        self.write_f32(value[1]);
        self.write_f32(value[2]);
    }

    pub(crate) fn write_vec4(&mut self, value: [f32; 4]) {
        self.write_f32(value[0]);
        self.write_f32(value[1]);
        self.write_f32(value[2]);
        self.write_f32(value[3]);
    }

    /// Truncates if `text` is longer than `n` code units, zero-pads if shorter.
    pub(crate) fn write_text_fixed(&mut self, text: &str, n: usize, codec: &dyn TextCodec) {
        let mut bytes = codec.encode(text);
        bytes.resize(n, 0);
        self.write_bytes(&bytes[..n]);
    }

    /// Emits a byte-length prefix (not code-unit length) followed by the
    /// encoded bytes.
    pub(crate) fn write_text_prefixed(&mut self, text: &str, codec: &dyn TextCodec) {
        let bytes = codec.encode(text);
        self.write_i32(bytes.len() as i32);
        self.write_bytes(&bytes);
    }

    pub(crate) fn write_vertex_index(&mut self, width: u8, value: i32) {
        match width {
            1 => self.write_u8(value as u8),
            2 => self.write_u16(value as u16),
            4 => self.write_i32(value),
            _ => unreachable!("index width validated at header construction"),
        }
    }

    pub(crate) fn write_signed_index(&mut self, width: u8, value: i32) {
        match width {
            1 => self.write_i8(value as i8),
            2 => self.write_i16(value as i16),
            4 => self.write_i32(value),
            _ => unreachable!("index width validated at header construction"),
        }
    }
}
