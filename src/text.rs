//! Text codecs injected into the PMX and VMD readers/writers.
//!
//! The core never hand-rolls a Shift-JIS table; it calls out to
//! `encoding_rs`, which both the teacher crate and the wider MMD-import
//! ecosystem already depend on.

/// A bidirectional text codec used to decode/encode the fixed-length and
/// length-prefixed strings embedded in PMX/VMD files.
pub trait TextCodec {
    fn decode(&self, bytes: &[u8]) -> String;
    fn encode(&self, text: &str) -> Vec<u8>;
}

/// UTF-16LE codec, used for PMX model/English names and comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf16LeCodec;

impl TextCodec for Utf16LeCodec {
    fn decode(&self, bytes: &[u8]) -> String {
        encoding_rs::UTF_16LE.decode(bytes).0.into_owned()
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }
}

/// Shift-JIS (code page 932) codec, used for VMD bone/morph/model/IK names.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShiftJisCodec;

impl TextCodec for ShiftJisCodec {
    fn decode(&self, bytes: &[u8]) -> String {
        encoding_rs::SHIFT_JIS.decode(bytes).0.into_owned()
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        encoding_rs::SHIFT_JIS.encode(text).0.into_owned()
    }
}
