//! VMD (Vocaloid Motion Data) animation codec.

mod reader;
mod types;
mod writer;

pub use reader::decode;
pub use types::*;
pub use writer::encode;
