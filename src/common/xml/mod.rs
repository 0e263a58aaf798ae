//! XML escaping utilities shared by the OPC/OOXML layers.
pub mod escape;

pub use escape::{escape_xml, unescape_xml};
