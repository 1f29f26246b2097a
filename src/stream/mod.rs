//! Byte stream endpoints connecting the command engine to its callers.

mod pipe;

pub use pipe::{pipe, PipeReader, PipeWriter};
