use std::io;

use thiserror::Error;

/// Errors raised while reading meshes and images from disk.
///
/// Public loaders never hand these to callers directly; they log the error
/// and return `None` instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An argument list either has unparsable arguments or is missing
    /// arguments.
    #[error("malformed `{command}` arguments (line: {line_number}, list: {list})")]
    ArgumentListFailure {
        command: &'static str,
        line_number: usize,
        list: String,
    },

    /// An `f` line names a vertex that is never declared.
    #[error("face index {index} out of range, {vertex_count} vertices declared (line: {line_number})")]
    FaceIndexOutOfRange {
        line_number: usize,
        index: i64,
        vertex_count: usize,
    },

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported image layout: {0}")]
    UnsupportedImage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
