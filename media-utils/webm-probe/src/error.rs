use crate::tags::Tag;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file does not start with an EBML header")]
    NotEbml,
    #[error("invalid element ID")]
    InvalidId,
    #[error("invalid element size")]
    InvalidSize,
    #[error("unexpected end of input")]
    Eof,
    #[error("{tag:?} at {position} extends past the end of the file")]
    Truncated { tag: Tag, position: u64 },
    #[error("{tag:?} at {position} has unknown size")]
    UnknownSize { tag: Tag, position: u64 },
    #[error("{tag:?} at {position} has unsupported data size {size}")]
    DataSize { tag: Tag, position: u64, size: u64 },
}

impl Error {
    /// The input ended before the structure did.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::Eof | Error::Truncated { .. })
    }
}
