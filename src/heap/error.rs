use crate::file::FileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeapError {
    #[error("file error: {0}")]
    File(#[from] FileError),

    #[error("no record at slot {0}")]
    InvalidSlot(u16),

    #[error("record length {0} exceeds page capacity")]
    InvalidRecLen(usize),

    #[error("bad scan parameter: {0}")]
    BadScanParam(String),

    #[error("cursor has no current record")]
    NoCurrentRecord,

    #[error("corrupt page: {0}")]
    CorruptPage(String),
}

pub type HeapResult<T> = Result<T, HeapError>;
