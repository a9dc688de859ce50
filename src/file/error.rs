use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    #[error("Invalid file handle: {0}")]
    InvalidHandle(usize),

    #[error("Page not resident in buffer pool: page_id={0}")]
    PageNotFound(u32),

    #[error("No unpinned frame available")]
    BufferExceeded,

    #[error("Page is still pinned: page_id={0}")]
    PagePinned(u32),

    #[error("Page is not pinned: page_id={0}")]
    PageNotPinned(u32),

    #[error("Frame bookkeeping corrupt: frame={0}")]
    BadFrame(usize),

    #[error("Invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("File handle limit reached")]
    TooManyOpenFiles,
}

pub type FileResult<T> = Result<T, FileError>;
