pub mod catalog;
pub mod file;
pub mod heap;
pub mod query;

pub use file::{
    BUFFER_POOL_SIZE, BufferManager, FileHandle, PAGE_SIZE, PagedFileManager, SharedBufferManager,
};
pub use heap::{HeapFile, HeapFileScan, InsertFileScan, Rid};
