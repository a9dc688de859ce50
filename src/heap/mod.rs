mod error;
mod heap_file;
mod page;
mod scan;

pub use error::{HeapError, HeapResult};
pub use heap_file::{HeapFile, create_heap_file, destroy_heap_file};
pub use page::{DIRECTORY_OVERHEAD, DataPage, MAX_RECORD_SIZE, Rid, SlotId};
pub use scan::{AttrType, CompOp, HeapFileScan, InsertFileScan, Predicate};
