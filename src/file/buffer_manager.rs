use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::warn;

use super::error::{FileError, FileResult};
use super::file_manager::{FileHandle, PagedFileManager};
use super::{BUFFER_POOL_SIZE, PAGE_SIZE, PageId};

/// Stable index of a frame in the buffer pool
pub type FrameId = usize;

/// The buffer manager is process-wide and shared by every heap file and
/// cursor; pins are released from destructors, which need their own path to
/// the pool.
pub type SharedBufferManager = Arc<Mutex<BufferManager>>;

/// A key identifying a page resident in the buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BufferKey {
    file: FileHandle,
    page_id: PageId,
}

/// One slot of the buffer pool: a page image plus its descriptor
struct Frame {
    /// The page image, allocated once at pool construction
    data: Vec<u8>,
    file: Option<FileHandle>,
    page_id: PageId,
    valid: bool,
    dirty: bool,
    refbit: bool,
    pin_count: u32,
}

impl Frame {
    fn new() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE],
            file: None,
            page_id: 0,
            valid: false,
            dirty: false,
            refbit: false,
            pin_count: 0,
        }
    }

    /// Install the descriptor for a freshly loaded page, pinned once
    fn set(&mut self, file: FileHandle, page_id: PageId) {
        self.file = Some(file);
        self.page_id = page_id;
        self.valid = true;
        self.dirty = false;
        self.refbit = true;
        self.pin_count = 1;
    }

    fn clear(&mut self) {
        self.file = None;
        self.page_id = 0;
        self.valid = false;
        self.dirty = false;
        self.refbit = false;
        self.pin_count = 0;
    }
}

/// Fixed-size buffer pool with clock replacement.
///
/// Pages are addressed by `(FileHandle, PageId)`; residency is tracked in a
/// single directory mapping those pairs to frame indices. A page can be
/// evicted only when its pin count is zero, and a dirty page is written back
/// before its frame is reused.
pub struct BufferManager {
    /// Underlying file manager
    file_manager: PagedFileManager,
    frames: Vec<Frame>,
    /// Resident-set map: the only place a (file, page) pair is tied to a frame
    directory: HashMap<BufferKey, FrameId>,
    clock_hand: usize,
}

impl BufferManager {
    /// Create a buffer manager with the default pool size
    pub fn new(file_manager: PagedFileManager) -> Self {
        Self::with_capacity(file_manager, BUFFER_POOL_SIZE)
    }

    /// Create a buffer manager with `capacity` frames
    pub fn with_capacity(file_manager: PagedFileManager, capacity: usize) -> Self {
        Self {
            file_manager,
            frames: (0..capacity).map(|_| Frame::new()).collect(),
            directory: HashMap::with_capacity((capacity * 6 / 5) | 1),
            clock_hand: capacity.saturating_sub(1),
        }
    }

    /// Wrap a buffer manager for sharing between heap files and cursors
    pub fn into_shared(self) -> SharedBufferManager {
        Arc::new(Mutex::new(self))
    }

    /// Get a reference to the file manager
    pub fn file_manager(&self) -> &PagedFileManager {
        &self.file_manager
    }

    /// Get a mutable reference to the file manager
    pub fn file_manager_mut(&mut self) -> &mut PagedFileManager {
        &mut self.file_manager
    }

    /// Pin a page, reading it from disk if it is not resident.
    ///
    /// A resident page gains a pin and has its refbit set; a missing page is
    /// loaded into a victim frame chosen by the clock and installed with a
    /// pin count of one.
    pub fn read_page(&mut self, file: FileHandle, page_id: PageId) -> FileResult<FrameId> {
        let key = BufferKey { file, page_id };

        if let Some(&frame_id) = self.directory.get(&key) {
            let frame = &mut self.frames[frame_id];
            frame.pin_count += 1;
            frame.refbit = true;
            return Ok(frame_id);
        }

        let frame_id = self.alloc_buf()?;
        self.file_manager
            .read_page(file, page_id, &mut self.frames[frame_id].data)?;
        self.frames[frame_id].set(file, page_id);
        self.directory.insert(key, frame_id);
        Ok(frame_id)
    }

    /// Release one pin on a page, folding `dirty` into the frame's dirty bit
    pub fn unpin_page(&mut self, file: FileHandle, page_id: PageId, dirty: bool) -> FileResult<()> {
        let key = BufferKey { file, page_id };
        let Some(&frame_id) = self.directory.get(&key) else {
            return Err(FileError::PageNotFound(page_id));
        };

        let frame = &mut self.frames[frame_id];
        if frame.pin_count == 0 {
            return Err(FileError::PageNotPinned(page_id));
        }
        frame.pin_count -= 1;
        frame.dirty |= dirty;
        Ok(())
    }

    /// Allocate a new page in `file` and pin it in a zeroed frame.
    ///
    /// The caller is expected to initialize the page image and unpin it
    /// dirty.
    pub fn alloc_page(&mut self, file: FileHandle) -> FileResult<(PageId, FrameId)> {
        let page_id = self.file_manager.allocate_page(file)?;
        let frame_id = self.alloc_buf()?;
        let frame = &mut self.frames[frame_id];
        frame.data.fill(0);
        frame.set(file, page_id);
        self.directory.insert(BufferKey { file, page_id }, frame_id);
        Ok((page_id, frame_id))
    }

    /// Drop a page from the pool without write-back and free it in the file
    pub fn dispose_page(&mut self, file: FileHandle, page_id: PageId) -> FileResult<()> {
        if let Some(frame_id) = self.directory.remove(&BufferKey { file, page_id }) {
            self.frames[frame_id].clear();
        }
        self.file_manager.dispose_page(file, page_id)
    }

    /// Write back and evict every page of `file`.
    ///
    /// Fails with `PagePinned` if any page of the file is still pinned; no
    /// page is evicted in that case beyond those already processed.
    pub fn flush_file(&mut self, file: FileHandle) -> FileResult<()> {
        for frame_id in 0..self.frames.len() {
            if self.frames[frame_id].file != Some(file) {
                continue;
            }
            if !self.frames[frame_id].valid {
                // a free frame must not keep naming a file
                return Err(FileError::BadFrame(frame_id));
            }
            let page_id = self.frames[frame_id].page_id;
            if self.frames[frame_id].pin_count > 0 {
                return Err(FileError::PagePinned(page_id));
            }
            if self.frames[frame_id].dirty {
                self.file_manager
                    .write_page(file, page_id, &self.frames[frame_id].data)?;
                self.frames[frame_id].dirty = false;
            }
            self.directory.remove(&BufferKey { file, page_id });
            self.frames[frame_id].clear();
        }
        self.file_manager.sync_file(file)
    }

    /// Page image of a pinned frame
    pub fn page(&self, frame_id: FrameId) -> &[u8] {
        &self.frames[frame_id].data
    }

    /// Mutable page image of a pinned frame. Dirtiness is declared at unpin
    /// time, not inferred here.
    pub fn page_mut(&mut self, frame_id: FrameId) -> &mut [u8] {
        &mut self.frames[frame_id].data
    }

    /// Number of frames in the pool
    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// Check if a page is resident
    pub fn is_page_cached(&self, file: FileHandle, page_id: PageId) -> bool {
        self.directory.contains_key(&BufferKey { file, page_id })
    }

    /// Pin count of a resident page
    pub fn page_pin_count(&self, file: FileHandle, page_id: PageId) -> Option<u32> {
        self.directory
            .get(&BufferKey { file, page_id })
            .map(|&frame_id| self.frames[frame_id].pin_count)
    }

    /// Number of pages currently resident
    pub fn resident_page_count(&self) -> usize {
        self.directory.len()
    }

    /// Number of dirty pages in the pool
    pub fn dirty_page_count(&self) -> usize {
        self.frames.iter().filter(|f| f.valid && f.dirty).count()
    }

    /// Check whether any page of `file` is resident
    pub fn has_resident_pages(&self, file: FileHandle) -> bool {
        self.frames.iter().any(|f| f.valid && f.file == Some(file))
    }

    /// Clock sweep for a victim frame.
    ///
    /// Starting past the hand, each frame gets at most two inspections: the
    /// first sweep may only demote refbits, the second is guaranteed to find
    /// an unpinned frame if one exists. An invalid frame is taken as-is; a
    /// set refbit buys the frame a second chance; pinned frames are skipped
    /// without touching their refbit; otherwise the frame is the victim and
    /// is written back if dirty, unmapped, and cleared.
    fn alloc_buf(&mut self) -> FileResult<FrameId> {
        let n = self.frames.len();
        for _ in 0..2 * n {
            self.clock_hand = (self.clock_hand + 1) % n;
            let hand = self.clock_hand;

            if !self.frames[hand].valid {
                return Ok(hand);
            }
            if self.frames[hand].refbit {
                self.frames[hand].refbit = false;
                continue;
            }
            if self.frames[hand].pin_count > 0 {
                continue;
            }

            let Some(file) = self.frames[hand].file else {
                return Err(FileError::BadFrame(hand));
            };
            let page_id = self.frames[hand].page_id;
            if self.frames[hand].dirty {
                self.file_manager
                    .write_page(file, page_id, &self.frames[hand].data)?;
                self.frames[hand].dirty = false;
            }
            self.directory.remove(&BufferKey { file, page_id });
            self.frames[hand].clear();
            return Ok(hand);
        }
        Err(FileError::BufferExceeded)
    }
}

impl Drop for BufferManager {
    fn drop(&mut self) {
        // Write back every valid dirty frame. Outstanding pins are not an
        // error at teardown, but they mean some handle leaked one.
        for frame_id in 0..self.frames.len() {
            if !self.frames[frame_id].valid {
                continue;
            }
            if self.frames[frame_id].pin_count > 0 {
                warn!(
                    "page {} still pinned {} time(s) at buffer pool teardown",
                    self.frames[frame_id].page_id, self.frames[frame_id].pin_count
                );
            }
            if self.frames[frame_id].dirty
                && let Some(file) = self.frames[frame_id].file
            {
                let page_id = self.frames[frame_id].page_id;
                if let Err(e) =
                    self.file_manager
                        .write_page(file, page_id, &self.frames[frame_id].data)
                {
                    warn!("write-back of page {} failed at teardown: {}", page_id, e);
                }
            }
        }
        if let Err(e) = self.file_manager.sync_all() {
            warn!("sync failed at buffer pool teardown: {}", e);
        }
    }
}

/// RAII pin on a buffer-pool page.
///
/// `write` folds dirtiness into the guard; dropping the guard releases the
/// pin with the accumulated dirty flag. Paths that need the unpin result
/// call `unpin` instead of dropping.
pub struct PageGuard {
    manager: SharedBufferManager,
    file: FileHandle,
    page_id: PageId,
    frame_id: FrameId,
    dirty: Cell<bool>,
    released: bool,
}

impl PageGuard {
    /// Pin an existing page
    pub fn pin(
        manager: &SharedBufferManager,
        file: FileHandle,
        page_id: PageId,
    ) -> FileResult<Self> {
        let frame_id = manager.lock().unwrap().read_page(file, page_id)?;
        Ok(Self {
            manager: Arc::clone(manager),
            file,
            page_id,
            frame_id,
            dirty: Cell::new(false),
            released: false,
        })
    }

    /// Allocate a fresh page in `file` and pin it
    pub fn alloc(manager: &SharedBufferManager, file: FileHandle) -> FileResult<(PageId, Self)> {
        let (page_id, frame_id) = manager.lock().unwrap().alloc_page(file)?;
        Ok((
            page_id,
            Self {
                manager: Arc::clone(manager),
                file,
                page_id,
                frame_id,
                dirty: Cell::new(false),
                released: false,
            },
        ))
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Read the pinned page image
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let mgr = self.manager.lock().unwrap();
        f(mgr.page(self.frame_id))
    }

    /// Mutate the pinned page image; the pin will be released dirty
    pub fn write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        self.dirty.set(true);
        let mut mgr = self.manager.lock().unwrap();
        f(mgr.page_mut(self.frame_id))
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Release the pin, surfacing the unpin result
    pub fn unpin(mut self) -> FileResult<()> {
        self.released = true;
        self.manager
            .lock()
            .unwrap()
            .unpin_page(self.file, self.page_id, self.dirty.get())
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) =
            self.manager
                .lock()
                .unwrap()
                .unpin_page(self.file, self.page_id, self.dirty.get())
        {
            warn!("failed to unpin page {}: {}", self.page_id, e);
        }
    }
}
