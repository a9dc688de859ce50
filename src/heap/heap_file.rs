use std::sync::Arc;

use log::{debug, warn};

use super::error::{HeapError, HeapResult};
use super::page::{DataPage, Rid};
use crate::file::{FileHandle, PageGuard, PageId, SharedBufferManager};

const MAX_NAME_LEN: usize = 64;
const FIRST_PAGE_POS: usize = MAX_NAME_LEN;
const LAST_PAGE_POS: usize = MAX_NAME_LEN + 4;
const PAGE_CNT_POS: usize = MAX_NAME_LEN + 8;
const REC_CNT_POS: usize = MAX_NAME_LEN + 12;

/// Header-page payload, one per heap file
#[derive(Debug, Clone)]
pub(crate) struct HeapFileHeader {
    pub file_name: String,
    pub first_page: PageId,
    pub last_page: PageId,
    pub page_cnt: u32,
    pub rec_cnt: u32,
}

impl HeapFileHeader {
    fn new(file_name: &str, data_page: PageId) -> Self {
        Self {
            file_name: file_name.to_string(),
            first_page: data_page,
            last_page: data_page,
            page_cnt: 1,
            rec_cnt: 0,
        }
    }

    pub(crate) fn write_to(&self, buf: &mut [u8]) {
        let name = self.file_name.as_bytes();
        let name_len = name.len().min(MAX_NAME_LEN);
        buf[..name_len].copy_from_slice(&name[..name_len]);
        buf[name_len..MAX_NAME_LEN].fill(0);
        buf[FIRST_PAGE_POS..FIRST_PAGE_POS + 4].copy_from_slice(&self.first_page.to_le_bytes());
        buf[LAST_PAGE_POS..LAST_PAGE_POS + 4].copy_from_slice(&self.last_page.to_le_bytes());
        buf[PAGE_CNT_POS..PAGE_CNT_POS + 4].copy_from_slice(&self.page_cnt.to_le_bytes());
        buf[REC_CNT_POS..REC_CNT_POS + 4].copy_from_slice(&self.rec_cnt.to_le_bytes());
    }

    fn read_from(buf: &[u8]) -> HeapResult<Self> {
        if buf.len() < REC_CNT_POS + 4 {
            return Err(HeapError::CorruptPage(format!(
                "not enough data for file header: {} bytes",
                buf.len()
            )));
        }

        let name_end = buf[..MAX_NAME_LEN]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_NAME_LEN);
        let file_name = String::from_utf8_lossy(&buf[..name_end]).into_owned();

        let word = |pos: usize| u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]);
        Ok(Self {
            file_name,
            first_page: word(FIRST_PAGE_POS),
            last_page: word(LAST_PAGE_POS),
            page_cnt: word(PAGE_CNT_POS),
            rec_cnt: word(REC_CNT_POS),
        })
    }
}

/// Create a heap file: a header page followed by one empty data page.
///
/// Both pages are flushed before the file is closed, so the file is complete
/// on disk when this returns.
pub fn create_heap_file(manager: &SharedBufferManager, name: &str) -> HeapResult<()> {
    let mut mgr = manager.lock().unwrap();
    mgr.file_manager_mut().create_file(name)?;
    let file = mgr.file_manager_mut().open_file(name)?;

    let (header_no, header_frame) = mgr.alloc_page(file)?;
    let (data_no, data_frame) = mgr.alloc_page(file)?;

    DataPage::init(mgr.page_mut(data_frame));
    HeapFileHeader::new(name, data_no).write_to(mgr.page_mut(header_frame));

    mgr.unpin_page(file, header_no, true)?;
    mgr.unpin_page(file, data_no, true)?;
    mgr.flush_file(file)?;
    mgr.file_manager_mut().close_file(file)?;
    Ok(())
}

/// Destroy a heap file.
///
/// Resident pages are flushed first; a page still pinned by some cursor
/// fails the destroy with `PagePinned`.
pub fn destroy_heap_file(manager: &SharedBufferManager, name: &str) -> HeapResult<()> {
    let mut mgr = manager.lock().unwrap();
    if let Some(file) = mgr.file_manager().handle_for(name) {
        mgr.flush_file(file)?;
        mgr.file_manager_mut().close_file(file)?;
    }
    mgr.file_manager_mut().remove_file(name)?;
    Ok(())
}

/// An open heap file: an unordered bag of records stored on a chain of
/// slotted data pages behind a header page.
///
/// The header page stays pinned for as long as the file is open. The most
/// recently touched data page is kept pinned as the cursor's current page,
/// so sequential access to the same page costs no pool traffic.
pub struct HeapFile {
    pub(crate) manager: SharedBufferManager,
    pub(crate) file_handle: FileHandle,
    header_guard: Option<PageGuard>,
    header: HeapFileHeader,
    pub(crate) cur_page: Option<PageGuard>,
    pub(crate) cur_rec: Option<Rid>,
}

impl HeapFile {
    /// Open a heap file, pinning its header page and first data page
    pub fn open(manager: &SharedBufferManager, name: &str) -> HeapResult<Self> {
        let (file_handle, header_page_no) = {
            let mut mgr = manager.lock().unwrap();
            let file_handle = mgr.file_manager_mut().open_file(name)?;
            let header_page_no = mgr.file_manager().first_page(file_handle)?;
            (file_handle, header_page_no)
        };

        match Self::pin_initial_pages(manager, file_handle, header_page_no) {
            Ok((header_guard, header, cur_page)) => Ok(Self {
                manager: Arc::clone(manager),
                file_handle,
                header_guard: Some(header_guard),
                header,
                cur_page: Some(cur_page),
                cur_rec: None,
            }),
            Err(e) => {
                // balance the open before surfacing
                let mut mgr = manager.lock().unwrap();
                if let Err(close_err) = mgr.file_manager_mut().close_file(file_handle) {
                    warn!("failed to close {}: {}", name, close_err);
                }
                Err(e)
            }
        }
    }

    fn pin_initial_pages(
        manager: &SharedBufferManager,
        file_handle: FileHandle,
        header_page_no: PageId,
    ) -> HeapResult<(PageGuard, HeapFileHeader, PageGuard)> {
        let header_guard = PageGuard::pin(manager, file_handle, header_page_no)?;
        let header = header_guard.read(HeapFileHeader::read_from)?;
        let cur_page = PageGuard::pin(manager, file_handle, header.first_page)?;
        Ok((header_guard, header, cur_page))
    }

    /// Number of live records in the file
    pub fn rec_cnt(&self) -> u32 {
        self.header.rec_cnt
    }

    /// Number of data pages in the chain
    pub fn page_cnt(&self) -> u32 {
        self.header.page_cnt
    }

    pub fn first_page(&self) -> PageId {
        self.header.first_page
    }

    pub fn last_page(&self) -> PageId {
        self.header.last_page
    }

    pub fn file_name(&self) -> &str {
        &self.header.file_name
    }

    /// Fetch a record by identifier.
    ///
    /// The page holding the record becomes the cursor's current page; a
    /// previously held page is released first with its accumulated dirty
    /// flag. An unpin failure clears the cursor before surfacing.
    pub fn get_record(&mut self, rid: Rid) -> HeapResult<Vec<u8>> {
        if self
            .cur_page
            .as_ref()
            .is_none_or(|g| g.page_id() != rid.page_no)
        {
            if let Some(old) = self.cur_page.take() {
                self.cur_rec = None;
                old.unpin()?;
            }
            self.cur_page = Some(PageGuard::pin(&self.manager, self.file_handle, rid.page_no)?);
        }
        self.cur_rec = Some(rid);

        let guard = self.cur_page.as_ref().ok_or(HeapError::NoCurrentRecord)?;
        guard.read(|buf| {
            let page = DataPage::open(buf)?;
            Ok(page.get_record(rid.slot_no)?.to_vec())
        })
    }

    /// Apply a header change and write it through the pinned header page
    pub(crate) fn update_header(&mut self, f: impl FnOnce(&mut HeapFileHeader)) {
        f(&mut self.header);
        if let Some(guard) = &self.header_guard {
            guard.write(|buf| self.header.write_to(buf));
        }
    }
}

impl Drop for HeapFile {
    fn drop(&mut self) {
        // Release the data-page and header pins before touching the file
        if let Some(cur) = self.cur_page.take()
            && let Err(e) = cur.unpin()
        {
            warn!(
                "failed to unpin data page of {}: {}",
                self.header.file_name, e
            );
        }
        if let Some(header) = self.header_guard.take()
            && let Err(e) = header.unpin()
        {
            warn!(
                "failed to unpin header page of {}: {}",
                self.header.file_name, e
            );
        }

        let mut mgr = self.manager.lock().unwrap();
        if let Err(e) = mgr.flush_file(self.file_handle) {
            // another cursor still pins pages of this file; it flushes later
            debug!("flush of {} deferred: {}", self.header.file_name, e);
        }
        if let Err(e) = mgr.file_manager_mut().close_file(self.file_handle) {
            warn!("failed to close {}: {}", self.header.file_name, e);
        }
    }
}
