use std::cmp::Ordering;
use std::mem::size_of;

use serde::{Deserialize, Serialize};

use super::error::{HeapError, HeapResult};
use super::heap_file::HeapFile;
use super::page::{DataPage, MAX_RECORD_SIZE, Rid, SlotId};
use crate::file::{PageGuard, PageId, SharedBufferManager};

/// Attribute type a predicate compares on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrType {
    Int,
    Float,
    Str,
}

/// Comparison operator for scan predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

/// Filter applied to every record a scan visits.
///
/// The attribute lives at a fixed byte range within the record; it is copied
/// into aligned locals before being interpreted, so records need no
/// alignment of their own.
#[derive(Debug, Clone)]
pub struct Predicate {
    offset: usize,
    length: usize,
    attr_type: AttrType,
    op: CompOp,
    value: Vec<u8>,
}

impl Predicate {
    pub fn new(
        offset: usize,
        length: usize,
        attr_type: AttrType,
        op: CompOp,
        value: Vec<u8>,
    ) -> HeapResult<Self> {
        if length < 1 {
            return Err(HeapError::BadScanParam(format!(
                "attribute length must be positive, got {}",
                length
            )));
        }
        match attr_type {
            AttrType::Int if length != size_of::<i32>() => {
                return Err(HeapError::BadScanParam(format!(
                    "integer attribute must be {} bytes, got {}",
                    size_of::<i32>(),
                    length
                )));
            }
            AttrType::Float if length != size_of::<f64>() => {
                return Err(HeapError::BadScanParam(format!(
                    "float attribute must be {} bytes, got {}",
                    size_of::<f64>(),
                    length
                )));
            }
            _ => {}
        }
        if value.len() != length {
            return Err(HeapError::BadScanParam(format!(
                "filter value is {} bytes but the attribute is {}",
                value.len(),
                length
            )));
        }

        Ok(Self {
            offset,
            length,
            attr_type,
            op,
            value,
        })
    }

    /// Whether a record satisfies the predicate. A record too short to hold
    /// the attribute is a non-match, not an error.
    pub fn matches(&self, record: &[u8]) -> bool {
        if self.offset + self.length > record.len() {
            return false;
        }
        let attr = &record[self.offset..self.offset + self.length];

        let ord = match self.attr_type {
            AttrType::Int => {
                let mut a = [0u8; 4];
                let mut v = [0u8; 4];
                a.copy_from_slice(attr);
                v.copy_from_slice(&self.value);
                i32::from_le_bytes(a).cmp(&i32::from_le_bytes(v))
            }
            AttrType::Float => {
                let mut a = [0u8; 8];
                let mut v = [0u8; 8];
                a.copy_from_slice(attr);
                v.copy_from_slice(&self.value);
                match f64::from_le_bytes(a).partial_cmp(&f64::from_le_bytes(v)) {
                    Some(ord) => ord,
                    None => return false,
                }
            }
            AttrType::Str => attr.cmp(&self.value[..]),
        };

        match self.op {
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Le => ord != Ordering::Greater,
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Ge => ord != Ordering::Less,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Ne => ord != Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ScanMark {
    page_no: Option<PageId>,
    rec: Option<Rid>,
}

/// Forward-only filtered cursor over all records of a heap file.
///
/// While positioned on a record the cursor keeps that record's page pinned;
/// advancing across a page boundary releases the old page before pinning the
/// next one.
pub struct HeapFileScan {
    file: HeapFile,
    predicate: Option<Predicate>,
    mark: Option<ScanMark>,
    finished: bool,
}

impl HeapFileScan {
    pub fn open(manager: &SharedBufferManager, name: &str) -> HeapResult<Self> {
        Ok(Self {
            file: HeapFile::open(manager, name)?,
            predicate: None,
            mark: None,
            finished: false,
        })
    }

    /// Install the filter for the next pass and rewind the cursor.
    /// `None` matches every record.
    pub fn start_scan(&mut self, predicate: Option<Predicate>) -> HeapResult<()> {
        self.predicate = predicate;
        self.finished = false;
        self.mark = None;
        self.file.cur_rec = None;
        if let Some(old) = self.file.cur_page.take() {
            old.unpin()?;
        }
        Ok(())
    }

    /// Advance to the next matching record.
    ///
    /// Returns its identifier and leaves its page pinned; `None` means the
    /// scan reached the end of the file and holds no page. Once exhausted
    /// the scan stays exhausted until `start_scan` rewinds it.
    pub fn scan_next(&mut self) -> HeapResult<Option<Rid>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            if self.file.cur_page.is_none() {
                let first = self.file.first_page();
                self.file.cur_rec = None;
                self.file.cur_page =
                    Some(PageGuard::pin(&self.file.manager, self.file.file_handle, first)?);
            }
            let Some(guard) = self.file.cur_page.as_ref() else {
                return Ok(None);
            };
            let page_no = guard.page_id();

            let start = match self.file.cur_rec {
                Some(rid) if rid.page_no == page_no => Some(rid.slot_no),
                _ => None,
            };

            // Walk the slot directory from the cursor position
            let (matched, next_page) = guard.read(|buf| -> HeapResult<(Option<SlotId>, Option<PageId>)> {
                let page = DataPage::open(buf)?;
                let mut slot = match start {
                    Some(slot_no) => page.next_record(slot_no),
                    None => page.first_record(),
                };
                while let Some(slot_no) = slot {
                    let record = page.get_record(slot_no)?;
                    if self.predicate.as_ref().is_none_or(|p| p.matches(record)) {
                        return Ok((Some(slot_no), None));
                    }
                    slot = page.next_record(slot_no);
                }
                Ok((None, page.next_page()))
            })?;

            if let Some(slot_no) = matched {
                let rid = Rid::new(page_no, slot_no);
                self.file.cur_rec = Some(rid);
                return Ok(Some(rid));
            }

            // Page exhausted: release it, then follow the chain or finish
            self.file.cur_rec = None;
            if let Some(old) = self.file.cur_page.take() {
                old.unpin()?;
            }

            let Some(next) = next_page else {
                self.finished = true;
                return Ok(None);
            };
            self.file.cur_page =
                Some(PageGuard::pin(&self.file.manager, self.file.file_handle, next)?);
        }
    }

    /// Bytes of the record the scan is positioned on. The page stays pinned.
    pub fn get_record(&self) -> HeapResult<Vec<u8>> {
        let rid = self.file.cur_rec.ok_or(HeapError::NoCurrentRecord)?;
        let guard = self.file.cur_page.as_ref().ok_or(HeapError::NoCurrentRecord)?;
        guard.read(|buf| {
            let page = DataPage::open(buf)?;
            Ok(page.get_record(rid.slot_no)?.to_vec())
        })
    }

    /// Delete the record the scan is positioned on.
    ///
    /// The slot is tombstoned, so a following `scan_next` still finds the
    /// next higher slot on the same page.
    pub fn delete_record(&mut self) -> HeapResult<()> {
        let rid = self.file.cur_rec.ok_or(HeapError::NoCurrentRecord)?;
        let guard = self.file.cur_page.as_ref().ok_or(HeapError::NoCurrentRecord)?;
        guard.write(|buf| {
            let mut page = DataPage::open(buf)?;
            page.delete_record(rid.slot_no)
        })?;
        self.file.update_header(|h| h.rec_cnt -= 1);
        Ok(())
    }

    /// Snapshot the scan position
    pub fn mark_scan(&mut self) {
        self.mark = Some(ScanMark {
            page_no: self.file.cur_page.as_ref().map(|g| g.page_id()),
            rec: self.file.cur_rec,
        });
    }

    /// Rewind to the last `mark_scan` snapshot. Without a snapshot this is a
    /// no-op. The restored page counts as clean from the cursor's view.
    pub fn reset_scan(&mut self) -> HeapResult<()> {
        let Some(mark) = self.mark else {
            return Ok(());
        };
        self.finished = false;

        let cur_no = self.file.cur_page.as_ref().map(|g| g.page_id());
        if cur_no != mark.page_no {
            if let Some(old) = self.file.cur_page.take() {
                old.unpin()?;
            }
            if let Some(page_no) = mark.page_no {
                self.file.cur_page = Some(PageGuard::pin(
                    &self.file.manager,
                    self.file.file_handle,
                    page_no,
                )?);
            }
        }
        self.file.cur_rec = mark.rec;
        Ok(())
    }

    /// Release the scan's pin and clear its position. Safe to call twice.
    pub fn end_scan(&mut self) -> HeapResult<()> {
        self.file.cur_rec = None;
        self.finished = false;
        if let Some(old) = self.file.cur_page.take() {
            old.unpin()?;
        }
        Ok(())
    }

    pub fn rec_cnt(&self) -> u32 {
        self.file.rec_cnt()
    }
}

/// Append-optimized cursor positioned at the tail of a heap file
pub struct InsertFileScan {
    file: HeapFile,
}

impl InsertFileScan {
    pub fn open(manager: &SharedBufferManager, name: &str) -> HeapResult<Self> {
        Ok(Self {
            file: HeapFile::open(manager, name)?,
        })
    }

    /// Insert a record, growing the page chain when the current page is full
    pub fn insert_record(&mut self, record: &[u8]) -> HeapResult<Rid> {
        if record.len() > MAX_RECORD_SIZE {
            return Err(HeapError::InvalidRecLen(record.len()));
        }

        if self.file.cur_page.is_none() {
            let last = self.file.last_page();
            self.file.cur_rec = None;
            self.file.cur_page = Some(PageGuard::pin(
                &self.file.manager,
                self.file.file_handle,
                last,
            )?);
        }
        let guard = self.file.cur_page.as_ref().ok_or(HeapError::NoCurrentRecord)?;
        let mut page_no = guard.page_id();
        let mut slot = Self::try_insert(guard, record)?;

        if slot.is_none() {
            // Current page is full: splice a fresh page in after it
            let (new_no, new_guard) =
                PageGuard::alloc(&self.file.manager, self.file.file_handle)?;
            let old_next = guard.read(|buf| -> HeapResult<Option<PageId>> {
                Ok(DataPage::open(buf)?.next_page())
            })?;
            new_guard.write(|buf| {
                let mut page = DataPage::init(buf);
                page.set_next_page(old_next);
            });
            guard.write(|buf| -> HeapResult<()> {
                let mut page = DataPage::open(buf)?;
                page.set_next_page(Some(new_no));
                Ok(())
            })?;

            if let Some(old) = self.file.cur_page.take() {
                old.unpin()?;
            }
            self.file.update_header(|h| {
                h.page_cnt += 1;
                if old_next.is_none() {
                    h.last_page = new_no;
                }
            });

            let guard = self.file.cur_page.insert(new_guard);
            page_no = new_no;
            slot = Self::try_insert(guard, record)?;
        }

        let Some(slot_no) = slot else {
            // a fresh page must hold any record that passed the length check
            return Err(HeapError::CorruptPage(format!(
                "record of {} bytes rejected by an empty page",
                record.len()
            )));
        };

        let rid = Rid::new(page_no, slot_no);
        self.file.cur_rec = Some(rid);
        self.file.update_header(|h| h.rec_cnt += 1);
        Ok(rid)
    }

    fn try_insert(guard: &PageGuard, record: &[u8]) -> HeapResult<Option<SlotId>> {
        guard.write(|buf| {
            let mut page = DataPage::open(buf)?;
            Ok(page.insert_record(record))
        })
    }

    pub fn rec_cnt(&self) -> u32 {
        self.file.rec_cnt()
    }

    pub fn page_cnt(&self) -> u32 {
        self.file.page_cnt()
    }

    pub fn last_page(&self) -> PageId {
        self.file.last_page()
    }

    pub fn first_page(&self) -> PageId {
        self.file.first_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{BufferManager, PagedFileManager};
    use crate::heap::heap_file::create_heap_file;
    use tempfile::TempDir;

    fn setup_heap(records: &[&[u8]]) -> (TempDir, SharedBufferManager, String) {
        let _ = env_logger::builder().is_test(true).try_init();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("rel.hf").to_str().unwrap().to_string();
        let manager = BufferManager::with_capacity(PagedFileManager::new(), 16).into_shared();

        create_heap_file(&manager, &path).unwrap();
        let mut ic = InsertFileScan::open(&manager, &path).unwrap();
        for record in records {
            ic.insert_record(record).unwrap();
        }
        (temp_dir, manager, path)
    }

    fn int_records(values: &[i32]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.to_le_bytes().to_vec()).collect()
    }

    fn collect_scan(scan: &mut HeapFileScan) -> Vec<Vec<u8>> {
        let mut records = Vec::new();
        while scan.scan_next().unwrap().is_some() {
            records.push(scan.get_record().unwrap());
        }
        records
    }

    #[test]
    fn test_unfiltered_scan_in_insertion_order() {
        let (_temp, manager, path) = setup_heap(&[b"alpha", b"beta!", b"gamma"]);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();
        assert_eq!(scan.rec_cnt(), 3);
        assert_eq!(
            collect_scan(&mut scan),
            vec![b"alpha".to_vec(), b"beta!".to_vec(), b"gamma".to_vec()]
        );
    }

    #[test]
    fn test_scan_yields_distinct_rids() {
        let records = int_records(&[1, 2, 3, 4, 5]);
        let refs: Vec<&[u8]> = records.iter().map(|r| r.as_slice()).collect();
        let (_temp, manager, path) = setup_heap(&refs);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();
        let mut rids = Vec::new();
        while let Some(rid) = scan.scan_next().unwrap() {
            rids.push(rid);
        }
        assert_eq!(rids.len(), 5);
        let mut dedup = rids.clone();
        dedup.sort_by_key(|r| (r.page_no, r.slot_no));
        dedup.dedup();
        assert_eq!(dedup.len(), 5);
    }

    #[test]
    fn test_filtered_scan_greater_than() {
        let records = int_records(&[10, 20, 30, 40]);
        let refs: Vec<&[u8]> = records.iter().map(|r| r.as_slice()).collect();
        let (_temp, manager, path) = setup_heap(&refs);

        let predicate = Predicate::new(
            0,
            4,
            AttrType::Int,
            CompOp::Gt,
            20i32.to_le_bytes().to_vec(),
        )
        .unwrap();

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(Some(predicate)).unwrap();
        assert_eq!(collect_scan(&mut scan), int_records(&[30, 40]));
    }

    #[test]
    fn test_string_and_float_filters() {
        let (_temp, manager, path) = setup_heap(&[b"apple", b"mango", b"peach"]);

        let predicate =
            Predicate::new(0, 5, AttrType::Str, CompOp::Ge, b"mango".to_vec()).unwrap();
        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(Some(predicate)).unwrap();
        assert_eq!(
            collect_scan(&mut scan),
            vec![b"mango".to_vec(), b"peach".to_vec()]
        );

        let floats: Vec<Vec<u8>> = [1.5f64, 2.5, 3.5]
            .iter()
            .map(|f| f.to_le_bytes().to_vec())
            .collect();
        let temp_dir = tempfile::tempdir().unwrap();
        let fpath = temp_dir.path().join("f.hf").to_str().unwrap().to_string();
        create_heap_file(&manager, &fpath).unwrap();
        let mut ic = InsertFileScan::open(&manager, &fpath).unwrap();
        for f in &floats {
            ic.insert_record(f).unwrap();
        }
        drop(ic);

        let predicate = Predicate::new(
            0,
            8,
            AttrType::Float,
            CompOp::Ne,
            2.5f64.to_le_bytes().to_vec(),
        )
        .unwrap();
        let mut scan = HeapFileScan::open(&manager, &fpath).unwrap();
        scan.start_scan(Some(predicate)).unwrap();
        assert_eq!(collect_scan(&mut scan), vec![floats[0].clone(), floats[2].clone()]);
    }

    #[test]
    fn test_short_record_is_a_non_match() {
        let (_temp, manager, path) = setup_heap(&[b"ab"]);

        let predicate =
            Predicate::new(0, 4, AttrType::Int, CompOp::Eq, vec![0, 0, 0, 0]).unwrap();
        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(Some(predicate)).unwrap();
        assert_eq!(scan.scan_next().unwrap(), None);
    }

    #[test]
    fn test_bad_scan_params() {
        assert!(matches!(
            Predicate::new(0, 0, AttrType::Str, CompOp::Eq, vec![]),
            Err(HeapError::BadScanParam(_))
        ));
        assert!(matches!(
            Predicate::new(0, 2, AttrType::Int, CompOp::Eq, vec![0, 0]),
            Err(HeapError::BadScanParam(_))
        ));
        assert!(matches!(
            Predicate::new(0, 4, AttrType::Float, CompOp::Eq, vec![0; 4]),
            Err(HeapError::BadScanParam(_))
        ));
        assert!(matches!(
            Predicate::new(0, 4, AttrType::Int, CompOp::Eq, vec![0; 3]),
            Err(HeapError::BadScanParam(_))
        ));
    }

    #[test]
    fn test_scan_pins_current_page_only() {
        let (_temp, manager, path) = setup_heap(&[b"aaaa", b"bbbb"]);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();

        let rid = scan.scan_next().unwrap().unwrap();
        {
            let mgr = manager.lock().unwrap();
            let handle = mgr.file_manager().handle_for(&path).unwrap();
            assert_eq!(mgr.page_pin_count(handle, rid.page_no), Some(1));
        }

        while scan.scan_next().unwrap().is_some() {}
        let mgr = manager.lock().unwrap();
        let handle = mgr.file_manager().handle_for(&path).unwrap();
        assert_eq!(mgr.page_pin_count(handle, rid.page_no), Some(0));
    }

    #[test]
    fn test_exhausted_scan_stays_exhausted() {
        let (_temp, manager, path) = setup_heap(&[b"only"]);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();
        assert!(scan.scan_next().unwrap().is_some());
        assert!(scan.scan_next().unwrap().is_none());
        assert!(scan.scan_next().unwrap().is_none());

        // Rewinding restarts from the top
        scan.start_scan(None).unwrap();
        assert!(scan.scan_next().unwrap().is_some());
    }

    #[test]
    fn test_delete_during_scan() {
        let records = int_records(&[1, 2, 3, 4, 5]);
        let refs: Vec<&[u8]> = records.iter().map(|r| r.as_slice()).collect();
        let (_temp, manager, path) = setup_heap(&refs);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        let predicate = Predicate::new(
            0,
            4,
            AttrType::Int,
            CompOp::Eq,
            3i32.to_le_bytes().to_vec(),
        )
        .unwrap();
        scan.start_scan(Some(predicate)).unwrap();
        scan.scan_next().unwrap().unwrap();
        scan.delete_record().unwrap();
        assert_eq!(scan.rec_cnt(), 4);
        scan.end_scan().unwrap();

        scan.start_scan(None).unwrap();
        assert_eq!(collect_scan(&mut scan), int_records(&[1, 2, 4, 5]));

        // The deleted slot is gone for later scans too
        let mut scan2 = HeapFileScan::open(&manager, &path).unwrap();
        scan2.start_scan(None).unwrap();
        assert_eq!(collect_scan(&mut scan2), int_records(&[1, 2, 4, 5]));
    }

    #[test]
    fn test_delete_without_position_fails() {
        let (_temp, manager, path) = setup_heap(&[b"rec"]);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();
        assert!(matches!(
            scan.delete_record(),
            Err(HeapError::NoCurrentRecord)
        ));
    }

    #[test]
    fn test_mark_and_reset() {
        let records = int_records(&[1, 2, 3, 4]);
        let refs: Vec<&[u8]> = records.iter().map(|r| r.as_slice()).collect();
        let (_temp, manager, path) = setup_heap(&refs);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();

        let first = scan.scan_next().unwrap().unwrap();
        scan.mark_scan();
        let second = scan.scan_next().unwrap().unwrap();
        assert_ne!(first, second);

        // Resetting replays everything after the mark
        scan.reset_scan().unwrap();
        assert_eq!(scan.scan_next().unwrap(), Some(second));
    }

    #[test]
    fn test_reset_after_eof_repins_marked_page() {
        let records = int_records(&[1, 2, 3]);
        let refs: Vec<&[u8]> = records.iter().map(|r| r.as_slice()).collect();
        let (_temp, manager, path) = setup_heap(&refs);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();
        let first = scan.scan_next().unwrap().unwrap();
        scan.mark_scan();

        while scan.scan_next().unwrap().is_some() {}

        scan.reset_scan().unwrap();
        assert_eq!(scan.get_record().unwrap(), records[0]);
        let next = scan.scan_next().unwrap().unwrap();
        assert_ne!(next, first);
    }

    #[test]
    fn test_end_scan_is_idempotent() {
        let (_temp, manager, path) = setup_heap(&[b"rec"]);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();
        scan.scan_next().unwrap().unwrap();

        scan.end_scan().unwrap();
        scan.end_scan().unwrap();

        let mgr = manager.lock().unwrap();
        let handle = mgr.file_manager().handle_for(&path).unwrap();
        // only the header pin of the open file remains
        assert_eq!(mgr.page_pin_count(handle, 0), Some(1));
    }

    #[test]
    fn test_insert_rejects_oversized_record() {
        let (_temp, manager, path) = setup_heap(&[]);

        let mut ic = InsertFileScan::open(&manager, &path).unwrap();
        let record = vec![0u8; MAX_RECORD_SIZE + 1];
        assert!(matches!(
            ic.insert_record(&record),
            Err(HeapError::InvalidRecLen(_))
        ));
    }

    #[test]
    fn test_insert_grows_page_chain() {
        let (_temp, manager, path) = setup_heap(&[]);

        // Fill the first page and spill a couple of records onto a second
        let record = vec![9u8; 1000];
        let per_page = 8;
        let mut ic = InsertFileScan::open(&manager, &path).unwrap();
        let mut rids = Vec::new();
        for _ in 0..per_page + 2 {
            rids.push(ic.insert_record(&record).unwrap());
        }

        assert_eq!(ic.page_cnt(), 2);
        assert_ne!(ic.first_page(), ic.last_page());
        assert_eq!(ic.rec_cnt(), (per_page + 2) as u32);
        drop(ic);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        scan.start_scan(None).unwrap();
        let mut seen = Vec::new();
        while let Some(rid) = scan.scan_next().unwrap() {
            assert_eq!(scan.get_record().unwrap(), record);
            seen.push(rid);
        }
        assert_eq!(seen, rids);
    }

    #[test]
    fn test_insert_reuses_deleted_slot_space() {
        let records = int_records(&[7, 8, 9]);
        let refs: Vec<&[u8]> = records.iter().map(|r| r.as_slice()).collect();
        let (_temp, manager, path) = setup_heap(&refs);

        let mut scan = HeapFileScan::open(&manager, &path).unwrap();
        let predicate = Predicate::new(
            0,
            4,
            AttrType::Int,
            CompOp::Eq,
            8i32.to_le_bytes().to_vec(),
        )
        .unwrap();
        scan.start_scan(Some(predicate)).unwrap();
        let deleted = scan.scan_next().unwrap().unwrap();
        scan.delete_record().unwrap();
        scan.end_scan().unwrap();
        drop(scan);

        let mut ic = InsertFileScan::open(&manager, &path).unwrap();
        let rid = ic.insert_record(&10i32.to_le_bytes()).unwrap();
        assert_eq!(rid, deleted);
        assert_eq!(ic.rec_cnt(), 3);
    }
}
