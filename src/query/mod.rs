use thiserror::Error;

use crate::catalog::{AttrDesc, Catalog, CatalogError};
use crate::file::SharedBufferManager;
use crate::heap::{AttrType, CompOp, HeapError, HeapFileScan, InsertFileScan, Predicate, Rid};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("heap error: {0}")]
    Heap(#[from] HeapError),

    #[error("bad catalog parameter: {0}")]
    BadCatParam(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// A relation.attribute pair naming a projection or selection target
#[derive(Debug, Clone)]
pub struct AttrRef {
    pub rel_name: String,
    pub attr_name: String,
}

impl AttrRef {
    pub fn new(rel_name: &str, attr_name: &str) -> Self {
        Self {
            rel_name: rel_name.to_string(),
            attr_name: attr_name.to_string(),
        }
    }
}

/// Selection condition with the comparison value still in text form
#[derive(Debug, Clone)]
pub struct Selection {
    pub attr: AttrRef,
    pub op: CompOp,
    pub value: String,
}

impl Selection {
    pub fn new(attr: AttrRef, op: CompOp, value: &str) -> Self {
        Self {
            attr,
            op,
            value: value.to_string(),
        }
    }
}

/// Encode a textual value into the attribute's on-record form
fn encode_value(desc: &AttrDesc, raw: &str) -> QueryResult<Vec<u8>> {
    match desc.attr_type {
        AttrType::Int => {
            let value: i32 = raw.trim().parse().map_err(|_| {
                QueryError::BadCatParam(format!("{:?} is not an integer", raw))
            })?;
            Ok(value.to_le_bytes().to_vec())
        }
        AttrType::Float => {
            let value: f64 = raw.trim().parse().map_err(|_| {
                QueryError::BadCatParam(format!("{:?} is not a float", raw))
            })?;
            Ok(value.to_le_bytes().to_vec())
        }
        AttrType::Str => {
            let bytes = raw.as_bytes();
            if bytes.len() > desc.len {
                return Err(QueryError::BadCatParam(format!(
                    "string {:?} exceeds {} bytes",
                    raw, desc.len
                )));
            }
            let mut out = vec![0u8; desc.len];
            out[..bytes.len()].copy_from_slice(bytes);
            Ok(out)
        }
    }
}

fn build_predicate(catalog: &Catalog, selection: &Selection) -> QueryResult<Predicate> {
    let desc = catalog.get_info(&selection.attr.rel_name, &selection.attr.attr_name)?;
    let value = encode_value(desc, &selection.value)?;
    Ok(Predicate::new(
        desc.offset,
        desc.len,
        desc.attr_type,
        selection.op,
        value,
    )?)
}

/// Copy the projected attributes of every matching record into `result`.
///
/// `result` must be an existing heap file whose record layout is the
/// projected attributes in the given order; the source relation is the one
/// the first projection names. Returns the number of tuples produced.
pub fn select(
    manager: &SharedBufferManager,
    catalog: &Catalog,
    result: &str,
    projections: &[AttrRef],
    selection: Option<&Selection>,
) -> QueryResult<usize> {
    if projections.is_empty() {
        return Err(QueryError::BadCatParam("empty projection list".to_string()));
    }

    let mut proj_descs = Vec::with_capacity(projections.len());
    let mut rec_len = 0;
    for proj in projections {
        let desc = catalog.get_info(&proj.rel_name, &proj.attr_name)?;
        rec_len += desc.len;
        proj_descs.push(desc.clone());
    }

    let predicate = selection
        .map(|sel| build_predicate(catalog, sel))
        .transpose()?;

    let mut result_rel = InsertFileScan::open(manager, result)?;
    let mut scan = HeapFileScan::open(manager, &projections[0].rel_name)?;
    scan.start_scan(predicate)?;

    let mut out = vec![0u8; rec_len];
    let mut tuple_count = 0;
    while scan.scan_next()?.is_some() {
        let record = scan.get_record()?;
        let mut pos = 0;
        for desc in &proj_descs {
            if record.len() < desc.offset + desc.len {
                return Err(QueryError::BadCatParam(format!(
                    "record of {} is too short for attribute {}",
                    desc.rel_name, desc.attr_name
                )));
            }
            out[pos..pos + desc.len]
                .copy_from_slice(&record[desc.offset..desc.offset + desc.len]);
            pos += desc.len;
        }
        result_rel.insert_record(&out)?;
        tuple_count += 1;
    }
    scan.end_scan()?;
    Ok(tuple_count)
}

/// Insert one record built from (attribute, value-text) pairs.
///
/// Every attribute of the relation must be supplied exactly once; a count
/// mismatch, an unknown attribute, or an unparsable value is rejected.
pub fn insert(
    manager: &SharedBufferManager,
    catalog: &Catalog,
    relation: &str,
    values: &[(String, String)],
) -> QueryResult<Rid> {
    let attrs = catalog.get_rel_info(relation)?;
    if attrs.len() != values.len() {
        return Err(QueryError::BadCatParam(format!(
            "{} takes {} attributes, got {}",
            relation,
            attrs.len(),
            values.len()
        )));
    }
    for (name, _) in values {
        if !attrs.iter().any(|desc| &desc.attr_name == name) {
            return Err(QueryError::BadCatParam(format!(
                "{} has no attribute {}",
                relation, name
            )));
        }
    }

    let rec_len: usize = attrs.iter().map(|desc| desc.len).sum();
    let mut record = vec![0u8; rec_len];
    for desc in attrs {
        let Some((_, raw)) = values.iter().find(|(name, _)| name == &desc.attr_name) else {
            return Err(QueryError::BadCatParam(format!(
                "missing value for {}.{}",
                relation, desc.attr_name
            )));
        };
        let bytes = encode_value(desc, raw)?;
        record[desc.offset..desc.offset + desc.len].copy_from_slice(&bytes);
    }

    let mut rel = InsertFileScan::open(manager, relation)?;
    Ok(rel.insert_record(&record)?)
}

/// Delete matching records from a relation.
///
/// A missing filter, or one whose attribute name is empty, deletes every
/// record. Returns the number of records deleted.
pub fn delete(
    manager: &SharedBufferManager,
    catalog: &Catalog,
    relation: &str,
    filter: Option<&Selection>,
) -> QueryResult<usize> {
    if relation.is_empty() {
        return Err(QueryError::BadCatParam("empty relation name".to_string()));
    }

    let predicate = match filter {
        Some(sel) if !sel.attr.attr_name.is_empty() => Some(build_predicate(catalog, sel)?),
        _ => None,
    };

    let mut scan = HeapFileScan::open(manager, relation)?;
    scan.start_scan(predicate)?;
    let mut deleted = 0;
    while scan.scan_next()?.is_some() {
        scan.delete_record()?;
        deleted += 1;
    }
    scan.end_scan()?;
    Ok(deleted)
}
