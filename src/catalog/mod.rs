use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::heap::AttrType;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Relation {0} not found")]
    RelationNotFound(String),

    #[error("Attribute {0}.{1} not found")]
    AttrNotFound(String, String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Physical placement of one attribute within a relation's records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrDesc {
    pub rel_name: String,
    pub attr_name: String,
    /// Byte offset of the attribute within the record
    pub offset: usize,
    /// Byte length of the attribute
    pub len: usize,
    pub attr_type: AttrType,
}

/// Maps relation and attribute names to record layouts.
///
/// Attributes are fixed-length and packed in declaration order, so a
/// relation's record length is the sum of its attribute lengths.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    relations: HashMap<String, Vec<AttrDesc>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the catalog from `catalog.json` under `dir`
    pub fn load(dir: &Path) -> CatalogResult<Self> {
        let content = fs::read_to_string(dir.join("catalog.json"))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the catalog to `catalog.json` under `dir`
    pub fn save(&self, dir: &Path) -> CatalogResult<()> {
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(dir.join("catalog.json"), content)?;
        Ok(())
    }

    /// Register a relation. Offsets are assigned in declaration order.
    pub fn add_relation(&mut self, rel_name: &str, attrs: &[(&str, AttrType, usize)]) {
        let mut offset = 0;
        let descs = attrs
            .iter()
            .map(|&(attr_name, attr_type, len)| {
                let desc = AttrDesc {
                    rel_name: rel_name.to_string(),
                    attr_name: attr_name.to_string(),
                    offset,
                    len,
                    attr_type,
                };
                offset += len;
                desc
            })
            .collect();
        self.relations.insert(rel_name.to_string(), descs);
    }

    pub fn remove_relation(&mut self, rel_name: &str) -> CatalogResult<()> {
        self.relations
            .remove(rel_name)
            .ok_or_else(|| CatalogError::RelationNotFound(rel_name.to_string()))?;
        Ok(())
    }

    /// Placement of one attribute
    pub fn get_info(&self, rel_name: &str, attr_name: &str) -> CatalogResult<&AttrDesc> {
        self.get_rel_info(rel_name)?
            .iter()
            .find(|desc| desc.attr_name == attr_name)
            .ok_or_else(|| {
                CatalogError::AttrNotFound(rel_name.to_string(), attr_name.to_string())
            })
    }

    /// All attributes of a relation, in record order
    pub fn get_rel_info(&self, rel_name: &str) -> CatalogResult<&[AttrDesc]> {
        self.relations
            .get(rel_name)
            .map(|descs| descs.as_slice())
            .ok_or_else(|| CatalogError::RelationNotFound(rel_name.to_string()))
    }

    /// Record length of a relation
    pub fn rec_len(&self, rel_name: &str) -> CatalogResult<usize> {
        Ok(self.get_rel_info(rel_name)?.iter().map(|d| d.len).sum())
    }
}
