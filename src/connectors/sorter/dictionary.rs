// Copyright © 2024 Pathway

use std::fmt::{self, Display};

use arcstr::ArcStr;
use log::warn;
use serde::Serialize;

use super::{SortOrder, Sorter, SorterBase};
use crate::engine::{BatchDefinition, DataError, Error, IdDict, Result, Value};

/// Keys on which the batch identifiers and the key reference list disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDrift {
    /// Present in the identifiers, absent from the reference list.
    pub unknown: Vec<ArcStr>,
    /// Present in the reference list, absent from the identifiers.
    pub missing: Vec<ArcStr>,
}

impl KeyDrift {
    fn between(identifiers: &IdDict, reference: &[ArcStr]) -> Self {
        let unknown = identifiers
            .keys()
            .filter(|key| !reference.contains(key))
            .cloned()
            .collect();
        let missing = reference
            .iter()
            .filter(|key| !identifiers.contains_key(key))
            .cloned()
            .collect();
        Self { unknown, missing }
    }

    pub fn is_empty(&self) -> bool {
        self.unknown.is_empty() && self.missing.is_empty()
    }
}

/// Sorts batches on an attribute whose value is itself a dictionary.
///
/// The batch key is the list of the dictionary's values. Their order is given
/// either by the dictionary's keys sorted in `order_keys_by` direction, or,
/// when a key reference list is configured, by the reference list restricted
/// to the keys that are present. Keys missing from the reference list do not
/// take part in the key at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionarySorter {
    base: SorterBase,
    reverse_keys: bool,
    key_reference_list: Option<Vec<ArcStr>>,
    strict_reference_check: bool,
}

impl DictionarySorter {
    pub fn new(
        name: impl Into<String>,
        orderby: Option<&str>,
        order_keys_by: Option<&str>,
        key_reference_list: Option<Vec<ArcStr>>,
    ) -> Result<Self> {
        let base = SorterBase::new(name, orderby)?;
        let Some(key_order) = SortOrder::parse(order_keys_by) else {
            return Err(Error::IllegalKeySortOrder {
                order_keys_by: order_keys_by.unwrap_or_default().to_string(),
                name: base.name().to_string(),
            });
        };
        Ok(Self {
            base,
            reverse_keys: key_order.is_reversed(),
            key_reference_list,
            strict_reference_check: false,
        })
    }

    /// In strict mode, every batch whose identifiers carry keys unknown to
    /// the key reference list is reported with a warning. Batch keys are
    /// computed the same way in both modes.
    #[must_use]
    pub fn with_strict_reference_check(mut self, strict: bool) -> Self {
        self.strict_reference_check = strict;
        self
    }

    pub fn reverse_keys(&self) -> bool {
        self.reverse_keys
    }

    pub fn key_reference_list(&self) -> Option<&[ArcStr]> {
        self.key_reference_list.as_deref()
    }

    pub fn strict_reference_check(&self) -> bool {
        self.strict_reference_check
    }

    /// Returns `None` if no key reference list is configured.
    pub fn key_drift(&self, batch_definition: &BatchDefinition) -> Result<Option<KeyDrift>> {
        let Some(reference) = &self.key_reference_list else {
            return Ok(None);
        };
        let identifiers = self.identifiers_of(batch_definition)?;
        Ok(Some(KeyDrift::between(identifiers, reference)))
    }

    fn identifiers_of<'a>(&self, batch_definition: &'a BatchDefinition) -> Result<&'a IdDict> {
        let value = batch_definition
            .batch_identifiers()
            .get(self.name())
            .ok_or_else(|| DataError::KeyMissingInBatchIdentifiers(self.name().into()))?;
        Ok(value.as_dict()?)
    }

    fn batch_keys<'a>(&'a self, identifiers: &'a IdDict) -> Vec<&'a ArcStr> {
        if let Some(reference) = &self.key_reference_list {
            if self.strict_reference_check {
                let drift = KeyDrift::between(identifiers, reference);
                if !drift.unknown.is_empty() {
                    warn!(
                        "Keys {:?} of attribute {:?} are not in the key reference list and are ignored when sorting",
                        drift.unknown,
                        self.name()
                    );
                }
            }
            reference
                .iter()
                .filter(|key| identifiers.contains_key(key))
                .collect()
        } else {
            let mut keys: Vec<&ArcStr> = identifiers.keys().collect();
            keys.sort_unstable();
            if self.reverse_keys {
                keys.reverse();
            }
            keys
        }
    }
}

impl Sorter for DictionarySorter {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn reverse(&self) -> bool {
        self.base.reverse()
    }

    fn get_batch_key(&self, batch_definition: &BatchDefinition) -> Result<Vec<Value>> {
        let identifiers = self.identifiers_of(batch_definition)?;
        Ok(self
            .batch_keys(identifiers)
            .into_iter()
            .filter_map(|key| identifiers.get(key))
            .cloned()
            .collect())
    }
}

#[derive(Serialize)]
struct DictionarySorterFields<'a> {
    name: &'a str,
    reverse: bool,
    reverse_keys: bool,
    key_reference_list: Option<&'a [ArcStr]>,
    #[serde(rename = "type")]
    type_: &'static str,
}

impl Display for DictionarySorter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields = DictionarySorterFields {
            name: self.name(),
            reverse: self.reverse(),
            reverse_keys: self.reverse_keys,
            key_reference_list: self.key_reference_list(),
            type_: "DictionarySorter",
        };
        let serialized = serde_json::to_string_pretty(&fields).map_err(|_| fmt::Error)?;
        write!(f, "{serialized}")
    }
}
