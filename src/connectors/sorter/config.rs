// Copyright © 2024 Pathway

#![allow(clippy::module_name_repetitions)]

use arcstr::ArcStr;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{DictionarySorter, Sorter};
use crate::engine::{BatchDefinition, Error, Result};

/// Sorter settings as they appear in a data connector configuration,
/// e.g. `{"class_name": "DictionarySorter", "name": "date", "orderby": "desc"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum SorterConfig {
    DictionarySorter {
        name: String,
        #[serde(default)]
        orderby: Option<String>,
        #[serde(default)]
        order_keys_by: Option<String>,
        #[serde(default)]
        key_reference_list: Option<Vec<String>>,
    },
}

impl SorterConfig {
    pub fn from_json(config: &JsonValue) -> Result<Self> {
        Self::deserialize(config).map_err(Error::IncorrectSorterConfig)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::DictionarySorter { name, .. } => name,
        }
    }

    pub fn build(&self) -> Result<Box<dyn Sorter>> {
        match self {
            Self::DictionarySorter {
                name,
                orderby,
                order_keys_by,
                key_reference_list,
            } => {
                let key_reference_list = key_reference_list
                    .as_ref()
                    .map(|keys| keys.iter().map(|key| ArcStr::from(key.as_str())).collect());
                let sorter = DictionarySorter::new(
                    name.as_str(),
                    orderby.as_deref(),
                    order_keys_by.as_deref(),
                    key_reference_list,
                )?;
                Ok(Box::new(sorter))
            }
        }
    }
}

/// The sorters of a data connector, in configuration order.
///
/// The first sorter gives the primary ordering; each following one only
/// orders batches the previous ones consider equal.
#[derive(Debug, Default)]
pub struct SorterChain {
    sorters: IndexMap<String, Box<dyn Sorter>>,
}

impl SorterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[JsonValue]) -> Result<Self> {
        let mut chain = Self::new();
        for config in configs {
            let sorter = SorterConfig::from_json(config)?.build()?;
            chain.push(sorter);
        }
        Ok(chain)
    }

    /// A sorter with an already known name replaces the previous one but
    /// keeps its position in the chain.
    pub fn push(&mut self, sorter: Box<dyn Sorter>) {
        let name = sorter.name().to_string();
        if let Some(previous) = self.sorters.insert(name, sorter) {
            debug!("Sorter for attribute {:?} replaced", previous.name());
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Sorter> {
        self.sorters.get(name).map(|sorter| &**sorter)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sorters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sorters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorters.is_empty()
    }

    /// Every sorter has to sort on one of the group names the data connector
    /// extracts from its data references.
    pub fn validate_group_names(&self, group_names: &[&str]) -> Result<()> {
        let unknown: Vec<String> = self
            .names()
            .filter(|name| !group_names.contains(name))
            .map(ToString::to_string)
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(Error::UnknownSortKeys(unknown))
        }
    }

    pub fn sort(&self, batch_definitions: Vec<BatchDefinition>) -> Result<Vec<BatchDefinition>> {
        self.sorters
            .values()
            .rev()
            .try_fold(batch_definitions, |batch_definitions, sorter| {
                sorter.get_sorted_batch_definitions(batch_definitions)
            })
    }
}
