// Copyright © 2024 Pathway

use std::fmt::Debug;

use log::debug;

use crate::engine::{BatchDefinition, Error, Result, Value};

pub mod config;
pub mod dictionary;

pub use config::{SorterChain, SorterConfig};
pub use dictionary::{DictionarySorter, KeyDrift};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// An absent order means ascending. Unknown orders yield `None` so that
    /// the caller can report them together with the attribute name.
    pub fn parse(order: Option<&str>) -> Option<Self> {
        match order {
            None | Some("asc") => Some(Self::Asc),
            Some("desc") => Some(Self::Desc),
            Some(_) => None,
        }
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Desc)
    }
}

/// The part every sorter shares: the attribute it sorts on and the
/// direction in which batches are ordered relative to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SorterBase {
    name: String,
    order: SortOrder,
}

impl SorterBase {
    pub fn new(name: impl Into<String>, orderby: Option<&str>) -> Result<Self> {
        let name = name.into();
        let Some(order) = SortOrder::parse(orderby) else {
            return Err(Error::IllegalSortOrder {
                orderby: orderby.unwrap_or_default().to_string(),
                name,
            });
        };
        Ok(Self { name, order })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reverse(&self) -> bool {
        self.order.is_reversed()
    }
}

pub trait Sorter: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn reverse(&self) -> bool;

    /// Computes the value batches are compared by. Keys of different
    /// batches are compared lexicographically.
    fn get_batch_key(&self, batch_definition: &BatchDefinition) -> Result<Vec<Value>>;

    /// Stable: batches with equal keys keep their relative order, also
    /// when sorting in descending order.
    fn get_sorted_batch_definitions(
        &self,
        batch_definitions: Vec<BatchDefinition>,
    ) -> Result<Vec<BatchDefinition>> {
        debug!(
            "Sorting {} batch definitions by attribute {:?}, reverse={}",
            batch_definitions.len(),
            self.name(),
            self.reverse()
        );
        let mut keyed = batch_definitions
            .into_iter()
            .map(|batch_definition| {
                let key = verified_batch_key(self, &batch_definition)?;
                Ok((key, batch_definition))
            })
            .collect::<Result<Vec<_>>>()?;
        if self.reverse() {
            keyed.sort_by(|(lhs, _), (rhs, _)| rhs.cmp(lhs));
        } else {
            keyed.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
        }
        Ok(keyed
            .into_iter()
            .map(|(_, batch_definition)| batch_definition)
            .collect())
    }
}

fn verified_batch_key<S: Sorter + ?Sized>(
    sorter: &S,
    batch_definition: &BatchDefinition,
) -> Result<Vec<Value>> {
    match batch_definition.batch_identifiers().get(sorter.name()) {
        None | Some(Value::None) => Err(Error::UnsortableBatch {
            batch_id: batch_definition.id().to_string(),
            name: sorter.name().to_string(),
        }),
        Some(_) => sorter.get_batch_key(batch_definition),
    }
}
