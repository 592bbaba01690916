// Copyright © 2024 Pathway

use std::result;

use arcstr::ArcStr;
use serde_json::Error as JsonError;

use super::Value;

/// Problems with the data a sorter is applied to, as opposed to problems
/// with how the sorter itself was configured.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DataError {
    #[error("type mismatch: expected {expected}, got {value}")]
    TypeMismatch {
        expected: &'static str,
        value: Value,
    },

    #[error("key missing in batch identifiers: {0:?}")]
    KeyMissingInBatchIdentifiers(ArcStr),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Illegal sort order \"{orderby}\" for attribute \"{name}\".")]
    IllegalSortOrder { orderby: String, name: String },

    #[error("Illegal key sort order \"{order_keys_by}\" for attribute \"{name}\".")]
    IllegalKeySortOrder { order_keys_by: String, name: String },

    #[error("Unable to sort batch definition {batch_id} by attribute \"{name}\".")]
    UnsortableBatch { batch_id: String, name: String },

    #[error("sorter config is incorrect: {0}")]
    IncorrectSorterConfig(#[source] JsonError),

    #[error("sort keys {0:?} do not appear among configured group names")]
    UnknownSortKeys(Vec<String>),

    #[error(transparent)]
    Data(#[from] DataError),
}

pub type Result<T, E = Error> = result::Result<T, E>;
