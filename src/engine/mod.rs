// Copyright © 2024 Pathway

pub mod error;
pub use self::error::{DataError, Error, Result};

pub mod value;
pub use self::value::{Key, KeyImpl, Value};

pub mod batch;
pub use self::batch::{BatchDefinition, IdDict};
