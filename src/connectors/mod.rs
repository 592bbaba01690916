// Copyright © 2024 Pathway

pub mod sorter;
pub use sorter::{DictionarySorter, Sorter, SorterChain, SorterConfig};
