//! CT scan/label 切片对象的操作.

mod core;
mod iter;

pub use core::{LabelSlice, ScanSlice};

pub use iter::PosIter;
