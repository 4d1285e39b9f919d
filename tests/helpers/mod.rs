#![allow(dead_code)]

pub mod builders;
pub mod engines;

pub use builders::*;
pub use engines::*;
