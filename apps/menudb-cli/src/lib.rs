//! Support code for the `menudb` binary.

pub mod catalog;
