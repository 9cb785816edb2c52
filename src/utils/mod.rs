// file: src/utils/mod.rs
// description: utility functions module exports

pub mod logging;
