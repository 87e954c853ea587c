pub mod models;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;
