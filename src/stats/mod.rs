pub mod distribution;

pub use distribution::{mean, median, percentile, percentile_rank};
