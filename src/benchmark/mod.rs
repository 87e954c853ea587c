pub mod builder;

pub use builder::{benchmark_for, build_benchmarks, BenchmarkMap};
