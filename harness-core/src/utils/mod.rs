pub mod errors;
pub mod profiling;
