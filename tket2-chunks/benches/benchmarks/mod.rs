pub mod compile;
pub mod generators;
pub mod solve;
