pub mod analysis;
pub mod assemble;
pub mod error;
pub mod ir;
pub mod output;
pub mod parser;
pub mod stats;
