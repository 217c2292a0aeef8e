pub mod attributes;
pub mod module;
pub mod scoring;
pub mod solution;
pub mod errors;

pub use attributes::*;
pub use module::*;
pub use scoring::*;
pub use solution::*;
pub use errors::*;
