//! Domain layer for TC Kimlik validation
//!
//! Architecture: Domain Model - pure checksum rules and the analysis results built on them
//! - `identity` owns normalization and the two check digit equations
//! - `findings` owns reports, sources and the error taxonomy of the outer layers
//! - Nothing here touches the file system or the terminal

pub mod findings;
pub mod identity;

pub use findings::*;
pub use identity::*;
