//! Cross-project retrieval: validates embedding compatibility across a set
//! of projects, then merges their per-project hybrid rankings with RRF.

mod compat;
mod error;
mod search;

pub use compat::validate_compatible;
pub use error::{MultiProjectError, Result};
pub use search::{CrossProjectResult, LoadProgress, MultiProjectSearch, MultiProjectSearchConfig};
