#![doc = include_str!("../README.md")]

mod batch;
mod compact;
mod dispatch;
mod error;
mod geojson;
mod index;
mod normalize;

pub use crate::batch::*;
pub use crate::compact::*;
pub use crate::dispatch::*;
pub use crate::error::*;
pub use crate::geojson::*;
pub use crate::index::*;
pub use crate::normalize::*;
// Public re-export so downstream crates can name `CellIndex` and `Resolution`
// via `hexcover::h3o`
pub use h3o;
