//! Calendar grid computation and date picker state.
//!
//! The grid is a fixed six-week block starting on a Sunday, padded with the
//! tail of the previous month and the head of the next one. The date picker
//! drives navigation and selection over that grid without any rendering
//! concerns.

mod error;
mod grid;
mod month;
mod picker;

pub use error::*;
pub use grid::*;
pub use month::*;
pub use picker::*;
