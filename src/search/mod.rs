// src/search/mod.rs
//
// Lane-pixel search: histogram seeding, the sliding tracking window, and
// the two search strategies built on them.

pub mod histogram;
pub mod sliding;
pub mod window;

pub use histogram::BottomHalfHistogram;
pub use sliding::{margin_search, search, SearchParams};
pub use window::SlidingWindow;
