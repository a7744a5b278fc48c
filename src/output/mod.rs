//! Terminal output: color palette, live progress block and final report.

pub mod live;
pub mod report;
pub mod theme;

pub use live::LiveProgress;
pub use report::print_final_report;
pub use theme::{Palette, Tier};
