pub mod colormap;
pub mod constants;
pub mod dates;
pub mod filename;
pub mod progress;

pub use colormap::Colormap;
pub use constants::*;
pub use dates::{month_range, month_start, parse_commissioned};
pub use filename::generate_default_output_dir;
pub use progress::ProgressReporter;
