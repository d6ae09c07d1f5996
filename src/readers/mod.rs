pub mod boundary_reader;
pub mod correction_reader;
pub mod system_reader;
pub mod text;

pub use boundary_reader::BoundaryReader;
pub use correction_reader::CorrectionReader;
pub use system_reader::SystemReader;
