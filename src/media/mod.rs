pub mod fs;
pub mod mime;
