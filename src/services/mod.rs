//! Service layer separating file and format concerns from the tools

pub mod format;
pub mod io;

pub use format::OutputFormatHandler;
pub use io::ImageIOService;
