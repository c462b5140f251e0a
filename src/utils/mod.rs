pub mod coordinate;
pub mod image;
pub mod logging;
pub mod utils;
