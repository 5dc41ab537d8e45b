mod characters;
mod config;
mod flavors;
mod overwrite;

pub use characters::*;
pub use config::*;
pub use flavors::*;
pub use overwrite::*;
