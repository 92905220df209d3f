pub use board::*;
pub use cell::*;
pub use error::*;
pub use generator::*;
pub use level::*;
pub use scores::*;
pub use session::*;
pub use snapshot::*;
pub use types::*;

mod board;
mod cascade;
mod cell;
mod error;
mod generator;
mod level;
mod scores;
mod session;
mod snapshot;
mod types;
