pub mod bus;
pub mod types;

pub use types::{AdminEvent, DocumentSaved, SaveFailed, SaveStarted};
