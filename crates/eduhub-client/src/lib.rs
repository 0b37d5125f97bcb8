//! Client-side pieces of EduHub that hold state between requests: the
//! offline idea queue with its local store, the toast sink, and the speech
//! playback state machine.

pub mod error;
pub mod offline;
pub mod remote;
pub mod speech;
pub mod store;
pub mod toast;

pub use error::{ClientError, ClientResult};
