//! External generation collaborators.
//!
//! The studio core talks to the generative service through the narrow
//! contracts in [`contract`]; [`gemini`] is the production client for
//! them. Bounded retry with linear backoff lives in [`retry`] and is
//! applied inside the client, invisibly to callers: they see one eventual
//! success or one terminal failure.

pub mod contract;
pub mod error;
pub mod gemini;
pub mod key;
pub mod retry;
