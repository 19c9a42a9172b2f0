//! Answering clarification questions raised mid-discussion.
//!
//! [`ClarificationRelay`] turns `UserInputNeeded` events into requests on a
//! channel; the binary reads them and asks the user with
//! [`InteractiveClarifier`].

mod prompt;
mod relay;

pub use prompt::InteractiveClarifier;
pub use relay::{ClarificationRelay, ClarificationRequest};
