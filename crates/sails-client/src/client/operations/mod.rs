//! Client operations
//!
//! - `verbs`: `get`, `post`, `put`, `patch`, `delete` and `request`
//! - `events`: `on`, `once` and `subscribe`

pub mod events;
pub mod verbs;
