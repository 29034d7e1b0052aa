//! Unit tests for the audio path registry and switch.
//! Remote components are replaced by recording mocks; no bus involved.

#![allow(clippy::unwrap_used, clippy::panic)]

mod mock;
mod registry;
