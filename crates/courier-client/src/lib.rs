//! # courier-client
//!
//! Authenticated-session management for the Courier mail client: the
//! login facade and its supporting pieces: session-token addressing,
//! second-factor polling, the group-key cache, credential persistence,
//! and the REST transport.
//!
//! The facade is an explicit context object owned by the application; it
//! is a cooperative single-writer state machine, so overlapping calls are
//! serialized by the caller rather than by internal locking.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod api;
pub mod error;
pub mod facade;
pub mod group_keys;
pub mod infra;
pub mod second_factor;
pub mod storage;
pub mod token;
pub mod types;

pub use api::{Api, EventBus};
pub use error::LoginError;
pub use facade::{LoginConfig, LoginEvent, LoginFacade, SessionKind};
pub use second_factor::{PollPolicy, SecondFactorPoller};
pub use token::SessionAddress;
pub use types::{Credentials, EntityUpdate, GroupInfo, GroupMembership, User};
