//! Production implementations of the external collaborator contracts.

pub mod rest;

pub use rest::RestApi;
