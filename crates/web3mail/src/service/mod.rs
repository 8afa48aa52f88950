//! High-level operations exposed through [`crate::Web3Mail`].

pub mod send;

pub use send::{SendEmailParams, SendEmailParamsBuilder};
