//! Kiosk side of Rollcall.
//!
//! A [`session::KioskSession`] drives a camera through the
//! [`sampler::Sampler`], matches faces against a roster snapshot
//! ([`matcher::FaceMatcher`]), debounces the resulting stream
//! ([`debounce::Debouncer`]) and reports attendance intents to the server
//! through a [`report::Reporter`].

pub mod camera;
pub mod client;
pub mod debounce;
pub mod error;
pub mod matcher;
pub mod notify;
pub mod replay;
pub mod report;
pub mod sampler;
pub mod session;

pub use error::{Error, Result};
