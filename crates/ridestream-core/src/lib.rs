//! # ridestream-core
//!
//! Foundation types, errors, branded IDs, and logging for the ridestream
//! notification client.
//!
//! This crate provides the shared vocabulary the other ridestream crates
//! depend on:
//!
//! - **IDs**: [`ConnectionId`] (UUID v7) and the sequence-based [`NotificationId`]
//! - **Notifications**: [`Notification`], [`Severity`] and the ordered [`NotificationList`]
//! - **Identity**: [`Principal`], [`BearerToken`] and the combined [`Identity`]
//! - **Signals**: [`StreamSignal`], the tagged union every push transport emits
//! - **Errors**: decode/transport/endpoint errors via `thiserror`
//! - **Logging**: [`logging::init_subscriber`] for binaries and test harnesses

#![deny(unsafe_code)]

pub mod errors;
pub mod identity;
pub mod ids;
pub mod logging;
pub mod notification;
pub mod signal;
pub mod text;

pub use errors::{DecodeError, EndpointError, StreamError, TransportError};
pub use identity::{BearerToken, Identity, Principal};
pub use ids::{ConnectionId, NotificationId};
pub use notification::{DEFAULT_MESSAGE, Notification, NotificationList, Severity};
pub use signal::StreamSignal;
