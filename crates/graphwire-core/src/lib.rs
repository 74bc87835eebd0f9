#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::return_self_not_must_use)]

//! Dispatch of graphwire request trees against live object graphs.
//!
//! A host registers its domain types with a [`StaticRegistry`], then hands
//! every decoded request to a [`Dispatcher`] together with a [`Session`]
//! naming the graph root and the requestor. Event subscriptions made through
//! requests are tracked by the [`FeedbackCache`], which pushes a feedback
//! tree to each subscribed [`Requestor`] whenever the event fires.

pub mod builder;
pub mod command_line;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod feedback;
pub mod registry;
pub mod requestor;
pub mod snapshot;
pub mod version;

pub use builder::{CommandBuilder, GroupCursor, MethodCall};
pub use command_line::tokenize;
pub use config::Config;
pub use dispatch::{Dispatcher, Session};
pub use error::{Error, Result};
pub use feedback::FeedbackCache;
pub use registry::{
    CapabilityRegistry, EventSource, Fault, Instance, StaticRegistry, TypeBuilder, ValueType,
};
pub use requestor::{ChannelRequestor, Requestor};
pub use version::VERSION;
