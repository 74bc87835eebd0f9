#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! Info Tree data model and wire codec for graphwire.
//!
//! A request or response is one [`ClassInfo`] tree: the addressed object,
//! the members requested on it and, through nodes and node groups, nested
//! objects at arbitrary depth. Dispatch writes an [`InfoResult`] into every
//! node it touches, so the response mirrors the request's shape.
//!
//! ## Wire format
//! One JSON object shaped as a [`ClassInfo`]; see [`codec`]. Framing and
//! session handling belong to the transport.

pub mod codec;
pub mod info;
pub mod normalize;
pub mod path;
pub mod result;

pub use codec::{decode, encode, CodecError};
pub use info::{
    ClassInfo, EventInfo, InfoHeader, InfoKind, InfoNode, InfoRef, MethodInfo, NodeGroupInfo,
    NodeInfo, ParameterInfo, PropertyInfo, SubscribeAction, TreeError,
};
pub use path::PathStep;
pub use result::{ErrorCode, InfoResult, ResultValue};
