//! Travel card applet
//!
//! Command dispatcher, session state and data object routing.

#[allow(clippy::module_inception)]
pub mod applet;
pub mod data_objects;
pub mod session;

pub use applet::TravelCardApplet;
pub use data_objects::{application_related_data, DataObjectRouter};
pub use session::{Session, TagCursor, APDU_MAX_LENGTH, INTERNAL_BUFFER_MAX_LENGTH};
