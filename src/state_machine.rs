//! Conversion controller state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime feeds [`Event`]s in and executes the returned [`Effect`]s.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{Action, Event};
pub use state::{ControllerContext, ControllerState, ConversionState, Slot};
pub use transition::transition;
