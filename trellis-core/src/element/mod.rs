//! Declarative Element Construction
//!
//! An [`ElementDescriptor`] says what to build: a native node of some toolkit
//! type, or a function component. [`build`] (or [`Scope::build`]) turns it
//! into a [`NodeId`](crate::host::NodeId), wiring props to signals, effects and
//! event listeners along the way.
//!
//! There is no diffing. When a subtree has to change shape, its owner
//! disposes the component scope and builds it again.
//!
//! [`Scope::build`]: crate::scope::Scope::build

mod builder;
mod descriptor;

pub use builder::build;
pub use descriptor::{Children, Component, ElementDescriptor, Producer, PropValue, Props};
