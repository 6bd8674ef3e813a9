//! Drop-target resolution for a page builder's layer tree.
//!
//! Given the node being dragged, the collision layer's raw hit and a horizontal shift
//! intent, this crate decides which node becomes the new parent, at which child index, and
//! what indicator to draw. It never mutates the tree; the decision is handed back as a
//! [`ResolvedDropTarget`] or, on commit, a [`DragEndEvent`].

mod capability;
mod config;
mod document;
mod error;
mod expand;
mod geometry;
mod hold;
mod keyboard;
mod path;
mod resolver;
mod session;
mod shift;
mod target;
mod tree;

pub use crate::capability::*;
pub use crate::config::*;
pub use crate::document::*;
pub use crate::error::*;
pub use crate::expand::*;
pub use crate::geometry::*;
pub use crate::hold::*;
pub use crate::keyboard::*;
pub use crate::path::*;
pub use crate::resolver::*;
pub use crate::session::*;
pub use crate::shift::*;
pub use crate::target::*;
pub use crate::tree::*;
