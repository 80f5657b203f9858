#![doc = r"Widget-agnostic building blocks over graft-core: modifier chains, range guards, and row recycling."]

pub mod bind;
pub mod item_factory;
pub mod modifier;

pub use bind::{clamp_position, clamp_selection, clamp_value};
pub use item_factory::{ItemFactory, PooledRow};
pub use modifier::{Modifier, ModifierExt};
