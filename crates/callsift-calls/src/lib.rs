//! callsift calls - selector chains and call classification
//!
//! Built on the Type Oracle from `callsift-types`: [`decompose`] turns a
//! dotted access into an ordered chain of hops and [`classify`] assigns each
//! call expression one [`CallKind`].

pub mod chain;
mod classify;
mod diagnostics;
mod funcref;

pub use chain::{decompose, ChainRoot, Hop, MemberKind, RootKind, SelectorChain};
pub use classify::*;
pub use diagnostics::*;
pub use funcref::*;
