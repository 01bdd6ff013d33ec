//! A forest threaded onto the Euler tour of its nodes.
//!
//! Every node owns an entry and an exit marker. The markers of all nodes, the
//! header included, form one circular doubly linked list in which the markers
//! of a node enclose the markers of its descendants. The header is the
//! outermost node: its entry marker is the end of the pre-order and its exit
//! marker is the end of the post-order, and both are one step away from the
//! first and last nodes of either order.
mod iter;
mod linked;
mod node;
mod traverse;
mod validate;

pub use iter::{Cursors, Iter, PostOrder};
pub use linked::{ForestError, LinkedForest};
pub use node::Marker;
pub use traverse::{Cursor, Order};
pub use validate::ValidationError;
