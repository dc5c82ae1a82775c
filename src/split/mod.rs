//! Layer tree reconstruction and group splitting
//!
//! ```ignore
//! use psd_splitter::split::{assemble, split_tree, LayerTree, SplitOptions};
//!
//! let tree = LayerTree::build(&doc.layers)?;
//! for unit in split_tree(&tree, &SplitOptions::default()) {
//!     let out = assemble(&doc.canvas, &unit.layers)?;
//!     // save `out` as `{stem}-{unit.name}.psd`
//! }
//! ```

pub mod assemble;
pub mod error;
pub mod naming;
pub mod section;
pub mod splitter;
pub mod tree;

pub use assemble::assemble;
pub use error::{AssembleError, StructureError};
pub use section::{classify, SectionKind};
pub use splitter::{split_tree, EmptyUnitPolicy, SplitOptions, SplitUnit, VisibleTarget};
pub use tree::{LayerNode, LayerTree, NodeId, NodeKind};
