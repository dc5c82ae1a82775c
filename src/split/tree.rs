//! Layer tree reconstruction
//!
//! A PSD stores its layers bottom-most first, and a group appears as
//! `[divider, contents..., folder header]`. [`LayerTree::build`] walks that
//! sequence with an explicit stack of open groups and produces a tree whose
//! depth-first order is the storage order again.
//!
//! Nodes live in an arena owned by the tree; parents are referenced by
//! [`NodeId`] only.

use std::sync::Arc;

use super::error::StructureError;
use super::section::{classify, SectionKind};
use crate::file::psd::LayerRecord;

/// Handle of a node inside a [`LayerTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A record from the document, markers included
    Layer(Arc<LayerRecord>),
    /// A group reconstructed from a divider/folder pair
    Group,
}

#[derive(Debug, Clone)]
pub struct LayerNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl LayerNode {
    pub fn record(&self) -> Option<&Arc<LayerRecord>> {
        match &self.kind {
            NodeKind::Layer(record) => Some(record),
            NodeKind::Group => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }

    /// Section role of the node's record; groups report `None`
    pub fn section(&self) -> Option<SectionKind> {
        self.record().map(|record| classify(record))
    }

    /// Divider or folder-header record bracketing a group
    pub fn is_marker(&self) -> bool {
        self.section().is_some_and(SectionKind::is_marker)
    }
}

/// One open group on the build stack
struct OpenGroup {
    node: NodeId,
    /// Record index of the divider that opened it
    opened_at: usize,
}

#[derive(Debug, Clone)]
pub struct LayerTree {
    nodes: Vec<LayerNode>,
}

impl LayerTree {
    /// Rebuild the folder hierarchy from records in storage order
    ///
    /// A divider opens a group, the next folder header at the same level
    /// names and closes it. Both marker records stay in the group as its first
    /// and last child so flattening a group yields a self-contained, correctly
    /// bracketed record run.
    ///
    /// The folder header is therefore not consumed as metadata only: besides
    /// naming the group it is a concrete leaf, and it is the record counted by
    /// [`LayerTree::layers`] and written back as the group's header.
    pub fn build(records: &[Arc<LayerRecord>]) -> Result<Self, StructureError> {
        let mut tree = LayerTree {
            nodes: vec![LayerNode {
                name: String::new(),
                kind: NodeKind::Group,
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut open: Vec<OpenGroup> = Vec::new();

        for (position, record) in records.iter().enumerate() {
            let current = open.last().map_or(tree.root(), |group| group.node);

            match classify(record) {
                SectionKind::Normal => {
                    tree.push_layer(current, record);
                }
                SectionKind::SectionDivider => {
                    let group = tree.push(current, String::new(), NodeKind::Group);
                    tree.push_layer(group, record);
                    open.push(OpenGroup {
                        node: group,
                        opened_at: position,
                    });
                }
                SectionKind::FolderOpen | SectionKind::FolderClose => {
                    let Some(group) = open.pop() else {
                        return Err(StructureError::UnmatchedFolderMarker {
                            position,
                            name: record.name.clone(),
                        });
                    };
                    tree.push_layer(group.node, record);
                    tree.nodes[group.node.0].name = record.name.clone();
                }
            }
        }

        if let Some(group) = open.pop() {
            return Err(StructureError::UnclosedGroup {
                position: group.opened_at,
                depth: open.len() + 1,
            });
        }

        tracing::debug!(
            "Built layer tree: {} nodes, {} top-level",
            tree.node_count(),
            tree.children(tree.root()).len()
        );

        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &LayerNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document had no records at all
    pub fn is_empty(&self) -> bool {
        self.children(self.root()).is_empty()
    }

    /// Distance from the root (root = 0)
    pub fn depth(&self, id: NodeId) -> usize {
        std::iter::successors(self.parent(id), |&p| self.parent(p)).count()
    }

    /// Names from the root's child down to `id`; empty for the root
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut names: Vec<&str> = std::iter::successors(Some(id), |&n| self.parent(n))
            .filter(|&n| n != self.root())
            .map(|n| self.node(n).name.as_str())
            .collect();
        names.reverse();
        names
    }

    /// Depth-first, pre-order walk of the subtree at `id` (including `id`)
    pub fn flatten(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        order
    }

    /// Records of the subtree at `id` in storage order, groups skipped
    pub fn layers(&self, id: NodeId) -> Vec<Arc<LayerRecord>> {
        self.flatten(id)
            .into_iter()
            .filter_map(|n| self.node(n).record().cloned())
            .collect()
    }

    /// Number of content (non-marker) records in the subtree at `id`
    pub fn normal_layer_count(&self, id: NodeId) -> usize {
        self.flatten(id)
            .into_iter()
            .filter(|&n| self.node(n).section() == Some(SectionKind::Normal))
            .count()
    }

    fn push(&mut self, parent: NodeId, name: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(LayerNode {
            name,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_layer(&mut self, parent: NodeId, record: &Arc<LayerRecord>) -> NodeId {
        self.push(
            parent,
            record.name.clone(),
            NodeKind::Layer(Arc::clone(record)),
        )
    }
}
