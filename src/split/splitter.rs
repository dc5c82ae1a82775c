//! Group splitting
//!
//! Turns the top level of a [`LayerTree`] into named units, one per
//! top-level node, or one per child of a marker-prefixed ("animation")
//! group when expansion is enabled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::naming::unit_name;
use super::tree::{LayerTree, NodeId};
use crate::file::psd::LayerRecord;

/// Which end of a unit's record run gets its visibility forced on
///
/// Runs are in storage order, so `Last` is the folder header of a group (the
/// group itself) and `First` is its bottom-most record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VisibleTarget {
    First,
    #[default]
    Last,
}

/// What to do with units that contain no content layers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyUnitPolicy {
    #[default]
    Suppress,
    Emit,
}

/// Split settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Emit the children of marker-prefixed top-level groups as separate units
    pub expand_marker_groups: bool,
    pub marker_prefix: String,
    /// Force one record of every unit visible
    pub force_visible_root: bool,
    pub visible_target: VisibleTarget,
    pub empty_units: EmptyUnitPolicy,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            expand_marker_groups: false,
            marker_prefix: "@".to_string(),
            force_visible_root: false,
            visible_target: VisibleTarget::default(),
            empty_units: EmptyUnitPolicy::default(),
        }
    }
}

/// One output document worth of layers
#[derive(Debug, Clone)]
pub struct SplitUnit {
    pub name: String,
    /// Records in storage order, ready to be written as a layer list
    pub layers: Vec<Arc<LayerRecord>>,
    /// Content (non-marker) records among `layers`
    pub normal_layers: usize,
}

/// Split the tree's top level into units, in tree order
pub fn split_tree(tree: &LayerTree, options: &SplitOptions) -> Vec<SplitUnit> {
    let mut units = Vec::new();

    for (index, &top) in tree.children(tree.root()).iter().enumerate() {
        let node = tree.node(top);
        let expand = options.expand_marker_groups
            && node.is_group()
            && node.name.starts_with(&options.marker_prefix);

        if expand {
            tracing::debug!("Expanding marker group '{}'", node.name);
            for &child in tree.children(top) {
                // The group's own divider/header bracket the children
                if tree.node(child).is_marker() {
                    continue;
                }
                let path = tree.path(child);
                let name = unit_name(index, &path[1..]);
                push_unit(&mut units, tree, child, name, options);
            }
        } else {
            let name = unit_name(index, &tree.path(top));
            push_unit(&mut units, tree, top, name, options);
        }
    }

    units
}

fn push_unit(
    units: &mut Vec<SplitUnit>,
    tree: &LayerTree,
    node: NodeId,
    name: String,
    options: &SplitOptions,
) {
    let normal_layers = tree.normal_layer_count(node);
    if normal_layers == 0 && options.empty_units == EmptyUnitPolicy::Suppress {
        tracing::debug!("Skipping unit '{}': no content layers", name);
        return;
    }

    let mut layers = tree.layers(node);
    if options.force_visible_root {
        force_visible(&mut layers, options.visible_target);
    }

    tracing::debug!("Unit '{}': {} records", name, layers.len());
    units.push(SplitUnit {
        name,
        layers,
        normal_layers,
    });
}

/// Make the target record visible in this unit only
///
/// The shared source record is left alone; the unit gets its own copy with
/// the flag set. Channel payloads are reference-counted, so the copy is
/// shallow.
fn force_visible(layers: &mut [Arc<LayerRecord>], target: VisibleTarget) {
    let slot = match target {
        VisibleTarget::First => layers.first_mut(),
        VisibleTarget::Last => layers.last_mut(),
    };
    if let Some(record) = slot {
        if !record.visible() {
            let mut copy = LayerRecord::clone(record);
            copy.flags.visible = true;
            *record = Arc::new(copy);
        }
    }
}
