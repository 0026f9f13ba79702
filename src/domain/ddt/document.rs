//! Root DDT document.

use serde::{Deserialize, Serialize};

use super::node::DataNode;
use crate::domain::foundation::{DdtId, NodeId};
use crate::domain::translation::TranslationTable;

/// A Dialogue Data Template: one composite datum and its dialogue behavior.
///
/// Built by the assembler and treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ddt {
    pub id: DdtId,
    pub label: String,
    pub main_data: DataNode,
    pub translations: TranslationTable,
}

impl Ddt {
    /// Id of the root node.
    pub fn root_id(&self) -> NodeId {
        NodeId::root(&self.main_data.variable)
    }

    /// Looks a node up by its path id.
    pub fn node(&self, id: &NodeId) -> Option<&DataNode> {
        let mut segments = id.as_str().split('/');
        if segments.next()? != self.main_data.variable {
            return None;
        }
        segments.try_fold(&self.main_data, |node, variable| node.sub_node(variable))
    }
}
