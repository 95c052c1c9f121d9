//! Schema block arena.
//!
//! A protocol's schema is a tree of blocks, one per study variable. The tree
//! is stored as an arena of nodes addressed by integer [`BlockId`]s; blocks
//! hold child *indices*, not owned subtrees. Protocol files on disk still use
//! the nested form, so serde round-trips through [`NestedBlock`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::schema::{DataType, EndpointTier, RoleTag, Variable};

/// Index of a block within its [`SchemaTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// One schema block: a study variable plus its capture configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaBlock {
    pub id: String,
    pub variable: Variable,
    pub data_type: DataType,
    pub role: RoleTag,
    pub endpoint_tier: Option<EndpointTier>,
    pub unit: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub options: Option<Vec<String>>,
    pub custom_name: Option<String>,
    pub matrix_rows: Option<Vec<String>>,
    pub grid_items: Option<Vec<String>>,
    pub grid_categories: Option<Vec<String>>,
    pub children: Vec<BlockId>,
    pub parent: Option<BlockId>,
}

impl SchemaBlock {
    /// Minimal block for the given variable, inheriting its default type.
    pub fn for_variable(id: impl Into<String>, variable: Variable) -> Self {
        let data_type = variable.default_type;
        let unit = variable.default_unit.clone();
        Self {
            id: id.into(),
            variable,
            data_type,
            role: RoleTag::Predictor,
            endpoint_tier: None,
            unit,
            min_value: None,
            max_value: None,
            options: None,
            custom_name: None,
            matrix_rows: None,
            grid_items: None,
            grid_categories: None,
            children: Vec::new(),
            parent: None,
        }
    }

    /// Display name: the custom name when set, else the variable name.
    pub fn label(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.variable.name)
    }

    pub fn is_section(&self) -> bool {
        self.data_type == DataType::Section
    }
}

/// Arena-backed schema tree with ordered roots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<NestedBlock>", into = "Vec<NestedBlock>")]
pub struct SchemaTree {
    nodes: Vec<SchemaBlock>,
    roots: Vec<BlockId>,
}

impl SchemaTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a root block. Any child ids already on the block are ignored;
    /// children are attached through [`SchemaTree::add_child`].
    pub fn add_root(&mut self, mut block: SchemaBlock) -> BlockId {
        block.children.clear();
        block.parent = None;
        let id = BlockId(self.nodes.len());
        self.nodes.push(block);
        self.roots.push(id);
        id
    }

    /// Append a child block under `parent`, preserving insertion order.
    pub fn add_child(&mut self, parent: BlockId, mut block: SchemaBlock) -> BlockId {
        block.children.clear();
        block.parent = Some(parent);
        let id = BlockId(self.nodes.len());
        self.nodes.push(block);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn get(&self, id: BlockId) -> &SchemaBlock {
        &self.nodes[id.0]
    }

    pub fn roots(&self) -> &[BlockId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first traversal in document order (roots in order, each
    /// followed by its subtree).
    pub fn iter_depth_first(&self) -> DepthFirst<'_> {
        let stack: Vec<BlockId> = self.roots.iter().rev().copied().collect();
        DepthFirst { tree: self, stack }
    }

    /// Depth-first traversal of a single subtree.
    pub fn iter_subtree(&self, root: BlockId) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: vec![root],
        }
    }

    /// First block whose variable id matches, searching depth-first.
    pub fn find_by_variable(&self, variable_id: &str) -> Option<(BlockId, &SchemaBlock)> {
        self.iter_depth_first()
            .find(|(_, block)| block.variable.id == variable_id)
    }

    /// Set of every variable id in the tree.
    pub fn variable_ids(&self) -> BTreeSet<String> {
        self.iter_depth_first()
            .map(|(_, block)| block.variable.id.clone())
            .collect()
    }
}

pub struct DepthFirst<'a> {
    tree: &'a SchemaTree,
    stack: Vec<BlockId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (BlockId, &'a SchemaBlock);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let block = self.tree.get(id);
        self.stack.extend(block.children.iter().rev().copied());
        Some((id, block))
    }
}

/// Wire form of a schema block: children nested inline, as protocol files
/// store them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedBlock {
    pub id: String,
    pub variable: Variable,
    pub data_type: DataType,
    pub role: RoleTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_tier: Option<EndpointTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_rows: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedBlock>,
}

impl NestedBlock {
    fn into_flat(self) -> (SchemaBlock, Vec<NestedBlock>) {
        let block = SchemaBlock {
            id: self.id,
            variable: self.variable,
            data_type: self.data_type,
            role: self.role,
            endpoint_tier: self.endpoint_tier,
            unit: self.unit,
            min_value: self.min_value,
            max_value: self.max_value,
            options: self.options,
            custom_name: self.custom_name,
            matrix_rows: self.matrix_rows,
            grid_items: self.grid_items,
            grid_categories: self.grid_categories,
            children: Vec::new(),
            parent: None,
        };
        (block, self.children)
    }
}

impl From<Vec<NestedBlock>> for SchemaTree {
    fn from(roots: Vec<NestedBlock>) -> Self {
        let mut tree = SchemaTree::new();
        for nested in roots {
            let (block, children) = nested.into_flat();
            let id = tree.add_root(block);
            attach_children(&mut tree, id, children);
        }
        tree
    }
}

fn attach_children(tree: &mut SchemaTree, parent: BlockId, children: Vec<NestedBlock>) {
    for nested in children {
        let (block, grandchildren) = nested.into_flat();
        let id = tree.add_child(parent, block);
        attach_children(tree, id, grandchildren);
    }
}

impl From<SchemaTree> for Vec<NestedBlock> {
    fn from(tree: SchemaTree) -> Self {
        tree.roots
            .iter()
            .map(|&root| nest_block(&tree, root))
            .collect()
    }
}

fn nest_block(tree: &SchemaTree, id: BlockId) -> NestedBlock {
    let block = tree.get(id);
    NestedBlock {
        id: block.id.clone(),
        variable: block.variable.clone(),
        data_type: block.data_type,
        role: block.role,
        endpoint_tier: block.endpoint_tier,
        unit: block.unit.clone(),
        min_value: block.min_value,
        max_value: block.max_value,
        options: block.options.clone(),
        custom_name: block.custom_name.clone(),
        matrix_rows: block.matrix_rows.clone(),
        grid_items: block.grid_items.clone(),
        grid_categories: block.grid_categories.clone(),
        children: block
            .children
            .iter()
            .map(|&child| nest_block(tree, child))
            .collect(),
    }
}
