//! Walk one override tree for one combination.
//!
//! Dimensions are consumed in hierarchy order. At every step the current node
//! is checked for a terminal *before* the combination is consulted, so a value
//! placed high in the tree settles the field without the remaining dimensions
//! being looked at, or even present in the combination.
//!
//! Pure function of `(tree, dimensions, combination)`: no I/O, no mutation.

use crate::error::ResolveError;
use crate::hierarchy::Combination;
use crate::tree::OverrideNode;

/// Resolve the raw text of a field for `combination`.
pub fn resolve<'t>(
    tree: &'t OverrideNode,
    dimensions: &[String],
    combination: &Combination,
) -> Result<&'t str, ResolveError> {
    let mut node = tree;

    for dim in dimensions {
        let children = match node {
            OverrideNode::Terminal(value) => return Ok(value.as_str()),
            OverrideNode::Branch(children) => children,
        };

        let value = combination
            .get(dim)
            .ok_or_else(|| ResolveError::MissingCombinationKey(dim.clone()))?;

        node = children
            .get(value)
            .ok_or_else(|| ResolveError::UnresolvedOverridePath {
                dimension: dim.clone(),
                value: value.to_string(),
            })?;
    }

    match node {
        OverrideNode::Terminal(value) => Ok(value.as_str()),
        OverrideNode::Branch(_) => Err(ResolveError::MissingTerminalValue),
    }
}
