pub use collections::{render_collection, COLLECTION_ITERATOR};
pub use comparators::render_leaf;
pub use multi_select::{render_multi_select, VENDOR_NAMESPACE};

use crate::engine::rendering::collections::RenderableCollection;
use crate::engine::rendering::comparators::RenderableLeaf;
use crate::engine::{CollectionOperator, Combinator, Filter, FilterNode};
use std::fmt::{Display, Formatter};

mod collections;
mod comparators;
mod multi_select;

/// Renders sibling filters joined by their combinators.
///
/// `field_prefix` is put in front of every field name, it is how collection filters qualify
/// fields with their iterator. An empty list renders as an empty string.
pub fn render_group(filters: &[Filter], field_prefix: &str) -> String {
    RenderableGroup {
        filters,
        field_prefix,
    }
    .to_string()
}

struct RenderableGroup<'a> {
    filters: &'a [Filter],
    field_prefix: &'a str,
}

impl Display for RenderableGroup<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some((first, rest)) = self.filters.split_first() {
            // whatever combinator the first filter carries, there is nothing before it
            write!(f, "{}", self.node(first))?;

            for filter in rest {
                write!(f, "{}{}", filter.combinator, self.node(filter))?;
            }
        }

        Ok(())
    }
}

impl<'a> RenderableGroup<'a> {
    fn node(&self, filter: &'a Filter) -> RenderableNode<'a> {
        RenderableNode {
            node: &filter.node,
            field_prefix: self.field_prefix,
        }
    }
}

struct RenderableNode<'a> {
    node: &'a FilterNode,
    field_prefix: &'a str,
}

impl RenderableNode<'_> {
    /// Bare comparisons and groups get parentheses, function calls and raw text do not.
    fn is_self_delimited(&self) -> bool {
        match self.node {
            FilterNode::Raw(_) => true,
            FilterNode::Leaf(leaf) => leaf.comparator.is_self_delimited(),
            FilterNode::Quantified(_) | FilterNode::Group(_) => false,
        }
    }
}

impl Display for RenderableNode<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let wrap = !self.is_self_delimited();
        let field_prefix = self.field_prefix;

        if wrap {
            write!(f, "(")?;
        }

        match self.node {
            FilterNode::Raw(text) => write!(f, "{text}")?,
            FilterNode::Leaf(leaf) => write!(f, "{}", RenderableLeaf { leaf, field_prefix })?,
            // the quantifier brings its own iterator prefix
            FilterNode::Quantified(group) => write!(f, "{}", RenderableCollection(group))?,
            FilterNode::Group(filters) => write!(
                f,
                "{}",
                RenderableGroup {
                    filters,
                    field_prefix
                }
            )?,
        }

        if wrap {
            write!(f, ")")?;
        }

        Ok(())
    }
}

/// The separator in front of a filter, spaces included.
impl Display for Combinator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            Combinator::None => "",
            Combinator::And => " and ",
            Combinator::Or => " or ",
            Combinator::Not => " not ",
            Combinator::AndNot => " and not ",
            Combinator::OrNot => " or not ",
        };

        write!(f, "{token}")
    }
}

impl Display for CollectionOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionOperator::Any => write!(f, "any"),
            CollectionOperator::All => write!(f, "all"),
        }
    }
}
