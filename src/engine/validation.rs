use crate::engine::{
    Combinator, CompileOptions, Comparator, Filter, FilterNode, Leaf, QuantifiedGroup,
};
use log::warn;
use thiserror::Error;

/// Everything that can make a filter tree unfit for compilation.
///
/// All of these are raised before rendering starts; a tree that passes [`validate`] always
/// renders.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid filter shape: {0}")]
    InvalidFilterShape(String),
    #[error("A filter is missing its field name")]
    MissingFieldName,
    #[error("The {comparator} filter on '{field}' has no value")]
    MissingComparatorValue {
        field: String,
        comparator: Comparator,
    },
    #[error("The multi-select filter on '{field}' has no values")]
    EmptyMultiSelectValues { field: String },
    #[error("Unknown comparator '{0}'")]
    UnknownComparator(String),
    #[error("Unknown combinator '{0}'")]
    InvalidCombinator(String),
    #[error("Unknown collection operator '{0}', expected 'any' or 'all'")]
    InvalidCollectionOperator(String),
    #[error("The collection filter on '{field}' has no conditions")]
    EmptyQuantifiedGroup { field: String },
    #[error("A filter group has no conditions")]
    EmptyGroup,
    #[error(
        "The collection filter on '{inner}' is nested inside the one on '{outer}', \
        only one level of any/all is supported"
    )]
    NestedQuantifier { outer: String, inner: String },
}

/// Checks a filter tree before it is rendered.
pub fn validate(filters: &[Filter], options: &CompileOptions) -> Result<(), FilterError> {
    Validator {
        options,
        enclosing_collection: None,
    }
    .check_group(filters)
}

struct Validator<'a> {
    options: &'a CompileOptions,
    /// Field of the quantified group we are in, if any.
    enclosing_collection: Option<&'a str>,
}

impl<'a> Validator<'a> {
    fn check_group(&self, filters: &'a [Filter]) -> Result<(), FilterError> {
        for (index, filter) in filters.iter().enumerate() {
            if index > 0 && filter.combinator == Combinator::None {
                warn!(
                    "Filter #{index} in its group has no combinator, \
                    it will be rendered right after the previous one"
                );
            }

            match &filter.node {
                FilterNode::Raw(text) if text.is_empty() => {
                    return Err(FilterError::InvalidFilterShape(
                        "a raw filter cannot be empty".to_string(),
                    ))
                }
                FilterNode::Raw(_) => {}
                FilterNode::Leaf(leaf) => self.check_leaf(leaf)?,
                FilterNode::Quantified(group) => self.check_collection(group)?,
                // `()` is not a valid expression
                FilterNode::Group(children) if children.is_empty() => {
                    return Err(FilterError::EmptyGroup)
                }
                FilterNode::Group(children) => self.check_group(children)?,
            }
        }

        Ok(())
    }

    fn check_leaf(&self, leaf: &Leaf) -> Result<(), FilterError> {
        if leaf.field.is_empty() {
            return Err(FilterError::MissingFieldName);
        }

        if leaf.comparator.is_multi_select() && leaf.multi_select_values.is_empty() {
            if self.options.reject_empty_multi_select {
                return Err(FilterError::EmptyMultiSelectValues {
                    field: leaf.field.clone(),
                });
            }

            warn!(
                "The {} filter on '{}' has no values, it will match everything or nothing",
                leaf.comparator, leaf.field
            );
        }

        if leaf.comparator.requires_value() && leaf.value.is_empty() {
            return Err(FilterError::MissingComparatorValue {
                field: leaf.field.clone(),
                comparator: leaf.comparator,
            });
        }

        Ok(())
    }

    fn check_collection(&self, group: &'a QuantifiedGroup) -> Result<(), FilterError> {
        if let Some(outer) = self.enclosing_collection {
            return Err(FilterError::NestedQuantifier {
                outer: outer.to_string(),
                inner: group.field.clone(),
            });
        }

        if group.field.is_empty() {
            return Err(FilterError::MissingFieldName);
        }

        if group.children.is_empty() {
            return Err(FilterError::EmptyQuantifiedGroup {
                field: group.field.clone(),
            });
        }

        Validator {
            options: self.options,
            enclosing_collection: Some(group.field.as_str()),
        }
        .check_group(&group.children)
    }
}
