//! Compiles a tree of filters into an OData `$filter` expression.
//!
//! The tree is built by the caller (or converted from its loose JSON form, see [`LooseFilter`]),
//! checked once by [`validate`], and then rendered. Rendering never fails and never touches the
//! tree: the field prefix used inside collection filters is passed down as a parameter.
mod encoding;
mod loose;
mod rendering;
mod validation;


pub use encoding::{decode_value, encode_value, field_ref, EncodedValue, FieldRef};
pub use loose::LooseFilter;
pub use rendering::{
    render_collection, render_group, render_leaf, render_multi_select, COLLECTION_ITERATOR,
    VENDOR_NAMESPACE,
};
pub use validation::{validate, FilterError};

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Validates, then renders a list of filters into the value of a `$filter` clause.
///
/// An empty list compiles to an empty string.
pub fn compile_filter(filters: &[Filter], options: &CompileOptions) -> Result<String, FilterError> {
    validate(filters, options)?;

    let compiled = render_group(filters, "");
    debug!("Compiled {} filter(s) into: {compiled}", filters.len());

    Ok(compiled)
}

/// Knobs for the few places where the old output and a strict compiler disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Render unknown comparator names as `contains(...)` instead of rejecting them.
    pub legacy_contains_fallback: bool,
    /// Reject multi-select filters without values instead of only warning about them.
    pub reject_empty_multi_select: bool,
}

/// A node of the filter tree, together with how it attaches to the sibling before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Ignored for the first filter of every list.
    pub combinator: Combinator,
    pub node: FilterNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    /// Already valid filter text, used verbatim.
    Raw(String),
    Leaf(Leaf),
    /// `field/any(i: ...)` or `field/all(i: ...)` over a collection-valued navigation property.
    Quantified(QuantifiedGroup),
    /// Parenthesized list of filters.
    Group(Vec<Filter>),
}

/// A single `field comparator value` condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaf {
    pub field: String,
    pub comparator: Comparator,
    pub value: String,
    pub case_insensitive: bool,
    /// Only read by the multi-select comparators. Order is kept in the output.
    pub multi_select_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantifiedGroup {
    /// The navigation property the quantifier ranges over.
    pub field: String,
    pub operator: CollectionOperator,
    pub children: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Combinator {
    #[default]
    None,
    And,
    Or,
    Not,
    AndNot,
    OrNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionOperator {
    Any,
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Comparator {
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    NumericEquals,
    NumericNotEquals,
    DateTimeEquals,
    DateTimeNotEquals,
    StringEquals,
    StringNotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    IsNull,
    IsNotNull,
    MultiSelectContains,
    MultiSelectDoesNotContain,
}

impl Comparator {
    pub const ALL: [Comparator; 17] = [
        Comparator::Contains,
        Comparator::StartsWith,
        Comparator::EndsWith,
        Comparator::NumericEquals,
        Comparator::NumericNotEquals,
        Comparator::DateTimeEquals,
        Comparator::DateTimeNotEquals,
        Comparator::StringEquals,
        Comparator::StringNotEquals,
        Comparator::GreaterThan,
        Comparator::GreaterThanOrEqual,
        Comparator::LessThan,
        Comparator::LessThanOrEqual,
        Comparator::IsNull,
        Comparator::IsNotNull,
        Comparator::MultiSelectContains,
        Comparator::MultiSelectDoesNotContain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Comparator::Contains => "Contains",
            Comparator::StartsWith => "StartsWith",
            Comparator::EndsWith => "EndsWith",
            Comparator::NumericEquals => "NumericEquals",
            Comparator::NumericNotEquals => "NumericNotEquals",
            Comparator::DateTimeEquals => "DateTimeEquals",
            Comparator::DateTimeNotEquals => "DateTimeNotEquals",
            Comparator::StringEquals => "StringEquals",
            Comparator::StringNotEquals => "StringNotEquals",
            Comparator::GreaterThan => "GreaterThan",
            Comparator::GreaterThanOrEqual => "GreaterThanOrEqual",
            Comparator::LessThan => "LessThan",
            Comparator::LessThanOrEqual => "LessThanOrEqual",
            Comparator::IsNull => "IsNull",
            Comparator::IsNotNull => "IsNotNull",
            Comparator::MultiSelectContains => "MultiSelectContains",
            Comparator::MultiSelectDoesNotContain => "MultiSelectDoesNotContain",
        }
    }

    /// Matches names like `StartsWith`, `starts_with` or `starts-with`.
    pub fn from_name(name: &str) -> Option<Comparator> {
        let wanted = normalize_name(name);

        Comparator::ALL
            .into_iter()
            .find(|comparator| normalize_name(comparator.name()) == wanted)
    }

    /// Function calls render complete on their own and are never wrapped in parentheses.
    pub fn is_self_delimited(self) -> bool {
        matches!(
            self,
            Comparator::Contains
                | Comparator::StartsWith
                | Comparator::EndsWith
                | Comparator::MultiSelectContains
                | Comparator::MultiSelectDoesNotContain
        )
    }

    pub fn is_multi_select(self) -> bool {
        matches!(
            self,
            Comparator::MultiSelectContains | Comparator::MultiSelectDoesNotContain
        )
    }

    /// Whether rendering reads [`Leaf::value`].
    pub fn requires_value(self) -> bool {
        !self.is_multi_select() && !matches!(self, Comparator::IsNull | Comparator::IsNotNull)
    }
}

impl Display for Comparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Combinator {
    pub fn from_name(name: &str) -> Option<Combinator> {
        let combinator = match normalize_name(name).as_str() {
            "" | "none" => Combinator::None,
            "and" => Combinator::And,
            "or" => Combinator::Or,
            "not" => Combinator::Not,
            "andnot" => Combinator::AndNot,
            "ornot" => Combinator::OrNot,
            _ => return None,
        };

        Some(combinator)
    }
}

impl CollectionOperator {
    pub fn from_name(name: &str) -> Option<CollectionOperator> {
        match normalize_name(name).as_str() {
            "any" => Some(CollectionOperator::Any),
            "all" => Some(CollectionOperator::All),
            _ => None,
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|character| !matches!(character, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl Filter {
    pub fn new(node: FilterNode) -> Self {
        Filter {
            combinator: Combinator::None,
            node,
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Filter::new(FilterNode::Raw(text.into()))
    }

    pub fn leaf(field: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Filter::new(FilterNode::Leaf(Leaf {
            field: field.into(),
            comparator,
            value: value.into(),
            ..Leaf::default()
        }))
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::leaf(field, Comparator::IsNull, "")
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Filter::leaf(field, Comparator::IsNotNull, "")
    }

    /// `ContainValues` over a multi-select picklist.
    pub fn multi_select<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Filter::multi_select_leaf(field, Comparator::MultiSelectContains, values)
    }

    /// `DoesNotContainValues` over a multi-select picklist.
    pub fn multi_select_excluding<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Filter::multi_select_leaf(field, Comparator::MultiSelectDoesNotContain, values)
    }

    fn multi_select_leaf<I, V>(field: impl Into<String>, comparator: Comparator, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Filter::new(FilterNode::Leaf(Leaf {
            field: field.into(),
            comparator,
            multi_select_values: values.into_iter().map(Into::into).collect(),
            ..Leaf::default()
        }))
    }

    pub fn any(field: impl Into<String>, children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::quantified(field, CollectionOperator::Any, children)
    }

    pub fn all(field: impl Into<String>, children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::quantified(field, CollectionOperator::All, children)
    }

    pub fn quantified(
        field: impl Into<String>,
        operator: CollectionOperator,
        children: impl IntoIterator<Item = Filter>,
    ) -> Self {
        Filter::new(FilterNode::Quantified(QuantifiedGroup {
            field: field.into(),
            operator,
            children: children.into_iter().collect(),
        }))
    }

    pub fn group(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::new(FilterNode::Group(children.into_iter().collect()))
    }

    #[must_use]
    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Compares lowercased values against `tolower(field)`. Only string comparators care.
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        if let FilterNode::Leaf(leaf) = &mut self.node {
            leaf.case_insensitive = true;
        }
        self
    }
}
