//! The untagged form of a filter, as it comes in from JSON.
//!
//! Every field is optional and the kind of filter is deduced from which ones are set, the same
//! way request payloads for this API are usually written by hand:
//! ```json
//! [
//!   { "field": "name", "comparator": "StringEquals", "value": "Bob" },
//!   { "combinator": "or", "collection_operator": "any", "field": "contact_customer_accounts",
//!     "group": [{ "field": "firstname", "comparator": "StartsWith", "value": "A" }] }
//! ]
//! ```
use crate::engine::{
    CollectionOperator, Combinator, CompileOptions, Comparator, Filter, FilterError, FilterNode,
    Leaf, QuantifiedGroup,
};
use log::warn;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LooseFilter {
    pub combinator: Option<String>,
    pub field: Option<String>,
    pub comparator: Option<String>,
    pub value: Option<String>,
    pub case_insensitive: bool,
    pub multi_select_values: Option<Vec<String>>,
    /// An empty string counts as not set.
    pub raw: Option<String>,
    pub collection_operator: Option<String>,
    pub group: Option<Vec<LooseFilter>>,
}

impl LooseFilter {
    /// Converts a whole list, stopping at the first filter with an invalid shape.
    pub fn convert_all(
        filters: Vec<LooseFilter>,
        options: &CompileOptions,
    ) -> Result<Vec<Filter>, FilterError> {
        filters
            .into_iter()
            .map(|filter| filter.into_filter(options))
            .collect()
    }

    pub fn into_filter(self, options: &CompileOptions) -> Result<Filter, FilterError> {
        let combinator = match &self.combinator {
            None => Combinator::None,
            Some(name) => Combinator::from_name(name)
                .ok_or_else(|| FilterError::InvalidCombinator(name.clone()))?,
        };

        Ok(Filter {
            combinator,
            node: self.into_node(options)?,
        })
    }

    fn into_node(self, options: &CompileOptions) -> Result<FilterNode, FilterError> {
        let LooseFilter {
            combinator: _,
            field,
            comparator,
            value,
            case_insensitive,
            multi_select_values,
            raw,
            collection_operator,
            group,
        } = self;

        let has_comparison = comparator.is_some()
            || value.is_some()
            || multi_select_values.is_some()
            || case_insensitive;
        let raw = raw.filter(|raw| !raw.is_empty());

        match (raw, group, collection_operator) {
            (Some(raw), None, None) if field.is_none() && !has_comparison => {
                Ok(FilterNode::Raw(raw))
            }
            (Some(_), _, _) => Err(shape("a raw filter cannot be mixed with other filter fields")),
            (None, Some(children), Some(operator)) if !has_comparison => {
                let field = field.ok_or_else(|| {
                    shape("a collection filter needs its navigation property in `field`")
                })?;
                let operator = CollectionOperator::from_name(&operator)
                    .ok_or(FilterError::InvalidCollectionOperator(operator))?;

                Ok(FilterNode::Quantified(QuantifiedGroup {
                    field,
                    operator,
                    children: LooseFilter::convert_all(children, options)?,
                }))
            }
            (None, Some(children), None) if field.is_none() && !has_comparison => Ok(
                FilterNode::Group(LooseFilter::convert_all(children, options)?),
            ),
            (None, Some(_), _) => Err(shape(
                "a filter group cannot also be a comparison, only `collection_operator` and \
                `field` may accompany it",
            )),
            (None, None, Some(_)) => Err(shape("a collection operator needs a `group`")),
            (None, None, None) => {
                let field =
                    field.ok_or_else(|| shape("the filter has no `raw`, `field` or `group`"))?;

                Ok(FilterNode::Leaf(Leaf {
                    field,
                    comparator: parse_comparator(comparator, options)?,
                    value: value.unwrap_or_default(),
                    case_insensitive,
                    multi_select_values: multi_select_values.unwrap_or_default(),
                }))
            }
        }
    }
}

impl TryFrom<LooseFilter> for Filter {
    type Error = FilterError;

    fn try_from(value: LooseFilter) -> Result<Self, Self::Error> {
        value.into_filter(&CompileOptions::default())
    }
}

fn parse_comparator(
    name: Option<String>,
    options: &CompileOptions,
) -> Result<Comparator, FilterError> {
    let Some(name) = name else {
        return Ok(Comparator::default());
    };

    match Comparator::from_name(&name) {
        Some(comparator) => Ok(comparator),
        None if options.legacy_contains_fallback => {
            warn!("Unknown comparator '{name}', rendering it as Contains");
            Ok(Comparator::Contains)
        }
        None => Err(FilterError::UnknownComparator(name)),
    }
}

fn shape(reason: &str) -> FilterError {
    FilterError::InvalidFilterShape(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Filter, FilterError> {
        let loose: LooseFilter = serde_json::from_str(json).unwrap();

        Filter::try_from(loose)
    }

    #[test]
    fn test_leaf() {
        let filter = parse(
            r#"{"combinator": "or", "field": "name", "comparator": "starts_with", "value": "Bo",
                "case_insensitive": true}"#,
        )
        .unwrap();

        assert_eq!(
            filter,
            Filter::leaf("name", Comparator::StartsWith, "Bo")
                .case_insensitive()
                .with_combinator(Combinator::Or)
        );
    }

    #[test]
    fn test_comparator_defaults_to_contains() {
        let filter = parse(r#"{"field": "name", "value": "Bo"}"#).unwrap();

        assert_eq!(filter, Filter::leaf("name", Comparator::Contains, "Bo"));
    }

    #[test]
    fn test_raw() {
        let filter = parse(r#"{"raw": "statecode eq 0", "combinator": "and"}"#).unwrap();

        assert_eq!(
            filter,
            Filter::raw("statecode eq 0").with_combinator(Combinator::And)
        );
    }

    #[test]
    fn test_empty_raw_is_ignored() {
        let filter = parse(r#"{"raw": "", "field": "name", "value": "Bo"}"#).unwrap();

        assert_eq!(filter, Filter::leaf("name", Comparator::Contains, "Bo"));
    }

    #[test]
    fn test_quantified_group() {
        let filter = parse(
            r#"{"field": "contacts", "collection_operator": "All",
                "group": [{"field": "statecode", "comparator": "NumericEquals", "value": "0"}]}"#,
        )
        .unwrap();

        assert_eq!(
            filter,
            Filter::all(
                "contacts",
                [Filter::leaf("statecode", Comparator::NumericEquals, "0")]
            )
        );
    }

    #[test]
    fn test_plain_group() {
        let filter = parse(
            r#"{"group": [{"raw": "a eq 1"}, {"raw": "b eq 2", "combinator": "or_not"}]}"#,
        )
        .unwrap();

        assert_eq!(
            filter,
            Filter::group([
                Filter::raw("a eq 1"),
                Filter::raw("b eq 2").with_combinator(Combinator::OrNot)
            ])
        );
    }

    #[test]
    fn test_invalid_shapes() {
        let cases = [
            r#"{}"#,
            r#"{"raw": "a eq 1", "field": "name"}"#,
            r#"{"raw": "a eq 1", "group": []}"#,
            r#"{"group": [], "comparator": "IsNull"}"#,
            r#"{"group": [], "field": "name"}"#,
            r#"{"collection_operator": "any", "field": "contacts"}"#,
            r#"{"collection_operator": "any", "group": []}"#,
            r#"{"value": "Bob"}"#,
        ];

        for case in cases {
            assert!(
                matches!(parse(case), Err(FilterError::InvalidFilterShape(_))),
                "{case}"
            );
        }
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(
            parse(r#"{"field": "name", "comparator": "Like", "value": "x"}"#),
            Err(FilterError::UnknownComparator("Like".to_string()))
        );
        assert_eq!(
            parse(r#"{"field": "name", "value": "x", "combinator": "xor"}"#),
            Err(FilterError::InvalidCombinator("xor".to_string()))
        );
        assert_eq!(
            parse(r#"{"field": "c", "collection_operator": "some", "group": []}"#),
            Err(FilterError::InvalidCollectionOperator("some".to_string()))
        );
    }

    #[test]
    fn test_legacy_fallback() {
        let loose: LooseFilter =
            serde_json::from_str(r#"{"field": "name", "comparator": "Like", "value": "x"}"#)
                .unwrap();
        let options = CompileOptions {
            legacy_contains_fallback: true,
            ..CompileOptions::default()
        };

        assert_eq!(
            loose.into_filter(&options),
            Ok(Filter::leaf("name", Comparator::Contains, "x"))
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = serde_json::from_str::<LooseFilter>(r#"{"feild": "name"}"#);

        assert!(result.is_err());
    }
}
