use crate::engine::encoding::{EncodedValue, FieldRef};
use crate::engine::rendering::multi_select::MultiSelectCall;
use crate::engine::{Comparator, Leaf};
use std::fmt::{Display, Formatter};

/// Renders one condition, returning the fragment and whether it is self-delimited.
///
/// Self-delimited fragments are complete function calls; the others are bare comparisons that a
/// group wraps in parentheses.
pub fn render_leaf(leaf: &Leaf, field_prefix: &str) -> (String, bool) {
    let fragment = RenderableLeaf { leaf, field_prefix }.to_string();

    (fragment, leaf.comparator.is_self_delimited())
}

pub(super) struct RenderableLeaf<'a> {
    pub leaf: &'a Leaf,
    pub field_prefix: &'a str,
}

impl Display for RenderableLeaf<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Leaf {
            field,
            comparator,
            value,
            case_insensitive,
            multi_select_values,
        } = self.leaf;

        // String comparisons honour case folding, everything else uses the field as is.
        let text_field = FieldRef::new(self.field_prefix, field, *case_insensitive);
        let text_value = EncodedValue::new(value, *case_insensitive);
        let field = FieldRef::new(self.field_prefix, field, false);

        // Numbers and dates are trusted to be formatted already.
        match comparator {
            Comparator::Contains => write!(f, "contains({text_field},{text_value})"),
            Comparator::StartsWith => write!(f, "startswith({text_field},{text_value})"),
            Comparator::EndsWith => write!(f, "endswith({text_field},{text_value})"),
            Comparator::StringEquals => write!(f, "{text_field} eq {text_value}"),
            Comparator::StringNotEquals => write!(f, "{text_field} ne {text_value}"),
            Comparator::NumericEquals | Comparator::DateTimeEquals => {
                write!(f, "{field} eq {value}")
            }
            Comparator::NumericNotEquals | Comparator::DateTimeNotEquals => {
                write!(f, "{field} ne {value}")
            }
            Comparator::GreaterThan => write!(f, "{field} gt {value}"),
            Comparator::GreaterThanOrEqual => write!(f, "{field} ge {value}"),
            Comparator::LessThan => write!(f, "{field} lt {value}"),
            Comparator::LessThanOrEqual => write!(f, "{field} le {value}"),
            Comparator::IsNull => write!(f, "{field} eq null"),
            Comparator::IsNotNull => write!(f, "{field} ne null"),
            Comparator::MultiSelectContains => write!(
                f,
                "{}",
                MultiSelectCall {
                    negated: false,
                    field,
                    values: multi_select_values,
                }
            ),
            Comparator::MultiSelectDoesNotContain => write!(
                f,
                "{}",
                MultiSelectCall {
                    negated: true,
                    field,
                    values: multi_select_values,
                }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(field: &str, comparator: Comparator, value: &str) -> Leaf {
        Leaf {
            field: field.to_string(),
            comparator,
            value: value.to_string(),
            ..Leaf::default()
        }
    }

    fn rendered(comparator: Comparator, value: &str) -> (String, bool) {
        render_leaf(&leaf("field", comparator, value), "")
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            rendered(Comparator::Contains, "an"),
            ("contains(field,'an')".to_string(), true)
        );
        assert_eq!(
            rendered(Comparator::StartsWith, "O'Neal"),
            ("startswith(field,'O%27%27Neal')".to_string(), true)
        );
        assert_eq!(
            rendered(Comparator::EndsWith, "son"),
            ("endswith(field,'son')".to_string(), true)
        );
    }

    #[test]
    fn test_string_comparisons() {
        assert_eq!(
            rendered(Comparator::StringEquals, "Bob Smith"),
            ("field eq 'Bob%20Smith'".to_string(), false)
        );
        assert_eq!(
            rendered(Comparator::StringNotEquals, "Bob"),
            ("field ne 'Bob'".to_string(), false)
        );
    }

    #[test]
    fn test_raw_comparisons() {
        let cases = [
            (Comparator::NumericEquals, "field eq 5"),
            (Comparator::NumericNotEquals, "field ne 5"),
            (Comparator::DateTimeEquals, "field eq 5"),
            (Comparator::DateTimeNotEquals, "field ne 5"),
            (Comparator::GreaterThan, "field gt 5"),
            (Comparator::GreaterThanOrEqual, "field ge 5"),
            (Comparator::LessThan, "field lt 5"),
            (Comparator::LessThanOrEqual, "field le 5"),
        ];

        for (comparator, expected) in cases {
            assert_eq!(rendered(comparator, "5"), (expected.to_string(), false));
        }

        assert_eq!(
            rendered(Comparator::GreaterThan, "2021-01-01T00:00:00Z").0,
            "field gt 2021-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_null_checks_ignore_the_value() {
        assert_eq!(
            rendered(Comparator::IsNull, "ignored"),
            ("field eq null".to_string(), false)
        );
        assert_eq!(
            rendered(Comparator::IsNotNull, ""),
            ("field ne null".to_string(), false)
        );
    }

    #[test]
    fn test_case_insensitive_only_changes_string_comparators() {
        let mut contains = leaf("fullname", Comparator::Contains, "BoB");
        contains.case_insensitive = true;
        assert_eq!(render_leaf(&contains, "").0, "contains(tolower(fullname),'bob')");

        let mut numeric = leaf("revenue", Comparator::GreaterThan, "10");
        numeric.case_insensitive = true;
        assert_eq!(render_leaf(&numeric, "").0, "revenue gt 10");
    }

    #[test]
    fn test_multi_select() {
        let mut tags = leaf("tags", Comparator::MultiSelectDoesNotContain, "");
        tags.multi_select_values = vec!["1".to_string(), "2".to_string()];

        assert_eq!(
            render_leaf(&tags, "i/"),
            (
                "Microsoft.Dynamics.CRM.DoesNotContainValues(PropertyName='i/tags',PropertyValues=['1','2'])"
                    .to_string(),
                true
            )
        );
    }

    #[test]
    fn test_prefix_does_not_touch_the_leaf() {
        let original = leaf("name", Comparator::StringEquals, "Bob");
        let copy = original.clone();

        assert_eq!(render_leaf(&original, "i/").0, "i/name eq 'Bob'");
        assert_eq!(render_leaf(&original, "i/").0, "i/name eq 'Bob'");
        assert_eq!(original, copy);
    }
}
