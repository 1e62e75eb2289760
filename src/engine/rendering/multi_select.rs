use crate::engine::encoding::FieldRef;
use std::fmt::{Display, Formatter};

/// Namespace of the vendor functions used for multi-select picklists.
pub const VENDOR_NAMESPACE: &str = "Microsoft.Dynamics.CRM";

/// Renders `ContainValues` (or `DoesNotContainValues` when `is_not` is set) for a multi-select
/// picklist field.
///
/// Values are quoted but not percent-encoded: they are function arguments, not literals.
pub fn render_multi_select(is_not: bool, field: &str, values: &[String]) -> String {
    MultiSelectCall {
        negated: is_not,
        field: FieldRef::plain(field),
        values,
    }
    .to_string()
}

pub(super) struct MultiSelectCall<'a> {
    pub negated: bool,
    pub field: FieldRef<'a>,
    pub values: &'a [String],
}

impl Display for MultiSelectCall<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let function = if self.negated {
            "DoesNotContainValues"
        } else {
            "ContainValues"
        };

        write!(
            f,
            "{VENDOR_NAMESPACE}.{function}(PropertyName='{}',PropertyValues=[",
            self.field
        )?;

        if let Some((first, rest)) = self.values.split_first() {
            write!(f, "'{first}'")?;

            for value in rest {
                write!(f, ",'{value}'")?;
            }
        }

        write!(f, "])")
    }
}
