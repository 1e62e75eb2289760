use crate::engine::rendering::RenderableGroup;
use crate::engine::QuantifiedGroup;
use std::fmt::{Display, Formatter};

/// The lambda variable of `any`/`all`. Only one quantifier level exists, so it never changes.
pub const COLLECTION_ITERATOR: &str = "i";
const ITERATOR_FIELD_PREFIX: &str = "i/";

/// Renders `field/any(i: ...)` or `field/all(i: ...)`, qualifying every inner field with `i/`.
pub fn render_collection(group: &QuantifiedGroup) -> String {
    RenderableCollection(group).to_string()
}

pub(super) struct RenderableCollection<'a>(pub &'a QuantifiedGroup);

impl Display for RenderableCollection<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let QuantifiedGroup {
            field,
            operator,
            children,
        } = self.0;

        let conditions = RenderableGroup {
            filters: children,
            field_prefix: ITERATOR_FIELD_PREFIX,
        };

        write!(f, "{field}/{operator}({COLLECTION_ITERATOR}: {conditions})")
    }
}
