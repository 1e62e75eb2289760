//! Builds the URL and headers of a request against an OData endpoint.
//!
//! Nothing in here talks to the network: callers issue the returned [`Request`] themselves.
mod guid;
mod paging;

pub use guid::{parse_guid_url, ParsedGuidUrl};
pub use paging::Paging;

use crate::context::Context;
use crate::engine::{
    compile_filter, CompileOptions, Filter, FilterError, LooseFilter, VENDOR_NAMESPACE,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const DEFAULT_ODATA_VERSION: &str = "4.0";
pub const DEFAULT_TOP: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

/// Everything needed to query an entity collection.
///
/// ```
/// use rusty_odata::engine::{Combinator, Comparator, Filter};
/// use rusty_odata::request::{EntityQuery, RequestHelper};
///
/// let query = EntityQuery::new("accounts")
///     .filter(Filter::leaf("name", Comparator::StartsWith, "Contoso"))
///     .filter(Filter::is_null("parentaccountid").with_combinator(Combinator::And))
///     .select("name")
///     .order_by("name asc")
///     .page(50, 2);
///
/// let request = RequestHelper::default()
///     .entity_request("https://org.example.com/api/data/v9.2", &query)
///     .unwrap();
///
/// assert!(request.url.contains("$skip=150"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub collection: String,
    pub filters: Vec<Filter>,
    /// Appended verbatim, `$expand=...` for example.
    pub extra_query_clauses: Vec<String>,
    /// Like `name asc`.
    pub order_bys: Vec<String>,
    pub selects: Vec<String>,
    /// 0 leaves the page size to the server.
    pub top: u32,
    /// Zero-based.
    pub page: u32,
    pub use_skip_tokens: bool,
}

impl EntityQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        EntityQuery {
            collection: collection.into(),
            filters: Vec::new(),
            extra_query_clauses: Vec::new(),
            order_bys: Vec::new(),
            selects: Vec::new(),
            top: DEFAULT_TOP,
            page: 0,
            use_skip_tokens: false,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.selects.push(field.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_bys.push(clause.into());
        self
    }

    #[must_use]
    pub fn query_clause(mut self, clause: impl Into<String>) -> Self {
        self.extra_query_clauses.push(clause.into());
        self
    }

    #[must_use]
    pub fn page(mut self, top: u32, page: u32) -> Self {
        self.top = top;
        self.page = page;
        self
    }

    #[must_use]
    pub fn skip_tokens(mut self, use_skip_tokens: bool) -> Self {
        self.use_skip_tokens = use_skip_tokens;
        self
    }

    pub fn paging(&self) -> Paging {
        Paging::new(self.top, self.page, self.use_skip_tokens)
    }
}

/// The JSON form of an [`EntityQuery`], with filters in their loose form.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityQueryInput {
    pub collection: String,
    #[serde(default)]
    pub filters: Vec<LooseFilter>,
    #[serde(default)]
    pub extra_query_clauses: Vec<String>,
    #[serde(default)]
    pub order_bys: Vec<String>,
    #[serde(default)]
    pub selects: Vec<String>,
    pub top: Option<u32>,
    #[serde(default)]
    pub page: u32,
    pub use_skip_tokens: Option<bool>,
}

impl EntityQueryInput {
    /// Missing `top` and `use_skip_tokens` come from `defaults`.
    pub fn into_query(
        self,
        options: &CompileOptions,
        defaults: &EntityQuery,
    ) -> Result<EntityQuery, FilterError> {
        Ok(EntityQuery {
            collection: self.collection,
            filters: LooseFilter::convert_all(self.filters, options)?,
            extra_query_clauses: self.extra_query_clauses,
            order_bys: self.order_bys,
            selects: self.selects,
            top: self.top.unwrap_or(defaults.top),
            page: self.page,
            use_skip_tokens: self.use_skip_tokens.unwrap_or(defaults.use_skip_tokens),
        })
    }
}

/// Holds the OData protocol versions sent with every request and the filter compile options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHelper {
    odata_version: String,
    odata_max_version: String,
    options: CompileOptions,
}

impl Default for RequestHelper {
    fn default() -> Self {
        RequestHelper::new(None, None)
    }
}

impl RequestHelper {
    pub fn new(odata_version: Option<String>, odata_max_version: Option<String>) -> Self {
        RequestHelper {
            odata_version: odata_version.unwrap_or_else(|| DEFAULT_ODATA_VERSION.to_string()),
            odata_max_version: odata_max_version
                .unwrap_or_else(|| DEFAULT_ODATA_VERSION.to_string()),
            options: CompileOptions::default(),
        }
    }

    pub fn from_context(context: &Context) -> Self {
        RequestHelper::new(
            Some(context.odata_version.clone()),
            Some(context.odata_max_version.clone()),
        )
        .with_options(context.compile_options)
    }

    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn base_headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("OData-Version".to_string(), self.odata_version.clone()),
            ("OData-MaxVersion".to_string(), self.odata_max_version.clone()),
        ])
    }

    /// `$filter=...`, or `None` when the filters compile to nothing.
    pub fn filter_query(&self, filters: &[Filter]) -> Result<Option<String>, FilterError> {
        let compiled = compile_filter(filters, &self.options)?;

        if compiled.is_empty() {
            Ok(None)
        } else {
            Ok(Some(format!("$filter={compiled}")))
        }
    }

    /// Builds `{url_base}/{collection}?{query}` and the headers to send with it.
    ///
    /// The query parts always come in the same order: filter, select, count, paging, the extra
    /// clauses, and finally order by.
    pub fn entity_request(
        &self,
        url_base: &str,
        query: &EntityQuery,
    ) -> Result<Request, FilterError> {
        let mut parts = Vec::new();
        let mut headers = self.base_headers();

        parts.extend(self.filter_query(&query.filters)?);
        parts.extend(OptionalClause::select(&query.selects).render());
        parts.push("$count=true".to_string());

        let paging = query.paging();
        parts.extend(paging.query_parts());
        if let Some((name, value)) = paging.prefer_header() {
            headers.insert(name.to_string(), value);
        }

        parts.extend(query.extra_query_clauses.iter().cloned());
        parts.extend(OptionalClause::order_by(&query.order_bys).render());

        let url = format!("{url_base}/{}?{}", query.collection, parts.join("&"));
        debug!("Built request URL: {url}");

        Ok(Request { url, headers })
    }
}

/// The collection path of a many-to-many relationship seen from one record, for example
/// `msdyncrm_keywords(4db0ac76-cfcd-ea11-a812-000d3a33febe)/msdyncrm_msdyncrm_keyword_msdyncrm_file`.
pub fn intersect_collection_name(
    target_lcn: &str,
    target_id: &str,
    intersect_eln: &str,
) -> String {
    format!("{target_lcn}({target_id})/{intersect_eln}")
}

pub fn entity_metadata_url(url_base: &str, entity_logical_name: &str) -> String {
    format!(
        "{url_base}/EntityDefinitions?$count=true&$filter=LogicalName eq '{entity_logical_name}'"
    )
}

/// Options of a picklist attribute, multi-select picklists live behind a different type cast.
pub fn picklist_url(
    url_base: &str,
    metadata_id: &str,
    attribute_logical_name: &str,
    is_multi_select: bool,
) -> String {
    let metadata_type = if is_multi_select {
        "MultiSelectPicklistAttributeMetadata"
    } else {
        "PicklistAttributeMetadata"
    };

    format!(
        "{url_base}/EntityDefinitions({metadata_id})/Attributes/{VENDOR_NAMESPACE}.{metadata_type}\
        ?$filter=LogicalName eq '{attribute_logical_name}'&$count=true&$expand=OptionSet"
    )
}

/// A query part that only shows up when it has items, like `$select=a,b,c`.
struct OptionalClause<'a, T> {
    intro: &'a str,
    ligature: &'a str,
    items: &'a [T],
}

impl<'a, T> OptionalClause<'a, T>
where
    T: Display,
{
    fn select(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "$select=",
            ligature: ",",
            items,
        }
    }

    fn order_by(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "$orderby=",
            ligature: ",",
            items,
        }
    }

    fn render(&self) -> Option<String> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl<'a, T> Display for OptionalClause<'a, T>
where
    T: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self {
            intro,
            ligature,
            items,
        } = self;

        if let Some((first, rest)) = items.split_first() {
            write!(f, "{intro}{first}")?;

            for item in rest {
                write!(f, "{ligature}{item}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Combinator, Comparator};

    const BASE: &str = "https://org.crm.dynamics.com/api/data/v9.1";

    fn query() -> EntityQuery {
        EntityQuery::new("leads")
    }

    #[test]
    fn test_no_filters() {
        let request = RequestHelper::default().entity_request(BASE, &query()).unwrap();

        assert_eq!(request.url, format!("{BASE}/leads?$count=true&$top=100"));
        assert_eq!(
            request.headers,
            BTreeMap::from([
                ("OData-MaxVersion".to_string(), "4.0".to_string()),
                ("OData-Version".to_string(), "4.0".to_string()),
            ])
        );
    }

    #[test]
    fn test_part_order() {
        let query = query()
            .filter(Filter::leaf("name", Comparator::StringEquals, "Bob"))
            .filter(
                Filter::leaf("status", Comparator::StringEquals, "Active")
                    .with_combinator(Combinator::Or),
            )
            .select("name")
            .select("status")
            .order_by("name asc")
            .order_by("createdon desc")
            .query_clause("$expand=parentaccountid($select=name)")
            .page(25, 0);

        let request = RequestHelper::default().entity_request(BASE, &query).unwrap();

        assert_eq!(
            request.url,
            format!(
                "{BASE}/leads?$filter=(name eq 'Bob') or (status eq 'Active')&$select=name,status\
                &$count=true&$top=25&$expand=parentaccountid($select=name)\
                &$orderby=name asc,createdon desc"
            )
        );
    }

    #[test]
    fn test_offset_paging() {
        let request = RequestHelper::default()
            .entity_request(BASE, &query().page(50, 2))
            .unwrap();

        assert_eq!(request.url, format!("{BASE}/leads?$count=true&$top=50&$skip=150"));
        assert!(!request.headers.contains_key("Prefer"));
    }

    #[test]
    fn test_skip_token_paging() {
        let request = RequestHelper::default()
            .entity_request(BASE, &query().page(50, 2).skip_tokens(true))
            .unwrap();

        assert_eq!(
            request.url,
            format!("{BASE}/leads?$count=true&$top=50&$skiptoken=<cookie pagenumber='3' />")
        );
        assert_eq!(
            request.headers.get("Prefer").map(String::as_str),
            Some("odata.maxpagesize=50")
        );
    }

    #[test]
    fn test_no_top() {
        let request = RequestHelper::default()
            .entity_request(BASE, &query().page(0, 4).skip_tokens(true))
            .unwrap();

        assert_eq!(request.url, format!("{BASE}/leads?$count=true"));
        assert!(!request.headers.contains_key("Prefer"));
    }

    #[test]
    fn test_invalid_filters_fail() {
        let query = query().filter(Filter::leaf("name", Comparator::StringEquals, ""));

        assert!(matches!(
            RequestHelper::default().entity_request(BASE, &query),
            Err(FilterError::MissingComparatorValue { .. })
        ));
    }

    #[test]
    fn test_empty_group_is_not_rendered_as_a_filter() {
        let query = query().filter(Filter::group([]));

        assert_eq!(
            RequestHelper::default().entity_request(BASE, &query),
            Err(FilterError::EmptyGroup)
        );
    }

    #[test]
    fn test_custom_versions() {
        let helper = RequestHelper::new(Some("4.01".to_string()), None);

        assert_eq!(
            helper.base_headers(),
            BTreeMap::from([
                ("OData-MaxVersion".to_string(), "4.0".to_string()),
                ("OData-Version".to_string(), "4.01".to_string()),
            ])
        );
    }

    #[test]
    fn test_query_input() {
        let input: EntityQueryInput = serde_json::from_str(
            r#"{"collection": "accounts", "filters": [{"raw": "statecode eq 0"}], "page": 1}"#,
        )
        .unwrap();
        let defaults = EntityQuery::new("").page(20, 0).skip_tokens(true);

        let query = input
            .into_query(&CompileOptions::default(), &defaults)
            .unwrap();

        assert_eq!(
            query,
            EntityQuery::new("accounts")
                .filter(Filter::raw("statecode eq 0"))
                .page(20, 1)
                .skip_tokens(true)
        );
    }

    #[test]
    fn test_companion_urls() {
        assert_eq!(
            intersect_collection_name(
                "msdyncrm_keywords",
                "4db0ac76-cfcd-ea11-a812-000d3a33febe",
                "msdyncrm_msdyncrm_keyword_msdyncrm_file"
            ),
            "msdyncrm_keywords(4db0ac76-cfcd-ea11-a812-000d3a33febe)/msdyncrm_msdyncrm_keyword_msdyncrm_file"
        );
        assert_eq!(
            entity_metadata_url(BASE, "lead"),
            format!("{BASE}/EntityDefinitions?$count=true&$filter=LogicalName eq 'lead'")
        );
        assert_eq!(
            picklist_url(BASE, "abc", "mshied_contacttype", true),
            format!(
                "{BASE}/EntityDefinitions(abc)/Attributes/Microsoft.Dynamics.CRM.\
                MultiSelectPicklistAttributeMetadata?$filter=LogicalName eq 'mshied_contacttype'\
                &$count=true&$expand=OptionSet"
            )
        );
        assert_eq!(
            picklist_url(BASE, "abc", "statuscode", false),
            format!(
                "{BASE}/EntityDefinitions(abc)/Attributes/Microsoft.Dynamics.CRM.\
                PicklistAttributeMetadata?$filter=LogicalName eq 'statuscode'\
                &$count=true&$expand=OptionSet"
            )
        );
    }
}
