use clap::{Parser, Subcommand};
use rusty_odata::context::Context;
use rusty_odata::request::{DEFAULT_ODATA_VERSION, DEFAULT_TOP};
use rusty_odata::CompileOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates a context.
    ///
    /// Contexts remember an endpoint and the defaults used when building requests for it.
    CreateContext(ContextParams),
    /// Selects an existing context. Pick one from a list if no name is given.
    UseContext { name: Option<String> },
    /// List available contexts.
    ListContexts,
    /// Compiles a JSON list of filters into a $filter value.
    Filter {
        /// JSON file with the filters, reads stdin when missing or "-"
        file: Option<PathBuf>,
    },
    /// Builds the URL and headers for querying an entity collection.
    Request(RequestParams),
    /// Builds the URL that looks up the metadata of an entity.
    Metadata { entity_logical_name: String },
    /// Builds the URL that lists the options of a picklist attribute.
    Picklist {
        /// MetadataId of the entity
        metadata_id: String,
        attribute_logical_name: String,
        #[arg(long)]
        multi_select: bool,
    },
    /// Builds the collection path of a many-to-many relationship.
    Intersect {
        /// Entity collection of the record, like "accounts"
        target_collection: String,
        target_id: String,
        /// Name of the navigation property
        intersect_name: String,
    },
    /// Extracts the record id from the URL returned by a create request.
    ParseGuid {
        url: String,
        /// Everything up to and including this is returned as the base URL
        #[arg(short, long)]
        suffix: Option<String>,
    },
    /// Runs a local server that builds requests using the current context.
    Serve {
        #[arg(long, default_value = "127.0.0.1:33334")]
        bind: String,
        /// Allow browser requests from this origin
        #[arg(long)]
        allow_origin: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
pub struct ContextParams {
    /// You can reuse your context by referencing this name
    name: String,
    /// Service root, like https://org.crm.dynamics.com/api/data/v9.2
    #[arg(long = "url")]
    url_base: String,
    /// Sent as the OData-Version header
    #[arg(long, default_value = DEFAULT_ODATA_VERSION)]
    odata_version: String,
    /// Sent as the OData-MaxVersion header
    #[arg(long, default_value = DEFAULT_ODATA_VERSION)]
    odata_max_version: String,
    /// Default $top of every request, 0 lets the server decide
    #[arg(long, default_value_t = DEFAULT_TOP)]
    page_size: u32,
    /// Page with skip tokens instead of $skip
    #[arg(long)]
    skip_tokens: bool,
    /// Render unknown comparators as contains() instead of failing
    #[arg(long)]
    legacy_contains_fallback: bool,
    /// Fail on multi-select filters without values
    #[arg(long)]
    strict_multi_select: bool,
    /// Use the new context
    #[arg(long = "use")]
    pub use_it: bool,
}

#[derive(clap::Args, Debug)]
pub struct RequestParams {
    /// Entity collection, like "accounts"
    pub collection: String,
    /// JSON file with the filters, "-" reads stdin
    #[arg(short, long)]
    pub filters: Option<PathBuf>,
    /// Fields to select
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,
    /// Order by clause, like "name asc"; repeat for several
    #[arg(short, long)]
    pub order_by: Vec<String>,
    /// Extra query part appended verbatim, like "$expand=primarycontactid"
    #[arg(short, long)]
    pub query: Vec<String>,
    /// Page size, defaults to the one of the context
    #[arg(short, long)]
    pub top: Option<u32>,
    /// Zero-based page number
    #[arg(short, long, default_value_t = 0)]
    pub page: u32,
    /// Page with skip tokens instead of $skip, defaults to the setting of the context.
    /// Use --skip-tokens=false to page with $skip in a context that uses skip tokens.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub skip_tokens: Option<bool>,
    /// Service root to use instead of the one of the current context
    #[arg(long = "url")]
    pub url_base: Option<String>,
}

impl From<ContextParams> for Context {
    fn from(value: ContextParams) -> Self {
        Context {
            odata_version: value.odata_version,
            odata_max_version: value.odata_max_version,
            page_size: value.page_size,
            use_skip_tokens: value.skip_tokens,
            compile_options: CompileOptions {
                legacy_contains_fallback: value.legacy_contains_fallback,
                reject_empty_multi_select: value.strict_multi_select,
            },
            ..Context::new(value.name, &value.url_base)
        }
    }
}
