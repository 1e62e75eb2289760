use crate::cache;
use crate::cache::Cacheable;
use crate::engine::CompileOptions;
use crate::request::{DEFAULT_ODATA_VERSION, DEFAULT_TOP};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A named endpoint and the defaults used when building requests for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub name: ContextName,
    /// Like `https://org.crm.dynamics.com/api/data/v9.2`, without a trailing slash.
    pub url_base: String,
    pub odata_version: String,
    pub odata_max_version: String,
    pub page_size: u32,
    pub use_skip_tokens: bool,
    #[serde(default)]
    pub compile_options: CompileOptions,
}

impl Context {
    pub fn new(name: impl Into<ContextName>, url_base: &str) -> Self {
        Context {
            name: name.into(),
            url_base: url_base.trim_end_matches('/').to_string(),
            odata_version: DEFAULT_ODATA_VERSION.to_string(),
            odata_max_version: DEFAULT_ODATA_VERSION.to_string(),
            page_size: DEFAULT_TOP,
            use_skip_tokens: false,
            compile_options: CompileOptions::default(),
        }
    }

    /// The context selected with `odata use-context`.
    pub fn current() -> Result<Context, crate::Error> {
        cache::read(&ContextName::current()?)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContextName(String);

impl ContextName {
    pub fn current() -> Result<ContextName, crate::Error> {
        // All context names use the same cache key, because that's how we save the current
        // context. Reading a context named "any" will just get us the current context.
        cache::read(&ContextName("any".to_string()).cache_key())
    }
}

impl From<String> for ContextName {
    fn from(value: String) -> Self {
        ContextName(value)
    }
}

impl From<&str> for ContextName {
    fn from(value: &str) -> Self {
        ContextName(value.to_string())
    }
}

impl From<ContextName> for String {
    fn from(value: ContextName) -> Self {
        value.0
    }
}

impl Display for ContextName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
