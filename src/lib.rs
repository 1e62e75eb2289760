//! Builds request URLs for OData endpoints, mostly Dataverse / Dynamics 365 ones.
//!
//! The interesting part is [`engine`], which turns a tree of filters into one `$filter`
//! expression. [`request`] wraps that into complete URLs and headers, and [`context`] remembers
//! endpoints between calls of the `odata` binary.
pub mod cache;
pub mod context;
pub mod engine;
mod error;
pub mod request;

pub use engine::{compile_filter, CompileOptions, Filter, FilterError};
pub use error::{Error, ErrorKind, InternalError};
pub use request::{EntityQuery, Request, RequestHelper};
