use crate::args::RequestParams;
use log::info;
use rusty_odata::context::Context;
use rusty_odata::engine::LooseFilter;
use rusty_odata::request::{
    entity_metadata_url, intersect_collection_name, parse_guid_url, picklist_url,
};
use rusty_odata::{compile_filter, EntityQuery, Error, ErrorKind, InternalError, RequestHelper};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub mod serve;

/// Prints the `$filter` value of a JSON filter list.
pub fn filter(file: Option<PathBuf>) -> Result<(), Error> {
    let helper = optional_context()?
        .as_ref()
        .map(RequestHelper::from_context)
        .unwrap_or_default();
    let filters = LooseFilter::convert_all(read_filters(file.as_deref())?, helper.options())?;

    println!("{}", compile_filter(&filters, helper.options())?);

    Ok(())
}

pub fn request(params: RequestParams) -> Result<(), Error> {
    let context = optional_context()?;
    let url_base = match (params.url_base, &context) {
        (Some(url_base), _) => url_base.trim_end_matches('/').to_string(),
        (None, Some(context)) => context.url_base.clone(),
        (None, None) => Err(InternalError(
            "No context in use, pass --url or run odata use-context".to_string(),
        ))?,
    };
    let helper = context
        .as_ref()
        .map(RequestHelper::from_context)
        .unwrap_or_default();
    let default_top = context.as_ref().map_or(
        rusty_odata::request::DEFAULT_TOP,
        |context| context.page_size,
    );
    let context_skip_tokens = context.as_ref().is_some_and(|context| context.use_skip_tokens);

    let mut query = EntityQuery::new(params.collection)
        .page(params.top.unwrap_or(default_top), params.page)
        .skip_tokens(params.skip_tokens.unwrap_or(context_skip_tokens));

    if let Some(file) = params.filters {
        for filter in LooseFilter::convert_all(read_filters(Some(&file))?, helper.options())? {
            query = query.filter(filter);
        }
    }
    for field in params.select {
        query = query.select(field);
    }
    for clause in params.order_by {
        query = query.order_by(clause);
    }
    for clause in params.query {
        query = query.query_clause(clause);
    }

    let request = helper.entity_request(&url_base, &query)?;

    println!("{}", request.url);
    for (name, value) in &request.headers {
        println!("{name}: {value}");
    }

    Ok(())
}

pub fn metadata(entity_logical_name: &str) -> Result<(), Error> {
    let context = Context::current()?;

    println!("{}", entity_metadata_url(&context.url_base, entity_logical_name));

    Ok(())
}

pub fn picklist(
    metadata_id: &str,
    attribute_logical_name: &str,
    multi_select: bool,
) -> Result<(), Error> {
    let context = Context::current()?;

    println!(
        "{}",
        picklist_url(
            &context.url_base,
            metadata_id,
            attribute_logical_name,
            multi_select
        )
    );

    Ok(())
}

pub fn intersect(target_collection: &str, target_id: &str, intersect_name: &str) {
    println!(
        "{}",
        intersect_collection_name(target_collection, target_id, intersect_name)
    );
}

pub fn parse_guid(url: &str, suffix: Option<&str>) -> Result<(), Error> {
    let parsed = parse_guid_url(url, suffix);

    if parsed.id.is_empty() {
        Err(InternalError(format!("No id found in '{url}'")))?;
    }

    println!("{}", parsed.id);
    println!("{}", parsed.base_url);

    Ok(())
}

/// The current context, or `None` if no context was ever selected.
///
/// A context that exists but cannot be read is still an error.
fn optional_context() -> Result<Option<Context>, Error> {
    match Context::current() {
        Ok(context) => Ok(Some(context)),
        Err(error) if is_missing_context(&error) => {
            info!("Not using a context ({error}), falling back to the defaults");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

fn is_missing_context(error: &Error) -> bool {
    match error.kind() {
        ErrorKind::IoError(error) => error.kind() == io::ErrorKind::NotFound,
        // no $HOME means no cache folder either
        ErrorKind::EnvVarError(_) => true,
        _ => false,
    }
}

/// Missing file or "-" means stdin.
fn read_filters(file: Option<&Path>) -> Result<Vec<LooseFilter>, Error> {
    let filters = match file {
        Some(path) if path != Path::new("-") => serde_json::from_reader(fs::File::open(path)?)?,
        _ => serde_json::from_reader(io::stdin().lock())?,
    };

    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::VarError;

    #[test]
    fn test_missing_context() {
        let not_found: Error = io::Error::from(io::ErrorKind::NotFound).into();
        let no_home: Error = VarError::NotPresent.into();

        assert!(is_missing_context(&not_found));
        assert!(is_missing_context(&no_home));
    }

    #[test]
    fn test_unreadable_context_is_not_missing() {
        let denied: Error = io::Error::from(io::ErrorKind::PermissionDenied).into();
        let corrupt: Error = serde_json::from_str::<Context>("{\"name\": ")
            .unwrap_err()
            .into();

        assert!(!is_missing_context(&denied));
        assert!(!is_missing_context(&corrupt));
    }
}
