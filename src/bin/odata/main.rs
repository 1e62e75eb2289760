mod args;
mod commands;

use crate::args::{Command, ContextParams};
use args::Args;
use clap::Parser;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::FuzzySelect;
use rusty_odata::cache;
use rusty_odata::context::{Context, ContextName};
use rusty_odata::InternalError;
use std::process::exit;

fn main() {
    env_logger::init();

    let args = Args::parse();

    let result = match args.command {
        Command::CreateContext(context) => create_context(context),
        Command::UseContext { name } => use_context(name),
        Command::ListContexts => list_contexts(),
        Command::Filter { file } => commands::filter(file),
        Command::Request(params) => commands::request(params),
        Command::Metadata {
            entity_logical_name,
        } => commands::metadata(&entity_logical_name),
        Command::Picklist {
            metadata_id,
            attribute_logical_name,
            multi_select,
        } => commands::picklist(&metadata_id, &attribute_logical_name, multi_select),
        Command::Intersect {
            target_collection,
            target_id,
            intersect_name,
        } => {
            commands::intersect(&target_collection, &target_id, &intersect_name);
            Ok(())
        }
        Command::ParseGuid { url, suffix } => commands::parse_guid(&url, suffix.as_deref()),
        Command::Serve { bind, allow_origin } => commands::serve::run(&bind, allow_origin),
    };

    if let Err(error) = result {
        eprintln!("{intro}: {error}", intro = "error".bold().red());
        exit(1);
    }
}

fn create_context(params: ContextParams) -> Result<(), rusty_odata::Error> {
    let use_it = params.use_it;
    let new_context: Context = params.into();

    validate_new_context(&new_context)?;

    cache::write(&new_context)?;

    println!("Create new context \x1b[1m{}\x1b[0m.", new_context.name);

    if use_it {
        use_context(Some(new_context.name.into()))?;
    } else {
        println!(
            "Switch to it by running \x1b[1modata use-context {}\x1b[0m.",
            new_context.name
        );
    }

    Ok(())
}

fn validate_new_context(context: &Context) -> Result<(), rusty_odata::Error> {
    if !context.url_base.starts_with("http://") && !context.url_base.starts_with("https://") {
        Err(InternalError(format!(
            "The url must start with http:// or https://, found '{}'",
            context.url_base
        )))?;
    }

    Ok(())
}

fn use_context(name: Option<String>) -> Result<(), rusty_odata::Error> {
    let context_name: ContextName = match name {
        Some(name) => name.into(),
        None => pick_context()?,
    };

    // reading it back makes sure we never switch to a context that does not exist
    let context: Context = cache::read(&context_name)?;
    cache::write(&context.name)?;

    println!("Switched to context \x1b[1m{}\x1b[0m.", context.name);

    Ok(())
}

fn pick_context() -> Result<ContextName, rusty_odata::Error> {
    let mut known_contexts: Vec<Context> = cache::read_all()?;

    if known_contexts.is_empty() {
        Err(InternalError(
            "There are no contexts yet, create one with odata create-context".to_string(),
        ))?;
    }

    let names: Vec<String> = known_contexts
        .iter()
        .map(|context| context.name.to_string())
        .collect();

    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a context")
        .items(&names)
        .default(0)
        .interact()?;

    Ok(known_contexts.swap_remove(selection).name)
}

fn list_contexts() -> Result<(), rusty_odata::Error> {
    // having no current context is fine, it just means nothing gets marked
    let current_context = ContextName::current().ok();
    let known_contexts: Vec<Context> = cache::read_all()?;

    println!("Available contexts:");
    for context in &known_contexts {
        println!(
            "{}{}: {} (OData {})",
            if current_context.as_ref() == Some(&context.name) {
                " * ".bold()
            } else {
                "   ".into()
            },
            context.name.to_string().bold(),
            context.url_base,
            context.odata_version
        )
    }

    Ok(())
}
