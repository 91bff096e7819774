use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncBufReadExt;

use cardfile::config::{self, Config};
use cardfile::dispatch::{self, UriPrinter};
use cardfile::engine::{ContactsEngine, UiState};
use cardfile::group::GroupedIndex;
use cardfile::model::Contact;
use cardfile::source::JsonFileSource;

#[derive(Parser, Debug)]
#[command(name = "cardfile")]
struct Cli {
    /// Path to an alternate configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Contact snapshot to read (overrides the configured path)
    #[arg(long)]
    contacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the address book as sections keyed by first letter
    List(ListArgs),
    /// Filter contacts by a case-insensitive name substring
    Query(QueryArgs),
    /// Filter interactively: every input line becomes the new query
    Search(SearchArgs),
    /// Print a tel: URI for the first contact matching a filter
    Call(PickArgs),
    /// Print a mailto: URI for the first contact matching a filter
    Email(PickArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Order sections alphabetically instead of first-encounter order
    #[arg(long)]
    sort_sections: bool,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Search term (matched anywhere in the name, ignoring case)
    query: String,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Order sections alphabetically instead of first-encounter order
    #[arg(long)]
    sort_sections: bool,
}

#[derive(Args, Debug)]
struct PickArgs {
    /// Filter selecting the contact; the first match in view order wins
    filter: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };

    let contacts_path = cli.contacts.or_else(|| config.contacts_path.clone());
    let Some(contacts_path) = contacts_path else {
        bail!("no contact snapshot configured; pass --contacts or set `contacts_path` in the configuration file");
    };
    let source = JsonFileSource::new(contacts_path);
    let engine = ContactsEngine::new();

    match cli.command {
        Command::List(args) => handle_list(&engine, &source, &config, args).await,
        Command::Query(args) => handle_query(&engine, &source, args).await,
        Command::Search(args) => handle_search(&engine, &source, &config, args).await,
        Command::Call(args) => handle_call(&engine, &source, args).await,
        Command::Email(args) => handle_email(&engine, &source, args).await,
    }
}

async fn handle_list(
    engine: &ContactsEngine,
    source: &JsonFileSource,
    config: &Config,
    args: ListArgs,
) -> Result<()> {
    engine.load(source).await;
    let index = take_index(engine.current_view())?;
    print_index(&index, args.sort_sections || config.sort_sections);
    Ok(())
}

async fn handle_query(
    engine: &ContactsEngine,
    source: &JsonFileSource,
    args: QueryArgs,
) -> Result<()> {
    engine.load(source).await;
    engine.set_query(args.query.as_str());

    let index = take_index(engine.current_view())?;
    if index.is_empty() {
        println!("No matches for \"{}\"", args.query);
    } else {
        println!(
            "Found {} contact(s) matching \"{}\"",
            index.contact_count(),
            args.query
        );
        print_index(&index, false);
    }
    Ok(())
}

async fn handle_search(
    engine: &ContactsEngine,
    source: &JsonFileSource,
    config: &Config,
    args: SearchArgs,
) -> Result<()> {
    let sort = args.sort_sections || config.sort_sections;

    engine.load(source).await;
    print_index(&take_index(engine.current_view())?, sort);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        engine.set_query(line.as_str());
        let index = take_index(engine.current_view())?;
        println!("-- {} contact(s) for \"{}\"", index.contact_count(), line);
        print_index(&index, sort);
    }
    Ok(())
}

async fn handle_call(
    engine: &ContactsEngine,
    source: &JsonFileSource,
    args: PickArgs,
) -> Result<()> {
    let contact = pick_contact(engine, source, &args.filter).await?;
    if !dispatch::request_call(&contact, &UriPrinter) {
        println!("{} has no phone number", contact.name);
    }
    Ok(())
}

async fn handle_email(
    engine: &ContactsEngine,
    source: &JsonFileSource,
    args: PickArgs,
) -> Result<()> {
    let contact = pick_contact(engine, source, &args.filter).await?;
    if !dispatch::request_email(&contact, &UriPrinter) {
        println!("{} has no email address", contact.name);
    }
    Ok(())
}

/// Load, filter, and take the first contact in view order.
async fn pick_contact(
    engine: &ContactsEngine,
    source: &JsonFileSource,
    filter: &str,
) -> Result<Contact> {
    engine.load(source).await;
    engine.set_query(filter);

    let index = take_index(engine.current_view())?;
    let result = match index.contacts().next() {
        Some(contact) => Ok(contact.clone()),
        None => bail!("no contact matching \"{}\"", filter),
    };
    result
}

/// Unwrap a view for one-shot commands, surfacing the error message as
/// the process error.
fn take_index(view: UiState<GroupedIndex>) -> Result<GroupedIndex> {
    match view {
        UiState::Success(index) => Ok(index),
        UiState::Error(message) => bail!("{}", message),
        UiState::Loading => bail!("contacts are still loading"),
    }
}

fn print_index(index: &GroupedIndex, sort_sections: bool) {
    let index = if sort_sections {
        index.clone().sorted_by_key()
    } else {
        index.clone()
    };

    for (key, members) in index.iter() {
        println!("{key}");
        for contact in members {
            println!("  {}", contact.name);
            for number in &contact.numbers {
                println!("    tel    {number}");
            }
            for email in &contact.emails {
                println!("    email  {email}");
            }
        }
    }
}
