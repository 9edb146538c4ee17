//! Interactive browser for SensorThings-style REST APIs
//!
//! Thin REPL front end over the navigation engine. All state changes go
//! through `BrowserSession`; this binary only parses commands and renders
//! the current catalog, trail, and view.

use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use sta_browser::fields::{classify, format_primitive, title_for, FieldKind, SELF_LINK_KEY};
use sta_browser::http::{Credentials, HttpFetch};
use sta_browser::session::BrowserSession;
use sta_browser::view::View;

/// A followable link extracted from the current view
struct LinkEntry {
    label: String,
    target: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let server_url = args
        .get(1)
        .cloned()
        .or_else(|| env::var("STA_SERVER_URL").ok())
        .unwrap_or_default();
    let username = args
        .get(2)
        .cloned()
        .or_else(|| env::var("STA_USERNAME").ok())
        .unwrap_or_default();
    let password = args
        .get(3)
        .cloned()
        .or_else(|| env::var("STA_PASSWORD").ok())
        .unwrap_or_default();

    let credentials = if username.is_empty() && password.is_empty() {
        None
    } else {
        Some(Credentials::new(username, password))
    };

    let fetch = Arc::new(HttpFetch::new()?);
    let mut session = BrowserSession::new(fetch);

    println!("STA browser - connecting...");
    match session.connect(&server_url, credentials.clone()).await {
        Ok(()) => print_catalog(&session),
        Err(e) => eprintln!("Error: {}", e),
    }

    let stdin = io::stdin();
    loop {
        print!("sta> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();
        let command = match parts.next() {
            Some(c) => c,
            None => continue,
        };
        let argument = parts.next().unwrap_or("");

        match command {
            "quit" | "exit" | "q" => break,
            "help" | "?" => print_help(),
            "connect" => match session.connect(argument, credentials.clone()).await {
                Ok(()) => print_catalog(&session),
                Err(e) => eprintln!("Error: {}", e),
            },
            "sets" => print_catalog(&session),
            "open" => {
                let set = argument
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| session.entity_sets().get(n))
                    .cloned();
                match set {
                    Some(set) => {
                        if let Err(e) = session.open(&set.url, &set.name).await {
                            eprintln!("Error: {}", e);
                        } else {
                            print_view(&session);
                        }
                    }
                    None => eprintln!("Usage: open <entity-set-number> (see 'sets')"),
                }
            }
            "follow" => {
                let link = argument
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| view_links(session.view()).into_iter().nth(n));
                match link {
                    Some(link) => {
                        if let Err(e) = session.follow(&link.target, &link.label).await {
                            eprintln!("Error: {}", e);
                        } else {
                            print_view(&session);
                        }
                    }
                    None => eprintln!("Usage: follow <link-number> (see 'show')"),
                }
            }
            "next" => {
                let link = session
                    .view()
                    .and_then(View::next_link)
                    .map(str::to_string)
                    .unwrap_or_default();
                if link.is_empty() {
                    eprintln!("No next page");
                } else if let Err(e) = session.paginate(&link).await {
                    eprintln!("Error: {}", e);
                } else {
                    print_view(&session);
                }
            }
            "back" => match argument.parse::<usize>() {
                Ok(index) => {
                    if let Err(e) = session.revisit(index).await {
                        eprintln!("Error: {}", e);
                    } else {
                        print_view(&session);
                    }
                }
                Err(_) => eprintln!("Usage: back <breadcrumb-number> (see 'trail')"),
            },
            "trail" => print_trail(&session),
            "show" => print_view(&session),
            other => eprintln!("Unknown command '{}' - try 'help'", other),
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  connect [url]   reconnect (blank url uses the demo server)");
    println!("  sets            list the catalog's entity sets");
    println!("  open <n>        open entity set n as a fresh trail");
    println!("  follow <n>      follow link n from the current view");
    println!("  next            load the collection's next page");
    println!("  back <n>        jump back to breadcrumb n");
    println!("  trail           print the breadcrumb trail");
    println!("  show            print the current view");
    println!("  quit            exit");
}

fn print_catalog(session: &BrowserSession) {
    if let Some(err) = session.root_error() {
        eprintln!("Error: {}", err);
        return;
    }
    println!("Connected to {}", session.base_url());
    for (i, set) in session.entity_sets().iter().enumerate() {
        match &set.description {
            Some(desc) => println!("  [{}] {} - {}", i, set.name, desc),
            None => println!("  [{}] {}", i, set.name),
        }
    }
}

fn print_trail(session: &BrowserSession) {
    for (i, crumb) in session.trail().iter().enumerate() {
        println!("  [{}] {} ({})", i, crumb.label, crumb.url);
    }
}

fn print_view(session: &BrowserSession) {
    if let Some(err) = session.content_error() {
        eprintln!("Error: {}", err);
        return;
    }

    print_trail(session);
    match session.view() {
        Some(View::Collection {
            items,
            next_link,
            total_count,
        }) => {
            match total_count {
                Some(count) => println!("Collection: {} of {} entities", items.len(), count),
                None => println!("Collection: {} entities", items.len()),
            }
            for (i, item) in items.iter().enumerate() {
                println!("  [{}] {}", i, title_for(item, "(untitled)"));
            }
            if next_link.is_some() {
                println!("  ... more available via 'next'");
            }
        }
        Some(View::Single { entity }) => {
            println!("Entity: {}", title_for(entity, "(untitled)"));
            for (i, link) in view_links(session.view()).into_iter().enumerate() {
                println!("  [{}] -> {}", i, link.label);
            }
            if let Some(fieldmap) = entity.as_object() {
                for (key, value) in fieldmap {
                    match classify(key, value) {
                        FieldKind::Primitive => {
                            println!("  {}: {}", key, format_primitive(value))
                        }
                        FieldKind::Nested => println!("  {}: {}", key, value),
                        // Links already listed above with follow numbers
                        FieldKind::Navigation { .. } | FieldKind::SelfLink { .. } => {}
                    }
                }
            }
        }
        None => println!("Nothing loaded - 'open' an entity set first"),
    }
}

/// Collect the followable links of the current view in display order.
///
/// For a single entity these are its navigation-link and self-link fields;
/// for a collection, each item's self link labelled by the item's title.
fn view_links(view: Option<&View>) -> Vec<LinkEntry> {
    let mut links = Vec::new();
    match view {
        Some(View::Single { entity }) => {
            if let Some(fieldmap) = entity.as_object() {
                for (key, value) in fieldmap {
                    match classify(key, value) {
                        FieldKind::Navigation { label, target } => {
                            links.push(LinkEntry { label, target })
                        }
                        FieldKind::SelfLink { target } => links.push(LinkEntry {
                            label: "Self".to_string(),
                            target,
                        }),
                        FieldKind::Primitive | FieldKind::Nested => {}
                    }
                }
            }
        }
        Some(View::Collection { items, .. }) => {
            for item in items {
                if let Some(target) = item.get(SELF_LINK_KEY).and_then(Value::as_str) {
                    links.push(LinkEntry {
                        label: title_for(item, "(untitled)"),
                        target: target.to_string(),
                    });
                }
            }
        }
        None => {}
    }
    links
}
