//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print output in the specified format.
pub fn print<T: Serialize + std::fmt::Display>(value: &T, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => print_json(value),
    }
}

/// Print a page of items, one rendered block per item in text mode.
pub fn print_page<T: Serialize>(
    title: &str,
    page: &desk_api::Paged<T>,
    format: &OutputFormat,
    render: impl Fn(&T),
) {
    match format {
        OutputFormat::Text => {
            print_heading(&format!(
                "{} (page {} of {}, {} total)",
                title,
                page.current_page + 1,
                page.total_pages.max(1),
                page.total_items
            ));
            if page.content.is_empty() {
                println!("  (none)");
            }
            for item in &page.content {
                render(item);
            }
        }
        OutputFormat::Json => print_json(page),
    }
}

/// Print a list of items.
pub fn print_list<T: Serialize>(
    title: &str,
    items: &[T],
    format: &OutputFormat,
    render: impl Fn(&T),
) {
    match format {
        OutputFormat::Text => {
            print_heading(title);
            if items.is_empty() {
                println!("  (none)");
            }
            items.iter().for_each(render);
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "status": "success", "message": message })
            );
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({ "status": "error", "message": message })
            );
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// Display helper for optional fields.
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: could not encode output: {}", e),
    }
}
