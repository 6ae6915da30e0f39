//! Output formatting for human-readable and JSON modes.
//!
//! Human mode uses colored terminal output.
//! JSON mode outputs one JSON object per command on stdout, with no
//! ANSI escapes. Errors always go to stderr.

use colored::Colorize;
use serde_json::{Map, Value};

/// Prints a success line.
pub fn print_success(msg: &str, json_mode: bool) {
    if json_mode {
        let obj = serde_json::json!({ "status": "ok", "message": msg });
        println!("{obj}");
    } else {
        println!("{} {}", "✓".green().bold(), msg);
    }
}

/// Prints labelled fields: aligned `key: value` lines in human mode, a
/// single JSON object in JSON mode.
pub fn print_fields(fields: &[(&str, String)], json_mode: bool) {
    if json_mode {
        let obj: Map<String, Value> = fields
            .iter()
            .map(|(k, v)| ((*k).to_owned(), Value::String(v.clone())))
            .collect();
        println!("{}", Value::Object(obj));
        return;
    }

    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in fields {
        let label = format!("{:<width$}", format!("{key}:"), width = width + 1);
        println!("{}  {}", label.bold(), value);
    }
}

/// Prints a JSON value: compact in JSON mode, pretty otherwise.
pub fn print_json_value(value: &Value, json_mode: bool) {
    if json_mode {
        println!("{value}");
    } else {
        match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Error formatting output: {e}"),
        }
    }
}

/// Prints a warning that must not be missed (e.g. back up this phrase).
pub fn print_warning(msg: &str, json_mode: bool) {
    if !json_mode {
        eprintln!("{} {}", "warning:".yellow().bold(), msg);
    }
}

/// Prints an error message.
pub fn print_error(msg: &str, json_mode: bool) {
    if json_mode {
        let obj = serde_json::json!({ "error": msg });
        eprintln!("{obj}");
    } else {
        eprintln!("{} {}", "error:".red().bold(), msg);
    }
}
