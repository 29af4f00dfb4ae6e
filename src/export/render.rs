// src/export/render.rs

use std::fmt::Write as _;

use crate::errors::{BuildstampError, Result};
use crate::export::{ConfigBundle, Value};
use crate::types::OutputFormat;

/// Render a bundle for the consumer named by `format`. Keys come out sorted.
pub fn render_bundle(bundle: &ConfigBundle, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(bundle.as_map())
                .map_err(|e| BuildstampError::Other(e.into()))?;
            s.push('\n');
            Ok(s)
        }
        OutputFormat::Toml => {
            toml::to_string(bundle.as_map()).map_err(|e| BuildstampError::Other(e.into()))
        }
        OutputFormat::Env => {
            let mut out = String::new();
            for (key, value) in bundle.iter() {
                let _ = writeln!(out, "{key}={}", env_value(value));
            }
            Ok(out)
        }
    }
}

fn env_value(value: &Value) -> String {
    let raw = value.to_string();
    let plain = !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@+,".contains(c));
    if plain {
        return raw;
    }

    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        match c {
            '"' | '\\' | '$' | '`' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
