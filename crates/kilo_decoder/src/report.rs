use std::fmt::Write;

use kilo_ledger::EntityId;

use crate::decode::{DecodedError, panic_reason};
use crate::registry::AbiRegistry;

/// Extra leading dots per level of nested `bytes` decoding.
const NESTED_INDENT: usize = 2;

/// Human-readable report of a decoded error.
///
/// Each parameter prints as `Parameter (<type>) = <value>` followed by a
/// blank line. Addresses get their `shard.realm.num` form; `bytes` arguments
/// are decoded in turn, indented with dots.
pub fn render(registry: &AbiRegistry, error: &DecodedError) -> String {
    let mut out = String::new();
    render_into(registry, error, 0, &mut out);
    out
}

fn render_into(registry: &AbiRegistry, error: &DecodedError, indent: usize, out: &mut String) {
    if error.data.is_empty() {
        return;
    }
    let dots = ".".repeat(indent);

    match &error.name {
        Some(name) => {
            let _ = writeln!(out, "{dots}Error is {name}");
        }
        None => {
            let _ = writeln!(out, "{dots}Unknown error data {}", error.data);
        }
    }

    for param in &error.params {
        let _ = writeln!(out, "{dots}Parameter ({}) = {}", param.ty, param.value);

        if param.ty == "address" {
            match EntityId::from_solidity_address(&param.value) {
                Ok(id) => {
                    let _ = writeln!(out, "{dots}=> Hedera address {id}");
                }
                Err(e) => {
                    let _ = writeln!(out, "{dots}Failed to convert Solidity address: {e}");
                }
            }
        }

        if error.name.as_deref() == Some("Panic") {
            if let Some(reason) = panic_reason(&param.value) {
                let _ = writeln!(out, "{dots}=> {reason}");
            }
        }

        if param.ty == "bytes" && param.value != "0x" {
            match registry.decode(&param.value) {
                Ok(inner) => render_into(registry, &inner, indent + NESTED_INDENT, out),
                Err(e) => {
                    let _ = writeln!(out, "{dots}Failed to process nested error: {e}");
                }
            }
        }

        out.push('\n');
    }
}
