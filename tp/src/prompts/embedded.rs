//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System instruction for the reasoning engine
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Analysis prompt embedding the numbered task list and output contract
pub const ANALYZE: &str = include_str!("../../prompts/analyze.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "analyze" => Some(ANALYZE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
