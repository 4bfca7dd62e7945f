//! Interactive stdin gates for the workflow.
//!
//! The whole run is driven by a handful of line-oriented prompts; anything
//! scriptable goes through CLI flags instead, so these stay deliberately
//! plain. EOF on stdin reads as an empty reply, which every caller treats as
//! a decline.

use std::io::{self, Write};

/// Ask a free-text question and return the trimmed reply.
pub fn ask(question: &str) -> io::Result<String> {
    print!("{question}");
    io::stdout().flush()?;

    let mut line = String::new();
    let bytes_read = io::stdin().read_line(&mut line)?;
    if bytes_read == 0 {
        // EOF: behave like an empty (declining) reply.
        return Ok(String::new());
    }
    Ok(line.trim().to_string())
}

/// Yes/no gate. Anything but an explicit yes declines.
pub fn confirm(question: &str) -> io::Result<bool> {
    let reply = ask(&format!("{question} (Y/N): "))?;
    Ok(matches!(reply.to_ascii_uppercase().as_str(), "Y" | "YES"))
}
