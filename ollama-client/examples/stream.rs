//! Streaming generation example.
//!
//! Prints tokens as they arrive and stops after the first sentence.
//!
//! ```bash
//! ollama pull llama3
//! cargo run --example stream
//! ```

#![allow(clippy::print_stdout)]

use std::io::{Write, stdout};

use ollama_client::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter("ollama_client=debug")
        .init();

    let ollama = Ollama::with_defaults()?;
    let request = Request::generate("llama3", "Tell me a short story about a lighthouse.");

    let finished = ollama.generate_stream(request, |frame: Response| {
        let token = frame.as_simple_string();
        print!("{token}");
        let _ = stdout().flush();
        if token.contains('.') {
            StreamControl::Stop
        } else {
            StreamControl::Continue
        }
    })?;
    println!();
    println!("[finished: {finished}]");

    Ok(())
}
