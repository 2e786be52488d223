//! Structured output example.
//!
//! Constrains the reply to a JSON schema and parses the result.
//!
//! ```bash
//! ollama pull llama3
//! cargo run --example structured_output
//! ```

#![allow(clippy::print_stdout)]

use ollama_client::prelude::*;
use serde_json::json;

fn main() -> Result<()> {
    let ollama = Ollama::with_defaults()?;

    let schema = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "capital": {"type": "string"},
            "languages": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["name", "capital", "languages"]
    });

    let request = Request::chat("llama3", vec![Message::user("Tell me about Canada.")])
        .format(schema)
        .options(Options::new().temperature(0.0));
    let reply = ollama.chat(request)?;

    let country = ollama_client::json::parse(&reply.as_simple_string())?;
    println!("{}: capital {}", country["name"], country["capital"]);
    println!("languages: {}", country["languages"]);

    Ok(())
}
