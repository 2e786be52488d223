//! Tool calling example.
//!
//! Offers a weather function to the model and prints the calls it asks for.
//!
//! ```bash
//! ollama pull llama3.1
//! cargo run --example tool_calling
//! ```

#![allow(clippy::print_stdout)]

use ollama_client::prelude::*;
use serde_json::json;

fn main() -> Result<()> {
    let ollama = Ollama::with_defaults()?;

    let tools = json!([{
        "type": "function",
        "function": {
            "name": "get_current_weather",
            "description": "Get the current weather for a city",
            "parameters": {
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "The name of the city"}
                },
                "required": ["location"]
            }
        }
    }]);

    let request = Request::chat(
        "llama3.1",
        vec![Message::user("What is the weather today in Paris?")],
    )
    .tools(tools);
    let reply = ollama.chat(request)?;

    match reply.tool_calls() {
        Some(calls) => {
            for call in calls {
                println!(
                    "{}({})",
                    call["function"]["name"], call["function"]["arguments"]
                );
            }
        }
        None => println!("{reply}"),
    }

    Ok(())
}
