//! Multi-turn chat example with streaming replies.
//!
//! ```bash
//! ollama pull llama3
//! cargo run --example chat
//! ```

#![allow(clippy::print_stdout)]

use std::io::{Write, stdout};

use ollama_client::prelude::*;

fn main() -> Result<()> {
    let ollama = Ollama::with_defaults()?;
    let questions = ["Why is the sky blue?", "And why is a sunset red?"];

    let mut history = vec![Message::system("Answer in two sentences at most.")];
    for question in questions {
        println!("> {question}");
        history.push(Message::user(question));

        let mut answer = String::new();
        ollama.chat_stream(Request::chat("llama3", history.clone()), |frame: Response| {
            let token = frame.as_simple_string();
            print!("{token}");
            let _ = stdout().flush();
            answer.push_str(&token);
        })?;
        println!();

        history.push(Message::assistant(answer));
    }

    Ok(())
}
