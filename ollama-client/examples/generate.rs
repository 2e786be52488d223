//! Aggregated generation example.
//!
//! Sends one prompt, prints the reply, then continues the same
//! conversation through the returned context.
//!
//! ```bash
//! ollama pull llama3
//! cargo run --example generate
//! ```

#![allow(clippy::print_stdout)]

use ollama_client::prelude::*;

fn main() -> Result<()> {
    let ollama = Ollama::from_env()?;

    let options = Options::new().seed(1).temperature(0.0).num_predict(64);
    let first = ollama.generate(
        Request::generate("llama3", "Name one planet of the solar system.").options(options),
    )?;
    println!("{first}");

    let second = ollama.generate(Request::generate("llama3", "Name another one.").context(&first))?;
    println!("{second}");

    if let Some(usage) = second.usage() {
        println!("[{} prompt + {} generated tokens]", usage.input_tokens, usage.output_tokens);
    }

    Ok(())
}
