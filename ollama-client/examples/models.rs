//! Model management example.
//!
//! Uses the process-wide default client to inspect the server.
//!
//! ```bash
//! cargo run --example models
//! ```

#![allow(clippy::print_stdout)]

use ollama_client::facade;

fn main() -> ollama_client::Result<()> {
    facade::allow_exceptions(false);

    if !facade::is_running() {
        println!("No Ollama server at the default URL.");
        return Ok(());
    }
    println!("Ollama {}", facade::get_version()?);

    println!("Available:");
    for name in facade::list_models()? {
        println!("  {name}");
    }
    println!("Loaded:");
    for name in facade::list_running_models()? {
        println!("  {name}");
    }

    if let Some(first) = facade::list_models()?.first() {
        let info = facade::show_model_info(first, false)?;
        println!("{first} parameters: {}", info["parameters"]);
    }

    Ok(())
}
