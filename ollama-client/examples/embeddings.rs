//! Embedding example.
//!
//! Embeds a small batch and prints the cosine similarity of each pair.
//!
//! ```bash
//! ollama pull nomic-embed-text
//! cargo run --example embeddings
//! ```

#![allow(clippy::print_stdout)]

use ollama_client::prelude::*;

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm(a) * norm(b))
}

fn main() -> Result<()> {
    let ollama = Ollama::with_defaults()?;
    let texts = vec!["The cat sleeps.", "A kitten naps.", "Stock prices fell."];

    let reply = ollama.embed(Request::embedding("nomic-embed-text", texts.clone()))?;
    let vectors = reply.embeddings().unwrap_or_default();

    for (i, a) in vectors.iter().enumerate() {
        for (j, b) in vectors.iter().enumerate().skip(i + 1) {
            println!("{:?} ~ {:?}: {:.3}", texts[i], texts[j], cosine(a, b));
        }
    }

    Ok(())
}
