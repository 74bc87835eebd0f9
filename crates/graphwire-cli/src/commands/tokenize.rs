use graphwire_core::tokenize;
use miette::Result;

/// Print the tokens of `line`, one per line or as a JSON array.
pub fn run(line: &str, json: bool) -> Result<()> {
    let tokens = tokenize(line);
    if json {
        let text = serde_json::to_string(&tokens)
            .map_err(|e| miette::miette!("Failed to serialize tokens: {}", e))?;
        println!("{text}");
    } else {
        for token in &tokens {
            println!("{token}");
        }
    }
    Ok(())
}
