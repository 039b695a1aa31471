//! Basic Anthropic client usage example

use anthropic_client::{AnthropicClient, Message, MessagesRequest, DEFAULT_MODEL};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize from environment
    let client = AnthropicClient::from_env()?;

    println!("=== Message ===");
    let response = client
        .messages(
            MessagesRequest::new(DEFAULT_MODEL)
                .system("You are an expert in industrial components.")
                .message(Message::user(
                    "Name three specifications found on a pressure transmitter datasheet.",
                ))
                .temperature(0.0)
                .max_tokens(200),
        )
        .await?;

    println!("Response: {}", response.content);
    if let Some(usage) = response.usage {
        println!(
            "Tokens: {} in / {} out",
            usage.input_tokens, usage.output_tokens
        );
    }

    Ok(())
}
