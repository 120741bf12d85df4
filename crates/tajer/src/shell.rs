// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tajer shell` command implementation.
//!
//! Launches an interactive REPL that talks to the dialogue engine as the
//! customer given by `--phone`. Messages go through the same pipeline as
//! webhook traffic, including storage, so a shell session leaves real
//! customers and orders behind.

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tajer_config::TajerConfig;
use tajer_core::{StorageAdapter, TajerError, normalize_phone};
use tajer_dialogue::Reply;

use crate::app;

/// Runs the `tajer shell` interactive REPL.
pub async fn run_shell(config: TajerConfig, phone: &str) -> Result<(), TajerError> {
    let phone = normalize_phone(phone, &config.shop.default_country_code)
        .ok_or_else(|| TajerError::Config(format!("not a usable phone number: {phone}")))?;

    let app = app::build(&config).await?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| TajerError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("{} shell", config.shop.name).bold().green());
    println!("Chatting as {}.", phone.cyan());
    println!(
        "Type {} to exit, {} to show the conversation state.\n",
        "/quit".yellow(),
        "/state".yellow()
    );

    let prompt = format!("{}> ", phone.green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed == "/state" {
                    match app.storage.get_customer_by_phone(&phone).await {
                        Ok(Some(customer)) => match app.engine.store().state(customer.id).await {
                            Ok(state) => println!("{}", format!("{state:?}").dimmed()),
                            Err(e) => eprintln!("{}: {e}", "error".red()),
                        },
                        Ok(None) => println!("{}", "no conversation yet".dimmed()),
                        Err(e) => eprintln!("{}: {e}", "error".red()),
                    }
                    continue;
                }

                let reply = app.engine.handle_message(&phone, trimmed).await;
                println!("{}\n", render_reply(&reply));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    app.storage.close().await?;
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Formats a reply for the terminal. Images are shown as their URL.
fn render_reply(reply: &Reply) -> String {
    match &reply.image {
        Some(image) => format!("[image] {}\n{}", image.url, reply.text),
        None => reply.text.clone(),
    }
}
