use mailstate::{Category, Config, MailClient, Result};

/// Print the persisted mailbox, or one category of it, as JSON.
fn run() -> Result<()> {
    let config = Config::resolve();
    let client = MailClient::from_config(&config)?;
    let mailbox = client.mailbox();

    match std::env::args().nth(1) {
        Some(name) => {
            let category: Category = name.parse()?;
            let emails = mailbox.to_vec(category);
            println!("{}", serde_json::to_string_pretty(&emails)?);
        }
        None => {
            for category in Category::ALL {
                log::info!("{category}: {}", mailbox.len(category));
            }
            println!("{}", serde_json::to_string_pretty(mailbox)?);
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("mailstate: {e}");
        std::process::exit(1);
    }
}
