use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use estate_core::{FileTokenStore, RegisterForm};
use estate_console::cli::{Cli, Command};
use estate_console::console::query_from;
use estate_console::{Console, Settings, UreqTransport};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())
        .context("failed to load settings")?
        .with_overrides(cli.api_url, cli.asset_url);

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();
    tracing::debug!(api = %settings.api_base_url, session = %settings.session_file.display(), "settings loaded");

    let store = FileTokenStore::new(&settings.session_file);
    let mut console = Console::new(
        &settings.api_base_url,
        &settings.asset_base_url,
        UreqTransport::new(),
        store,
    )?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    match cli.command {
        Command::Login { email, password } => console.login(&mut out, &email, &password)?,
        Command::Register { name, email, password } => {
            console.register(&mut out, RegisterForm { name, email, password })?
        }
        Command::Logout => console.logout(&mut out)?,
        Command::List(args) => console.list(&mut out, query_from(args.actions()))?,
        Command::Browse => console.browse(&mut out, &mut input)?,
        Command::Show { id } => console.show(&mut out, id)?,
        Command::Create { fields, images } => console.create(&mut out, fields.into(), &images)?,
        Command::Edit {
            id,
            changes,
            images,
            remove,
        } => console.edit(&mut out, id, changes.into(), &remove, &images)?,
        Command::Delete { id, yes } => console.delete(&mut out, &mut input, id, yes)?,
    }
    out.flush()?;
    Ok(())
}
