use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, SqlStorage, credentials};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "merchcoin_admin")]
#[command(about = "Admin utilities for merchcoin (accounts and merch catalog)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./merchcoin.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Merch(Merch),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register an account; the password is prompted for.
    Create(UserCreateArgs),
    /// Print balance, inventory and coin history.
    Show(UserShowArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    /// Starting balance instead of the default grant.
    #[arg(long)]
    coins: Option<i64>,
}

#[derive(Args, Debug)]
struct UserShowArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Merch {
    #[command(subcommand)]
    command: MerchCommand,
}

#[derive(Subcommand, Debug)]
enum MerchCommand {
    Add(MerchAddArgs),
    List,
}

#[derive(Args, Debug)]
struct MerchAddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    price: i64,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if let Err(err) = credentials::validate_password(&p1) {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print(format!("{err}\r\n"))
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let mut options = ConnectOptions::new(database_url);
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let storage = SqlStorage::new(db);

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let mut builder = Engine::builder(storage);
            if let Some(coins) = args.coins {
                builder = builder.initial_balance(coins);
            }
            let engine = builder.build().await?;
            let password = prompt_password_twice()?;

            match engine.register(&args.username, &password).await {
                Ok(account) => println!(
                    "created user: {} (id {}, {} coins)",
                    account.username, account.id, account.coins
                ),
                Err(EngineError::AccountAlreadyExists(username)) => {
                    eprintln!("user already exists: {username}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::User(User {
            command: UserCommand::Show(args),
        }) => {
            let engine = Engine::builder(storage).build().await?;
            let account = match engine.account_by_name(&args.username).await {
                Ok(account) => account,
                Err(EngineError::AccountNotFound(_)) => {
                    eprintln!("user not found: {}", args.username);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };
            let info = engine.account_info(account.id).await?;

            println!("{} (id {}): {} coins", account.username, account.id, info.account.coins);
            println!("inventory:");
            for owned in &info.inventory {
                println!("  {} x{}", owned.item, owned.quantity);
            }
            println!("received:");
            for entry in &info.history.received {
                println!("  {} {:>6} from {}", entry.created_at, entry.amount, entry.counterparty);
            }
            println!("sent:");
            for entry in &info.history.sent {
                match &entry.item {
                    Some(item) => println!("  {} {:>6} for {item}", entry.created_at, entry.amount),
                    None => println!(
                        "  {} {:>6} to {}",
                        entry.created_at, entry.amount, entry.counterparty
                    ),
                }
            }
        }
        Command::Merch(Merch {
            command: MerchCommand::Add(args),
        }) => {
            let engine = Engine::builder(storage).build().await?;
            match engine.add_catalog_item(&args.name, args.price).await {
                Ok(item) => println!("added merch: {} for {} coins", item.name, item.price),
                Err(EngineError::ItemAlreadyExists(name)) => {
                    eprintln!("merch already exists: {name}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Merch(Merch {
            command: MerchCommand::List,
        }) => {
            let engine = Engine::builder(storage).build().await?;
            for item in engine.catalog().await? {
                println!("{:<12} {:>5}", item.name, item.price);
            }
        }
    }

    Ok(())
}
