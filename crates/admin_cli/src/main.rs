use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{
    AccountKind, Drift, Engine, MoneyCents, NewAccountCmd, NewClientCmd, NewVendorCmd,
    VendorBalance,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "ledger_admin")]
#[command(about = "Admin utilities for the ledger (bootstrap parties, check projections)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./ledger.db?mode=rwc")]
    database_url: String,

    /// Company every command operates on.
    #[arg(long, env = "LEDGER_COMPANY")]
    company: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
    Client(Client),
    Vendor(Vendor),
    /// Report projections that disagree with their event history.
    Reconcile,
    /// Rewrite every drifted projection from its event history.
    Recompute,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Cash,
    Bank,
    MobileBanking,
    CreditCard,
}

impl From<Kind> for AccountKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Cash => AccountKind::Cash,
            Kind::Bank => AccountKind::Bank,
            Kind::MobileBanking => AccountKind::MobileBanking,
            Kind::CreditCard => AccountKind::CreditCard,
        }
    }
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, value_enum, default_value = "cash")]
    kind: Kind,
    /// Opening balance as a decimal amount, e.g. `1500.50`.
    #[arg(long, default_value = "0", value_parser = parse_money, allow_negative_numbers = true)]
    opening: MoneyCents,
}

#[derive(Args, Debug)]
struct Client {
    #[command(subcommand)]
    command: ClientCommand,
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    Create(ClientCreateArgs),
}

#[derive(Args, Debug)]
struct ClientCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    category: Option<String>,
    /// Credit limit as a decimal amount, `0` for none.
    #[arg(long, default_value = "0", value_parser = parse_money)]
    credit_limit: MoneyCents,
    /// Signed opening balance: negative means the client owes money.
    #[arg(long, default_value = "0", value_parser = parse_money, allow_negative_numbers = true)]
    opening: MoneyCents,
}

#[derive(Args, Debug)]
struct Vendor {
    #[command(subcommand)]
    command: VendorCommand,
}

#[derive(Subcommand, Debug)]
enum VendorCommand {
    Create(VendorCreateArgs),
}

#[derive(Args, Debug)]
struct VendorCreateArgs {
    #[arg(long)]
    name: String,
    /// Amount the agency already owes the vendor.
    #[arg(long, value_parser = parse_money, conflicts_with = "opening_advance")]
    opening_due: Option<MoneyCents>,
    /// Amount already prepaid to the vendor.
    #[arg(long, value_parser = parse_money)]
    opening_advance: Option<MoneyCents>,
}

/// Amounts are typed in major units (`12.50`) and stored as cents.
fn parse_money(raw: &str) -> Result<MoneyCents, String> {
    raw.parse::<MoneyCents>().map_err(|err| err.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_drifts(drifts: &[Drift]) {
    for drift in drifts {
        println!(
            "{:?} {}: stored {} expected {}",
            drift.kind, drift.id, drift.stored, drift.expected
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;
    let company = cli.company;

    match cli.command {
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let account = engine
                .new_account(
                    NewAccountCmd::new(&company, args.name, args.kind.into())
                        .opening_balance(args.opening.cents()),
                )
                .await?;
            println!("created account: {} ({})", account.name, account.id);
        }
        Command::Client(Client {
            command: ClientCommand::Create(args),
        }) => {
            let mut cmd = NewClientCmd::new(&company, args.name)
                .credit_limit(args.credit_limit.cents())
                .opening_balance(args.opening.cents());
            if let Some(category) = args.category {
                cmd = cmd.category(category);
            }
            let client = engine.new_client(cmd).await?;
            println!("created client: {} ({})", client.name, client.id);
        }
        Command::Vendor(Vendor {
            command: VendorCommand::Create(args),
        }) => {
            let opening = match (args.opening_due, args.opening_advance) {
                (Some(due), _) => VendorBalance::due(due),
                (None, Some(advance)) => VendorBalance::advance(advance),
                (None, None) => VendorBalance::SETTLED,
            };
            let vendor = engine
                .new_vendor(NewVendorCmd::new(&company, args.name).opening_balance(opening))
                .await?;
            println!("created vendor: {} ({})", vendor.name, vendor.id);
        }
        Command::Reconcile => {
            let drifts = engine.reconcile(&company).await?;
            if drifts.is_empty() {
                println!("all projections consistent");
            } else {
                print_drifts(&drifts);
                std::process::exit(1);
            }
        }
        Command::Recompute => {
            let drifts = engine.recompute_balances(&company).await?;
            print_drifts(&drifts);
            println!("repaired {} projection(s)", drifts.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_read_in_major_units() {
        let cli = Cli::try_parse_from([
            "ledger_admin",
            "--company",
            "acme",
            "client",
            "create",
            "--name",
            "Rahim Travels",
            "--credit-limit",
            "2500",
            "--opening",
            "-120.50",
        ])
        .unwrap();

        let Command::Client(Client {
            command: ClientCommand::Create(args),
        }) = cli.command
        else {
            panic!("expected client create");
        };
        assert_eq!(args.credit_limit, MoneyCents::new(250_000));
        assert_eq!(args.opening, MoneyCents::new(-12_050));
    }

    #[test]
    fn malformed_amounts_are_rejected() {
        assert_eq!(parse_money("1,5").unwrap(), MoneyCents::new(150));
        assert!(parse_money("12.345").is_err());
        assert!(parse_money("abc").is_err());

        let err = Cli::try_parse_from([
            "ledger_admin",
            "--company",
            "acme",
            "vendor",
            "create",
            "--name",
            "Biman",
            "--opening-due",
            "ten",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
