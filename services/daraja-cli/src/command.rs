//! Command-line parsing and execution
//!
//! Usage: `daraja-cli [--config PATH] [--sandbox|--production] <operation> [args...]`

use daraja::{Environment, Mpesa};
use serde_json::{Value, json};

pub const USAGE: &str = "usage: daraja-cli [--config PATH] [--sandbox|--production] <operation> [args...]

operations:
  authenticate
  stk-push PHONE AMOUNT
  b2c PHONE AMOUNT
  c2b PHONE AMOUNT BILL_REF
  register-urls
  reversal PHONE AMOUNT TRANSACTION_ID
  balance
  b2b AMOUNT PARTY_B ACCOUNT_REF";

/// One operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Authenticate,
    StkPush {
        phone: String,
        amount: u64,
    },
    B2c {
        phone: String,
        amount: u64,
    },
    C2b {
        phone: String,
        amount: u64,
        bill_ref: String,
    },
    RegisterUrls,
    Reversal {
        phone: String,
        amount: u64,
        transaction_id: String,
    },
    Balance,
    B2b {
        amount: u64,
        party_b: String,
        account_reference: String,
    },
}

/// Parsed command line: flags plus the operation.
#[derive(Debug, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: Option<String>,
    pub environment: Option<Environment>,
    pub command: Command,
}

impl Invocation {
    /// Parse arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut config_path = None;
        let mut environment = None;
        let mut positional: Vec<&str> = Vec::new();

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => {
                    let path = iter.next().ok_or("--config requires a path")?;
                    config_path = Some(path.clone());
                }
                "--sandbox" => environment = Some(Environment::Sandbox),
                "--production" => environment = Some(Environment::Production),
                other if other.starts_with("--") => {
                    return Err(format!("unknown flag {other}"));
                }
                other => positional.push(other),
            }
        }

        Ok(Self {
            config_path,
            environment,
            command: Command::parse(&positional)?,
        })
    }
}

impl Command {
    fn parse(args: &[&str]) -> Result<Self, String> {
        let (name, rest) = args.split_first().ok_or("missing operation")?;
        let command = match (*name, rest) {
            ("authenticate", []) => Command::Authenticate,
            ("stk-push", [phone, amount]) => Command::StkPush {
                phone: phone.to_string(),
                amount: parse_amount(amount)?,
            },
            ("b2c", [phone, amount]) => Command::B2c {
                phone: phone.to_string(),
                amount: parse_amount(amount)?,
            },
            ("c2b", [phone, amount, bill_ref]) => Command::C2b {
                phone: phone.to_string(),
                amount: parse_amount(amount)?,
                bill_ref: bill_ref.to_string(),
            },
            ("register-urls", []) => Command::RegisterUrls,
            ("reversal", [phone, amount, transaction_id]) => Command::Reversal {
                phone: phone.to_string(),
                amount: parse_amount(amount)?,
                transaction_id: transaction_id.to_string(),
            },
            ("balance", []) => Command::Balance,
            ("b2b", [amount, party_b, account_reference]) => Command::B2b {
                amount: parse_amount(amount)?,
                party_b: party_b.to_string(),
                account_reference: account_reference.to_string(),
            },
            (name, _) => return Err(format!("unknown operation or wrong arguments: {name}")),
        };
        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Authenticate => "authenticate",
            Command::StkPush { .. } => "stk-push",
            Command::B2c { .. } => "b2c",
            Command::C2b { .. } => "c2b",
            Command::RegisterUrls => "register-urls",
            Command::Reversal { .. } => "reversal",
            Command::Balance => "balance",
            Command::B2b { .. } => "b2b",
        }
    }

    /// Execute against `mpesa`, returning the upstream JSON.
    pub async fn run(&self, mpesa: &Mpesa) -> daraja::Result<Value> {
        match self {
            Command::Authenticate => {
                mpesa.authenticate().await?;
                Ok(json!({ "authenticated": true, "environment": mpesa.environment().await.as_str() }))
            }
            Command::StkPush { phone, amount } => mpesa.stk_push(phone, *amount).await,
            Command::B2c { phone, amount } => mpesa.b2c(phone, *amount).await,
            Command::C2b {
                phone,
                amount,
                bill_ref,
            } => mpesa.c2b(phone, *amount, bill_ref).await,
            Command::RegisterUrls => mpesa.register_c2b_urls().await,
            Command::Reversal {
                phone,
                amount,
                transaction_id,
            } => mpesa.reversal(phone, *amount, transaction_id).await,
            Command::Balance => mpesa.account_balance().await,
            Command::B2b {
                amount,
                party_b,
                account_reference,
            } => mpesa.b2b(*amount, party_b, account_reference).await,
        }
    }
}

fn parse_amount(value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("amount must be a whole number, got {value:?}"))
}
