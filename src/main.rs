//! upilink command-line entrypoint

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use upilink::bank::{
    AccountNo, CardKind, CardRequest, Credentials, DepositRequest, NewAccount, TransferRequest,
};
use upilink::view::{self, Rendered};
use upilink::{
    Amount, BankApi, Currency, Error, HttpBank, PayReceipt, PaySubmitter, PaymentForm,
    PaymentsView, QrDecoder, QrMode, Result, Session, UpiLinkConfig, logging,
};

#[derive(Parser, Debug)]
#[command(
    name = "upilink",
    version,
    about = "Demo bank client: accounts, cards and UPI QR payments"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to upilink.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Override the backend base URL (e.g. http://localhost:4567/api)
    #[arg(long, value_name = "URL", global = true)]
    api: Option<String>,

    /// Output results as formatted JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check credentials and print the resulting session
    Login(LoginArgs),
    /// Account views and operations
    Accounts {
        #[command(subcommand)]
        command: AccountsCommand,
    },
    /// Card views and requests
    Cards {
        #[command(subcommand)]
        command: CardsCommand,
    },
    /// Generate UPI QR codes
    Qr {
        #[command(subcommand)]
        command: QrCommand,
    },
    /// Pay a UPI id from the logged-in customer's account
    Pay {
        #[command(flatten)]
        auth: CustomerAuth,
        #[command(flatten)]
        form: FormArgs,
        /// Save the confirmed payment's QR code into the export directory
        #[arg(long)]
        export: bool,
    },
    /// Decode a QR image and describe the payment link it holds
    Scan {
        /// PNG or JPEG image containing a QR code
        path: PathBuf,
    },
    /// Check that the backend answers
    Health,
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Customer account number
    #[arg(long, value_name = "ACC_NO", required_unless_present = "admin")]
    account: Option<AccountNo>,
    /// Log in as the bank administrator
    #[arg(long, conflicts_with = "account")]
    admin: bool,
    /// Password
    #[arg(long, env = "UPILINK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct CustomerAuth {
    /// Customer account number
    #[arg(long, value_name = "ACC_NO")]
    account: AccountNo,
    /// Customer password
    #[arg(long, env = "UPILINK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct AdminAuth {
    /// Administrator password
    #[arg(long, env = "UPILINK_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,
}

#[derive(Args, Debug, Default)]
struct FormArgs {
    /// Payee UPI id (e.g. merchant@bank)
    #[arg(long = "upi-id", value_name = "VPA", default_value = "")]
    upi_id: String,
    /// Payee display name
    #[arg(long, default_value = "")]
    name: String,
    /// Amount, rounded to two decimals
    #[arg(long, default_value = "")]
    amount: String,
    /// Transaction note
    #[arg(long, default_value = "")]
    note: String,
}

impl FormArgs {
    fn to_form(&self, config: &UpiLinkConfig) -> PaymentForm {
        let mut form = PaymentForm {
            payee_id: self.upi_id.clone(),
            payee_name: self.name.clone(),
            amount: self.amount.clone(),
            note: self.note.clone(),
        };
        apply_default_payee_name(&mut form, config);
        form
    }
}

#[derive(Subcommand, Debug)]
enum AccountsCommand {
    /// List every account (admin)
    List(AdminAuth),
    /// Open a new account (admin)
    Create {
        #[command(flatten)]
        auth: AdminAuth,
        /// Holder name
        #[arg(long)]
        name: String,
        /// Opening balance
        #[arg(long, default_value = "0")]
        balance: String,
        /// Initial password for the holder
        #[arg(long)]
        initial_password: Option<String>,
    },
    /// Close an account (admin)
    Delete {
        #[command(flatten)]
        auth: AdminAuth,
        /// Account to delete
        acc_no: AccountNo,
    },
    /// Show balance and transactions
    Show(CustomerAuth),
    /// Show any account's balance and transactions (admin)
    View {
        #[command(flatten)]
        auth: AdminAuth,
        /// Account to show
        acc_no: AccountNo,
    },
    /// Credit money to the account
    Deposit {
        #[command(flatten)]
        auth: CustomerAuth,
        /// Amount to deposit
        amount: String,
    },
    /// Move money to another account
    Transfer {
        #[command(flatten)]
        auth: CustomerAuth,
        /// Destination account number
        #[arg(long, value_name = "ACC_NO")]
        to: AccountNo,
        /// Amount to transfer
        #[arg(long)]
        amount: String,
        /// Transfer note
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Download the CSV statement
    Statement {
        #[command(flatten)]
        auth: CustomerAuth,
        /// Output file (defaults to statement_<acc>.csv in the export directory)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum CardsCommand {
    /// List issued cards
    List(CustomerAuth),
    /// Request a new card
    Request {
        #[command(flatten)]
        auth: CustomerAuth,
        /// debit or credit
        #[arg(long, default_value = "debit")]
        kind: CardKind,
    },
}

#[derive(Subcommand, Debug)]
enum QrCommand {
    /// Generate a merchant QR code once
    Static {
        #[command(flatten)]
        form: FormArgs,
        /// Save the code as upi_static.png into the export directory
        #[arg(long)]
        export: bool,
        /// Do not draw the code in the terminal
        #[arg(long)]
        no_art: bool,
    },
    /// Interactive QR that follows edits read from stdin
    Dynamic {
        /// Customer account for `pay` (optional)
        #[arg(long, value_name = "ACC_NO", requires = "password")]
        account: Option<AccountNo>,
        /// Customer password for `pay`
        #[arg(long, env = "UPILINK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Do not draw the code in the terminal
        #[arg(long)]
        no_art: bool,
    },
}

/// Where rendered views go
struct Output {
    json: bool,
}

impl Output {
    fn emit(&self, rendered: &Rendered) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&rendered.json)?);
        } else {
            for line in &rendered.human {
                println!("{line}");
            }
        }
        Ok(())
    }

    fn emit_error(&self, err: &Error) {
        let rendered = view::render_error(err);
        if self.json {
            match serde_json::to_string_pretty(&rendered.json) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{}", rendered.json),
            }
        } else {
            for line in &rendered.human {
                eprintln!("{line}");
            }
        }
    }
}

struct App {
    config: UpiLinkConfig,
    currency: Currency,
    bank: Arc<HttpBank>,
    out: Output,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let out = Output { json: cli.json };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            out.emit_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = UpiLinkConfig::load(cli.config.as_deref())?;
    if let Some(ref url) = cli.api {
        config.api.base_url = url.clone();
    }

    logging::init(&config.logging)?;

    let app = App {
        currency: config.currency()?,
        bank: Arc::new(HttpBank::new(&config.api.base_url)?),
        out: Output { json: cli.json },
        config,
    };
    info!(api = app.bank.base_url(), "upilink starting");

    match cli.command {
        Command::Login(args) => handle_login(&app, args).await,
        Command::Accounts { command } => handle_accounts(&app, command).await,
        Command::Cards { command } => handle_cards(&app, command).await,
        Command::Qr { command } => handle_qr(&app, command).await,
        Command::Pay { auth, form, export } => handle_pay(&app, &auth, &form, export).await,
        Command::Scan { path } => handle_scan(&app, &path),
        Command::Health => {
            app.bank.health().await?;
            app.out.emit(&Rendered {
                json: json!({ "status": "ok", "api": app.bank.base_url() }),
                human: vec![format!("✓ Backend reachable at {}", app.bank.base_url())],
            })
        }
    }
}

fn apply_default_payee_name(form: &mut PaymentForm, config: &UpiLinkConfig) {
    if form.payee_name.trim().is_empty() {
        if let Some(name) = &config.payments.payee_name {
            form.payee_name = name.clone();
        }
    }
}

async fn customer_session(app: &App, auth: &CustomerAuth) -> Result<Session> {
    app.bank
        .login(&Credentials::Customer {
            acc_no: auth.account,
            password: auth.password.clone(),
        })
        .await
}

async fn admin_session(app: &App, auth: &AdminAuth) -> Result<Session> {
    let session = app
        .bank
        .login(&Credentials::Admin {
            password: auth.admin_password.clone(),
        })
        .await?;
    session.require_admin()?;
    Ok(session)
}

fn positive_amount(text: &str) -> Result<Amount> {
    Amount::parse(text)
        .ok()
        .filter(|amount| amount.is_positive())
        .ok_or_else(|| Error::Validation("Enter a valid amount".to_string()))
}

async fn handle_login(app: &App, args: LoginArgs) -> Result<()> {
    let credentials = match args.account {
        Some(acc_no) if !args.admin => Credentials::Customer {
            acc_no,
            password: args.password,
        },
        _ => Credentials::Admin {
            password: args.password,
        },
    };

    let session = app.bank.login(&credentials).await?;
    app.out.emit(&view::render_session(&session))
}

async fn handle_accounts(app: &App, command: AccountsCommand) -> Result<()> {
    match command {
        AccountsCommand::List(auth) => {
            let session = admin_session(app, &auth).await?;
            let accounts = app.bank.list_accounts().await?;
            app.out.emit(&view::render_accounts(&session, &accounts))
        }
        AccountsCommand::Create {
            auth,
            name,
            balance,
            initial_password,
        } => {
            if name.trim().is_empty() {
                return Err(Error::Validation("Enter a name".to_string()));
            }
            let balance = Amount::parse(&balance)?;
            let session = admin_session(app, &auth).await?;
            let account = app
                .bank
                .create_account(&NewAccount {
                    name: name.trim().to_string(),
                    balance,
                    password: initial_password.filter(|p| !p.is_empty()),
                })
                .await?;
            info!(acc_no = account.acc_no, "account created");
            app.out.emit(&view::render_account(&session, &account))
        }
        AccountsCommand::Delete { auth, acc_no } => {
            let session = admin_session(app, &auth).await?;
            app.bank.delete_account(acc_no).await?;
            app.out.emit(&view::render_ack(
                &session,
                &format!("Account {acc_no} deleted"),
                None,
            ))
        }
        AccountsCommand::Show(auth) => {
            let session = customer_session(app, &auth).await?;
            let account = app.bank.account(session.customer_account()?).await?;
            app.out.emit(&view::render_account(&session, &account))
        }
        AccountsCommand::View { auth, acc_no } => {
            let session = admin_session(app, &auth).await?;
            let account = app.bank.account(acc_no).await?;
            app.out.emit(&view::render_account(&session, &account))
        }
        AccountsCommand::Deposit { auth, amount } => {
            let amount = positive_amount(&amount)?;
            let session = customer_session(app, &auth).await?;
            let reply = app
                .bank
                .deposit(session.customer_account()?, &DepositRequest { amount })
                .await?;
            app.out.emit(&view::render_ack(
                &session,
                &format!("Deposited ₹{amount}"),
                reply.balance,
            ))
        }
        AccountsCommand::Transfer {
            auth,
            to,
            amount,
            note,
        } => {
            let amount = positive_amount(&amount)?;
            let session = customer_session(app, &auth).await?;
            let reply = app
                .bank
                .transfer(
                    session.customer_account()?,
                    &TransferRequest {
                        target: to,
                        amount,
                        note: note.trim().to_string(),
                    },
                )
                .await?;
            let message = reply
                .message
                .clone()
                .unwrap_or_else(|| format!("Transferred ₹{amount} to {to}"));
            app.out
                .emit(&view::render_ack(&session, &message, reply.from_balance))
        }
        AccountsCommand::Statement { auth, out } => {
            let session = customer_session(app, &auth).await?;
            let acc_no = session.customer_account()?;
            let csv = app.bank.statement(acc_no).await?;
            let path = out.unwrap_or_else(|| {
                app.config
                    .payments
                    .export_dir
                    .join(format!("statement_{acc_no}.csv"))
            });
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &csv).await?;
            app.out
                .emit(&view::render_statement_saved(&session, &path, &csv))
        }
    }
}

async fn handle_cards(app: &App, command: CardsCommand) -> Result<()> {
    match command {
        CardsCommand::List(auth) => {
            let session = customer_session(app, &auth).await?;
            let cards = app.bank.cards(session.customer_account()?).await?;
            app.out.emit(&view::render_cards(&session, &cards))
        }
        CardsCommand::Request { auth, kind } => {
            let session = customer_session(app, &auth).await?;
            let acc_no = session.customer_account()?;
            let card = app.bank.request_card(acc_no, &CardRequest { kind }).await?;
            info!(acc_no, card = %card.masked, "card issued");
            app.out.emit(&view::render_cards(&session, &[card]))
        }
    }
}

async fn handle_qr(app: &App, command: QrCommand) -> Result<()> {
    match command {
        QrCommand::Static {
            form,
            export,
            no_art,
        } => {
            let mut payments = PaymentsView::new(app.config.encoder()?, app.currency.clone());
            payments.generate_static(&form.to_form(&app.config));

            if payments.surface().is_empty() {
                let message = payments
                    .status()
                    .map(|status| status.text.clone())
                    .unwrap_or_else(|| QrMode::Static.missing_payee_message().to_string());
                return Err(Error::Validation(message));
            }
            if export {
                payments.export(&app.config.payments.export_dir)?;
            }
            app.out
                .emit(&view::render_payments(&payments, !no_art && !app.out.json))
        }
        QrCommand::Dynamic {
            account,
            password,
            no_art,
        } => {
            let session = match (account, password) {
                (Some(account), Some(password)) => {
                    Some(customer_session(app, &CustomerAuth { account, password }).await?)
                }
                _ => None,
            };
            run_dynamic(app, session, !no_art && !app.out.json).await
        }
    }
}

const DYNAMIC_HELP: &str =
    "Edit with: pa <upi id> | pn <name> | am <amount> | tn <note> | clear | export [dir] | pay | quit";

/// Event loop for the dynamic QR: each stdin line is one user event.
async fn run_dynamic(app: &App, session: Option<Session>, art: bool) -> Result<()> {
    let mut payments = PaymentsView::new(app.config.encoder()?, app.currency.clone());
    payments.switch_mode(QrMode::Dynamic);
    let submitter = PaySubmitter::new(Arc::clone(&app.bank));
    let mut form = PaymentForm::default();
    apply_default_payee_name(&mut form, &app.config);

    if !app.out.json {
        println!("{DYNAMIC_HELP}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        debug!(command, "dynamic QR event");

        match command {
            "" => continue,
            "pa" => {
                form.payee_id = rest.to_string();
                payments.update_dynamic(&form);
            }
            "pn" => {
                form.payee_name = rest.to_string();
                payments.update_dynamic(&form);
            }
            "am" => {
                form.amount = rest.to_string();
                payments.update_dynamic(&form);
            }
            "tn" => {
                form.note = rest.to_string();
                payments.update_dynamic(&form);
            }
            "clear" => payments.clear(),
            "export" => {
                let dir = if rest.trim().is_empty() {
                    app.config.payments.export_dir.clone()
                } else {
                    PathBuf::from(rest.trim())
                };
                if let Err(err) = payments.export(&dir) {
                    debug!(error = %err, "export failed");
                }
            }
            "pay" => {
                let outcome = match &session {
                    Some(session) => match form.pay_intent(&app.currency) {
                        Ok(intent) => submitter.submit(session, &intent).await,
                        Err(err) => Err(err),
                    },
                    None => Err(Error::NotCustomer),
                };
                payments.apply_payment(&outcome);
                if let (Ok(receipt), Some(session)) = (&outcome, &session) {
                    app.out.emit(&view::render_receipt(session, receipt))?;
                }
            }
            "quit" | "exit" => break,
            other => {
                app.out.emit_error(&Error::Validation(format!(
                    "Unknown command '{other}'. {DYNAMIC_HELP}"
                )));
                continue;
            }
        }

        app.out.emit(&view::render_payments(&payments, art))?;
    }

    Ok(())
}

async fn handle_pay(app: &App, auth: &CustomerAuth, form: &FormArgs, export: bool) -> Result<()> {
    let intent = form.to_form(&app.config).pay_intent(&app.currency)?;
    let session = customer_session(app, auth).await?;

    let submitter = PaySubmitter::new(Arc::clone(&app.bank));
    let receipt = submitter.submit(&session, &intent).await?;

    // The debit has happened: from here on nothing may replace the receipt.
    let mut rendered = view::render_receipt(&session, &receipt);
    if export {
        let saved = export_confirmed_qr(app, &receipt);
        if let Err(err) = &saved {
            warn!(error = %err, "payment succeeded but its QR was not saved");
        }
        view::note_export(&mut rendered, saved.as_deref());
    }
    app.out.emit(&rendered)
}

fn export_confirmed_qr(app: &App, receipt: &PayReceipt) -> Result<PathBuf> {
    let mut payments = PaymentsView::new(app.config.encoder()?, app.currency.clone());
    payments.switch_mode(QrMode::Dynamic);
    payments.apply_payment(&Ok(receipt.clone()));
    payments.export(&app.config.payments.export_dir)
}

fn handle_scan(app: &App, path: &Path) -> Result<()> {
    let scanned = QrDecoder::new().decode_file(path)?;
    let intent = scanned.payment_intent(&app.currency);
    app.out.emit(&view::render_scanned(&scanned, intent.as_ref()))
}
