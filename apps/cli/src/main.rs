use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use client_core::{
    AmortizationClient, ClientError, ComparisonPanel, DisplaySnapshot, HttpLoanServices,
    PresentationController, RasterSurface, SubmitOutcome, TableRow,
};
use rust_decimal::Decimal;
use shared::domain::LoanParameters;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, validate_server_url};

#[derive(Parser, Debug)]
#[command(about = "Amortization schedules with an optional custom repayment comparison")]
struct Args {
    #[arg(long)]
    purchase_price: Decimal,
    /// Annual rate in percent.
    #[arg(long)]
    interest_rate: Decimal,
    #[arg(long)]
    down_payment: Decimal,
    /// Term in years.
    #[arg(long)]
    loan_term: u32,
    /// First payment date, YYYY-MM-DD.
    #[arg(long)]
    start_date: NaiveDate,
    #[arg(long)]
    custom_repayment: Option<Decimal>,
    /// Save the spreadsheet report after calculating.
    #[arg(long)]
    export: bool,
    #[arg(long)]
    server_url: Option<String>,
    /// Schedule rows printed from each end of the table.
    #[arg(long, default_value_t = 6)]
    rows: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }
    let server_url = validate_server_url(&settings.server_url)?;
    info!(server_url = %server_url, download_dir = %settings.download_dir.display(), "starting");

    let services = HttpLoanServices::new(server_url.as_str())?;
    let presenter = PresentationController::with_default_currency(
        Box::new(RasterSurface::new(
            "balance",
            settings.chart_width,
            settings.chart_height,
        )),
        Box::new(RasterSurface::new(
            "breakdown",
            settings.chart_width,
            settings.chart_height,
        )),
        settings.default_currency_symbol.clone(),
    );
    let client = AmortizationClient::new(
        std::sync::Arc::new(services),
        presenter,
        settings.download_dir.clone(),
    );

    let params = LoanParameters {
        purchase_price: args.purchase_price,
        interest_rate: args.interest_rate,
        down_payment: args.down_payment,
        loan_term: args.loan_term,
        start_date: args.start_date,
    };
    client
        .submit_original(params)
        .await
        .context("calculating the loan schedule")?;

    if let Some(amount) = args.custom_repayment {
        match client.submit_custom(amount).await {
            Ok(SubmitOutcome::Applied(state)) => info!(?state, "comparison applied"),
            Ok(SubmitOutcome::Superseded) => {}
            // Shown in the comparison panel below.
            Err(ClientError::ServiceRejection { .. }) => {}
            Err(err) => return Err(err).context("comparing the custom repayment"),
        }
    }

    let snapshot = client
        .with_presenter(|presenter| presenter.snapshot().cloned())
        .await
        .context("nothing was displayed")?;
    print_snapshot(&snapshot, args.rows);

    if args.export {
        let outcome = client
            .export_report()
            .await
            .context("exporting the report")?;
        println!();
        println!(
            "Report saved to {} ({} bytes)",
            outcome.path.display(),
            outcome.size_bytes
        );
    }

    Ok(())
}

fn print_snapshot(snapshot: &DisplaySnapshot, rows: usize) {
    for line in &snapshot.summary_lines {
        println!("{line}");
    }
    println!();

    println!("{}", TableRow::HEADERS.join("\t"));
    let total = snapshot.table.len();
    for (index, row) in snapshot.table.iter().enumerate() {
        if total > rows * 2 && index == rows {
            println!("...\t({} more payments)", total - rows * 2);
        }
        if total > rows * 2 && index >= rows && index < total - rows {
            continue;
        }
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.payment_number, row.date, row.payment, row.principal, row.interest, row.balance
        );
    }

    match &snapshot.comparison {
        ComparisonPanel::Hidden => {}
        ComparisonPanel::Savings { text, .. } => {
            println!();
            println!("{text}");
        }
        ComparisonPanel::Rejected { message } => {
            println!();
            println!("{message}");
        }
    }
}
