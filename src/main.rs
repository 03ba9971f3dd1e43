mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use export_logistics_quoter::domain::{
    render_quotation, LogisticsCalculator, LogisticsQuote, QuoteError, ShipmentQuoteRequest,
};
use export_logistics_quoter::infra::{ExchangeRateClient, RateSnapshot, DEFAULT_HISTORY_DAYS};
use export_logistics_quoter::util::persistence::{
    resolve_rate_tables, save_rate_tables, save_user_rate_tables,
};

use crate::cli::{Cli, Commands, QuoteArgs};

/// Exit code for a request the calculator refused.
const EXIT_QUOTE_REJECTED: u8 = 2;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Quote(args) => run_quote(&cli, args).await,
        Commands::Rates { history, no_cache } => run_rates(&cli, *history, *no_cache).await,
        Commands::Tables { export, install } => run_tables(&cli, export.as_deref(), *install),
    }
}

async fn run_quote(cli: &Cli, args: &QuoteArgs) -> anyhow::Result<ExitCode> {
    let request = args.to_request()?;
    let tables = resolve_rate_tables(cli.tables.as_deref())?;
    let calculator = LogisticsCalculator::new(tables);

    let (rate, source) = if let Some(rate) = args.rate {
        (Some(rate), "manual".to_string())
    } else if args.offline {
        (None, "default".to_string())
    } else {
        let client = ExchangeRateClient::new().context("failed to build exchange-rate client")?;
        let snapshot = client.latest().await;
        (Some(snapshot.rates.usd), snapshot.source)
    };

    let result = calculator.quote(&request, rate);
    let (body, exit_code) = quote_report(&request, &result, &source);

    match &result {
        Ok(quote) if !cli.json => {
            println!("{}", render_quotation(quote, &request));
            println!();
            println!(
                "Exchange rate: 1 USD = {} {} (source: {source})",
                quote.exchange_rate, quote.local_currency
            );
        }
        Err(error) => {
            warn!(kind = error.kind(), %error, "quote rejected");
            if !cli.json {
                eprintln!("error: {error}");
            }
        }
        Ok(_) => {}
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(ExitCode::from(exit_code))
}

/// JSON body and exit status for one quote attempt.
fn quote_report(
    request: &ShipmentQuoteRequest,
    result: &Result<LogisticsQuote, QuoteError>,
    source: &str,
) -> (Value, u8) {
    match result {
        Ok(quote) => (
            json!({
                "request": request,
                "quote": quote,
                "exchange_source": source,
            }),
            0,
        ),
        Err(error) => (
            json!({
                "error": { "kind": error.kind(), "message": error.to_string() }
            }),
            EXIT_QUOTE_REJECTED,
        ),
    }
}

async fn run_rates(cli: &Cli, history: Option<u32>, no_cache: bool) -> anyhow::Result<ExitCode> {
    let mut client = ExchangeRateClient::new().context("failed to build exchange-rate client")?;
    if no_cache {
        client = client.with_disk_cache(None);
    }

    let snapshot = client.latest().await;
    let days = history.map(|d| if d == 0 { DEFAULT_HISTORY_DAYS } else { d });
    let points = match days {
        Some(days) => Some(client.history(days).await),
        None => None,
    };

    if cli.json {
        let mut body = json!({
            "rates": snapshot.rates,
            "source": snapshot.source,
            "status": snapshot.status,
            "timestamp": snapshot.timestamp(),
        });
        if let Some(points) = &points {
            body["history"] = serde_json::to_value(points)?;
        }
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(ExitCode::SUCCESS);
    }

    print_snapshot(&snapshot);
    if let Some(points) = points {
        println!();
        println!("{:<12}{:>10}{:>10}{:>10}{:>10}", "date", "USD", "EUR", "JPY100", "CNY");
        for point in &points {
            println!(
                "{:<12}{:>10.2}{:>10.2}{:>10.2}{:>10.2}",
                point.date, point.rates.usd, point.rates.eur, point.rates.jpy_100, point.rates.cny
            );
        }
        if points.is_empty() {
            println!("(no history available)");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_snapshot(snapshot: &RateSnapshot) {
    println!(
        "Source: {} ({:?}, {})",
        snapshot.source,
        snapshot.status,
        snapshot.timestamp()
    );
    println!("1 USD    = {:.2}", snapshot.rates.usd);
    println!("1 EUR    = {:.2}", snapshot.rates.eur);
    println!("100 JPY  = {:.2}", snapshot.rates.jpy_100);
    println!("1 CNY    = {:.2}", snapshot.rates.cny);
}

fn run_tables(
    cli: &Cli,
    export: Option<&std::path::Path>,
    install: bool,
) -> anyhow::Result<ExitCode> {
    let tables = resolve_rate_tables(cli.tables.as_deref())?;

    if let Some(path) = export {
        save_rate_tables(path, &tables)?;
        eprintln!("wrote rate tables to {}", path.display());
    }
    if install {
        let path = save_user_rate_tables(&tables)?;
        eprintln!("installed rate tables at {}", path.display());
    }

    if export.is_none() && !install {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&tables)?);
        } else {
            println!("Local currency: {}", tables.local_currency.code);
            for (from, lanes) in &tables.freight_rates {
                for (to, rates) in lanes {
                    let prices: Vec<String> = rates
                        .iter()
                        .map(|(container, usd)| format!("{container} ${usd}"))
                        .collect();
                    println!("{from} → {to}: {}", prices.join(", "));
                }
            }
            let schedule: Vec<String> = tables
                .port_charges
                .iter()
                .map(|charge| format!("{} ${}", charge.name, charge.usd))
                .collect();
            println!("Port charges: {}", schedule.join(", "));
            println!(
                "LCL ${} per RT ({} kg = 1 CBM), customs {} {}",
                tables.lcl_base_rate_usd,
                tables.kg_per_cbm,
                tables.export_customs_fee_local,
                tables.local_currency.code
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use export_logistics_quoter::domain::{ContainerType, Incoterms};

    fn busan_la(incoterms: Incoterms) -> ShipmentQuoteRequest {
        ShipmentQuoteRequest::new(incoterms, "구미", "부산항", "LA", ContainerType::Ft20)
    }

    #[test]
    fn rejected_quote_reports_error_object_and_exit_code() {
        let request = busan_la(Incoterms::Cif);
        let result = LogisticsCalculator::default().quote(&request, Some(1400.0));

        let (body, code) = quote_report(&request, &result, "manual");

        assert_eq!(code, EXIT_QUOTE_REJECTED);
        assert_eq!(code, 2);
        assert_eq!(
            body,
            json!({
                "error": {
                    "kind": "MissingCargoValue",
                    "message": "CIF requires cargo value"
                }
            })
        );
    }

    #[test]
    fn accepted_quote_reports_request_quote_and_source() {
        let request = busan_la(Incoterms::Fob);
        let result = LogisticsCalculator::default().quote(&request, Some(1400.0));

        let (body, code) = quote_report(&request, &result, "fawazahmed0");

        assert_eq!(code, 0);
        assert_eq!(body["exchange_source"], "fawazahmed0");
        assert_eq!(body["request"]["incoterms"], "FOB");
        assert_eq!(body["quote"]["final_quote"]["usd"]["formatted"], "$562.50");
        assert!(body.get("error").is_none());
    }
}
