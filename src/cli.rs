use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use export_logistics_quoter::domain::{ContainerType, Incoterms, ShipmentQuoteRequest};
use export_logistics_quoter::util::persistence::{load_request, ConfigError};

#[derive(Parser, Debug)]
#[command(
    name = "export-logistics-quoter",
    version,
    about = "Itemized FOB/CFR/CIF logistics quotes for export shipments"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Rate tables JSON (defaults to the per-user file, then built-in tables)"
    )]
    pub tables: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Price a shipment.
    Quote(QuoteArgs),
    /// Show current exchange rates.
    Rates {
        #[arg(long, help = "Also list the last N days")]
        history: Option<u32>,
        #[arg(long, default_value_t = false, help = "Do not read or write the disk cache")]
        no_cache: bool,
    },
    /// Print or export the active rate tables.
    Tables {
        #[arg(long, help = "Write the tables to this file")]
        export: Option<PathBuf>,
        #[arg(long, default_value_t = false, help = "Write the tables to the per-user config file")]
        install: bool,
    },
}

#[derive(Args, Debug)]
pub struct QuoteArgs {
    #[arg(long, help = "Read the shipment from a JSON file instead of flags")]
    pub request: Option<PathBuf>,
    #[arg(long)]
    pub incoterms: Option<Incoterms>,
    #[arg(long = "city", help = "Departure city (inland origin)")]
    pub departure_city: Option<String>,
    #[arg(long = "from", help = "Departure port")]
    pub departure_port: Option<String>,
    #[arg(long = "to", help = "Destination port")]
    pub destination_port: Option<String>,
    #[arg(long = "container", help = "20ft, 40ft, 40hc or LCL")]
    pub container_type: Option<ContainerType>,
    #[arg(long)]
    pub cbm: Option<f64>,
    #[arg(long = "weight", help = "Gross weight in kg")]
    pub weight_kg: Option<f64>,
    #[arg(long = "cargo-value", help = "Cargo value in USD (required for CIF)")]
    pub cargo_value_usd: Option<f64>,
    #[arg(long = "margin", help = "Safety margin percent [default: 5]")]
    pub margin_percent: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Local units per USD; skips fetching"
    )]
    pub rate: Option<f64>,
    #[arg(long, default_value_t = false, help = "Do not fetch rates; use the table default")]
    pub offline: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    File(#[from] ConfigError),
    #[error("missing required flags: {}", .0.join(", "))]
    MissingFlags(Vec<&'static str>),
}

impl QuoteArgs {
    /// Builds the request from `--request` or from the individual flags.
    /// Flags given next to `--request` override the file's values.
    pub fn to_request(&self) -> Result<ShipmentQuoteRequest, RequestError> {
        let mut request = match &self.request {
            Some(path) => load_request(path)?,
            None => self.request_from_flags()?,
        };

        if let Some(incoterms) = self.incoterms {
            request.incoterms = incoterms;
        }
        if let Some(city) = &self.departure_city {
            request.departure_city = city.clone();
        }
        if let Some(port) = &self.departure_port {
            request.departure_port = port.clone();
        }
        if let Some(port) = &self.destination_port {
            request.destination_port = port.clone();
        }
        if let Some(container) = self.container_type {
            request.container_type = container;
        }
        if let Some(cbm) = self.cbm {
            request.cbm = Some(cbm);
        }
        if let Some(weight) = self.weight_kg {
            request.weight_kg = Some(weight);
        }
        if let Some(value) = self.cargo_value_usd {
            request.cargo_value_usd = Some(value);
        }
        if let Some(margin) = self.margin_percent {
            request.margin_percent = margin;
        }
        Ok(request)
    }

    fn request_from_flags(&self) -> Result<ShipmentQuoteRequest, RequestError> {
        let mut missing = Vec::new();
        if self.incoterms.is_none() {
            missing.push("--incoterms");
        }
        if self.departure_city.is_none() {
            missing.push("--city");
        }
        if self.departure_port.is_none() {
            missing.push("--from");
        }
        if self.destination_port.is_none() {
            missing.push("--to");
        }
        if self.container_type.is_none() {
            missing.push("--container");
        }

        match (
            self.incoterms,
            &self.departure_city,
            &self.departure_port,
            &self.destination_port,
            self.container_type,
        ) {
            (Some(incoterms), Some(city), Some(from), Some(to), Some(container)) => Ok(
                ShipmentQuoteRequest::new(incoterms, city, from, to, container),
            ),
            _ => Err(RequestError::MissingFlags(missing)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use export_logistics_quoter::domain::DEFAULT_MARGIN_PERCENT;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("export-logistics-quoter").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn quote_flags_build_request() {
        let cli = parse(&[
            "quote", "--incoterms", "cif", "--city", "구미", "--from", "부산항", "--to", "LA",
            "--container", "20ft", "--cargo-value", "10000", "--rate", "-5",
        ]);
        let Commands::Quote(args) = cli.command else {
            panic!("expected quote command");
        };
        assert_eq!(args.rate, Some(-5.0));

        let request = args.to_request().unwrap();
        assert_eq!(request.incoterms, Incoterms::Cif);
        assert_eq!(request.cargo_value_usd, Some(10_000.0));
        assert_eq!(request.margin_percent, DEFAULT_MARGIN_PERCENT);
    }

    #[test]
    fn missing_flags_are_listed() {
        let cli = parse(&["quote", "--incoterms", "FOB", "--to", "LA"]);
        let Commands::Quote(args) = cli.command else {
            panic!("expected quote command");
        };
        let error = args.to_request().unwrap_err();
        assert_eq!(
            error.to_string(),
            "missing required flags: --city, --from, --container"
        );
    }

    #[test]
    fn flags_override_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(
            &path,
            r#"{
                "incoterms": "FOB",
                "departure_city": "구미",
                "departure_port": "부산항",
                "destination_port": "LA",
                "container_type": "20ft",
                "cbm": 12.0,
                "margin_percent": 7.0
            }"#,
        )
        .unwrap();
        let request_path = path.to_str().unwrap();

        let cli = parse(&[
            "quote", "--request", request_path, "--incoterms", "CIF", "--container", "40ft",
            "--to", "뉴욕", "--cargo-value", "5000",
        ]);
        let Commands::Quote(args) = cli.command else {
            panic!("expected quote command");
        };
        let request = args.to_request().unwrap();

        assert_eq!(request.incoterms, Incoterms::Cif);
        assert_eq!(request.container_type, ContainerType::Ft40);
        assert_eq!(request.destination_port, "뉴욕");
        assert_eq!(request.cargo_value_usd, Some(5000.0));
        assert_eq!(request.departure_city, "구미");
        assert_eq!(request.departure_port, "부산항");
        assert_eq!(request.cbm, Some(12.0));
        assert_eq!(request.margin_percent, 7.0);
    }

    #[test]
    fn rejects_unknown_container() {
        let result = Cli::try_parse_from([
            "export-logistics-quoter",
            "quote",
            "--container",
            "45ft",
        ]);
        assert!(result.is_err());
    }
}
