use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Trade term deciding which party bears freight and insurance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Incoterms {
    #[serde(rename = "FOB")]
    Fob,
    #[serde(rename = "CFR")]
    Cfr,
    #[serde(rename = "CIF")]
    Cif,
}

impl Incoterms {
    pub fn code(&self) -> &'static str {
        match self {
            Incoterms::Fob => "FOB",
            Incoterms::Cfr => "CFR",
            Incoterms::Cif => "CIF",
        }
    }

    /// The shipper pays ocean freight under every term except FOB.
    pub fn includes_ocean_freight(&self) -> bool {
        !matches!(self, Incoterms::Fob)
    }

    pub fn includes_insurance(&self) -> bool {
        matches!(self, Incoterms::Cif)
    }
}

impl fmt::Display for Incoterms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Incoterms {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FOB" => Ok(Incoterms::Fob),
            "CFR" => Ok(Incoterms::Cfr),
            "CIF" => Ok(Incoterms::Cif),
            other => Err(format!("unknown incoterms '{other}' (expected FOB, CFR or CIF)")),
        }
    }
}

/// Container booking. FCL sizes are priced per lane, LCL by revenue ton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContainerType {
    #[serde(rename = "20ft")]
    Ft20,
    #[serde(rename = "40ft")]
    Ft40,
    #[serde(rename = "40hc")]
    Ft40Hc,
    #[serde(rename = "LCL")]
    Lcl,
}

impl ContainerType {
    pub fn code(&self) -> &'static str {
        match self {
            ContainerType::Ft20 => "20ft",
            ContainerType::Ft40 => "40ft",
            ContainerType::Ft40Hc => "40hc",
            ContainerType::Lcl => "LCL",
        }
    }

    pub fn is_lcl(&self) -> bool {
        matches!(self, ContainerType::Lcl)
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ContainerType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "20ft" | "20" => Ok(ContainerType::Ft20),
            "40ft" | "40" => Ok(ContainerType::Ft40),
            "40hc" => Ok(ContainerType::Ft40Hc),
            "lcl" => Ok(ContainerType::Lcl),
            other => Err(format!(
                "unknown container type '{other}' (expected 20ft, 40ft, 40hc or LCL)"
            )),
        }
    }
}

pub const DEFAULT_MARGIN_PERCENT: f64 = 5.0;

fn default_margin_percent() -> f64 {
    DEFAULT_MARGIN_PERCENT
}

/// Shipment parameters as entered on the quote form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShipmentQuoteRequest {
    pub incoterms: Incoterms,
    pub departure_city: String,
    pub departure_port: String,
    pub destination_port: String,
    pub container_type: ContainerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cbm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargo_value_usd: Option<f64>,
    #[serde(default = "default_margin_percent")]
    pub margin_percent: f64,
}

impl ShipmentQuoteRequest {
    /// FCL request with the default margin and no cargo measurements.
    pub fn new(
        incoterms: Incoterms,
        departure_city: impl Into<String>,
        departure_port: impl Into<String>,
        destination_port: impl Into<String>,
        container_type: ContainerType,
    ) -> Self {
        Self {
            incoterms,
            departure_city: departure_city.into(),
            departure_port: departure_port.into(),
            destination_port: destination_port.into(),
            container_type,
            cbm: None,
            weight_kg: None,
            cargo_value_usd: None,
            margin_percent: DEFAULT_MARGIN_PERCENT,
        }
    }

    pub fn with_cbm(mut self, cbm: f64) -> Self {
        self.cbm = Some(cbm);
        self
    }

    pub fn with_weight_kg(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }

    pub fn with_cargo_value_usd(mut self, value: f64) -> Self {
        self.cargo_value_usd = Some(value);
        self
    }

    pub fn with_margin_percent(mut self, margin_percent: f64) -> Self {
        self.margin_percent = margin_percent;
        self
    }
}

/// A rounded money amount together with its display string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencyValue {
    pub raw: f64,
    pub formatted: String,
}

/// A cost line whose inclusion depends on the trade term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeLine {
    pub usd: CurrencyValue,
    pub local: CurrencyValue,
    pub is_included: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DualAmount {
    pub usd: CurrencyValue,
    pub local: CurrencyValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalAmount {
    pub local: CurrencyValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortChargeItem {
    pub name: String,
    pub amount_usd: CurrencyValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortCharges {
    pub items: Vec<PortChargeItem>,
    pub total_usd: CurrencyValue,
    pub total_local: CurrencyValue,
}

/// Fully itemized quote in USD and the local currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticsQuote {
    pub incoterms: Incoterms,
    pub ocean_freight: ChargeLine,
    pub insurance: ChargeLine,
    pub port_charges: PortCharges,
    pub inland_transport: LocalAmount,
    pub export_customs: LocalAmount,
    pub subtotal_cost: DualAmount,
    pub margin_amount: DualAmount,
    pub final_quote: DualAmount,
    pub margin_percent: f64,
    pub local_currency: String,
    pub exchange_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_form_wire_names() {
        let raw = r#"{
            "incoterms": "CIF",
            "departure_city": "구미",
            "departure_port": "부산항",
            "destination_port": "LA",
            "container_type": "40hc",
            "cargo_value_usd": 25000
        }"#;
        let request: ShipmentQuoteRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.incoterms, Incoterms::Cif);
        assert_eq!(request.container_type, ContainerType::Ft40Hc);
        assert_eq!(request.cargo_value_usd, Some(25000.0));
        assert_eq!(request.cbm, None);
        assert_eq!(request.margin_percent, DEFAULT_MARGIN_PERCENT);
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("fob".parse::<Incoterms>().unwrap(), Incoterms::Fob);
        assert_eq!("LCL".parse::<ContainerType>().unwrap(), ContainerType::Lcl);
        assert_eq!("40HC".parse::<ContainerType>().unwrap(), ContainerType::Ft40Hc);
        assert!("DDP".parse::<Incoterms>().is_err());
        assert!("45ft".parse::<ContainerType>().is_err());
    }

    #[test]
    fn inclusion_follows_trade_term() {
        assert!(!Incoterms::Fob.includes_ocean_freight());
        assert!(Incoterms::Cfr.includes_ocean_freight());
        assert!(Incoterms::Cif.includes_ocean_freight());
        assert!(!Incoterms::Cfr.includes_insurance());
        assert!(Incoterms::Cif.includes_insurance());
    }
}
