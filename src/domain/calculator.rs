//! Itemized FOB/CFR/CIF quote computation.

use tracing::debug;

use super::{
    entities::{
        ChargeLine, ContainerType, DualAmount, Incoterms, LocalAmount, LogisticsQuote,
        PortChargeItem, PortCharges, ShipmentQuoteRequest,
    },
    error::QuoteError,
    money::{format_local, format_usd},
    rate_tables::RateTables,
};

/// Request values after numeric coercion, ready for rule checks.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRequest<'a> {
    pub incoterms: Incoterms,
    pub departure_city: &'a str,
    pub departure_port: &'a str,
    pub destination_port: &'a str,
    pub container_type: ContainerType,
    pub cbm: f64,
    pub weight_kg: f64,
    pub cargo_value_usd: f64,
    pub margin_percent: f64,
    pub exchange_rate: f64,
}

/// Binds a set of rate tables; quoting borrows them read-only.
#[derive(Clone, Debug)]
pub struct LogisticsCalculator {
    tables: RateTables,
}

impl LogisticsCalculator {
    pub fn new(tables: RateTables) -> Self {
        Self { tables }
    }

    pub fn quote(
        &self,
        request: &ShipmentQuoteRequest,
        exchange_rate: Option<f64>,
    ) -> Result<LogisticsQuote, QuoteError> {
        compute_quote(&self.tables, request, exchange_rate)
    }
}

impl Default for LogisticsCalculator {
    fn default() -> Self {
        Self::new(RateTables::default())
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0))
        .unwrap_or(0.0)
}

/// Clamps measurements to >= 0 and replaces a degenerate exchange rate with the table default.
pub fn normalize<'a>(
    request: &'a ShipmentQuoteRequest,
    exchange_rate: Option<f64>,
    tables: &RateTables,
) -> NormalizedRequest<'a> {
    let exchange_rate = match exchange_rate {
        Some(rate) if rate.is_finite() && rate > 0.0 => rate,
        other => {
            debug!(
                supplied = ?other,
                fallback = tables.default_exchange_rate,
                "exchange rate unusable, substituting default"
            );
            tables.default_exchange_rate
        }
    };

    NormalizedRequest {
        incoterms: request.incoterms,
        departure_city: &request.departure_city,
        departure_port: &request.departure_port,
        destination_port: &request.destination_port,
        container_type: request.container_type,
        cbm: non_negative(request.cbm),
        weight_kg: non_negative(request.weight_kg),
        cargo_value_usd: non_negative(request.cargo_value_usd),
        margin_percent: non_negative(Some(request.margin_percent)),
        exchange_rate,
    }
}

/// Table lookups that survived validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidatedRates {
    /// `None` for LCL, which is priced per revenue ton instead.
    pub fcl_freight_usd: Option<f64>,
    pub inland_transport_local: f64,
}

/// Applies the business rules in order and stops at the first violation.
pub fn validate(
    request: &NormalizedRequest<'_>,
    tables: &RateTables,
) -> Result<ValidatedRates, QuoteError> {
    if request.container_type.is_lcl() && request.cbm == 0.0 && request.weight_kg == 0.0 {
        return Err(QuoteError::InvalidCargoSpec);
    }

    if request.incoterms == Incoterms::Cif && request.cargo_value_usd == 0.0 {
        return Err(QuoteError::MissingCargoValue);
    }

    let fcl_freight_usd = if request.container_type.is_lcl() {
        None
    } else {
        let rate = tables
            .fcl_rate(
                request.departure_port,
                request.destination_port,
                request.container_type,
            )
            .ok_or_else(|| QuoteError::UnsupportedLane {
                departure_port: request.departure_port.to_string(),
                destination_port: request.destination_port.to_string(),
                container_type: request.container_type,
            })?;
        Some(rate)
    };

    let inland_transport_local = tables
        .inland_rate(request.departure_city, request.departure_port)
        .ok_or_else(|| QuoteError::UnsupportedInlandRoute {
            departure_city: request.departure_city.to_string(),
            departure_port: request.departure_port.to_string(),
        })?;

    Ok(ValidatedRates {
        fcl_freight_usd,
        inland_transport_local,
    })
}

/// Billable LCL unit: the larger of volume and weight expressed in CBM.
pub fn revenue_tons(cbm: f64, weight_kg: f64, kg_per_cbm: f64) -> f64 {
    cbm.max(weight_kg / kg_per_cbm)
}

pub fn compute_quote(
    tables: &RateTables,
    request: &ShipmentQuoteRequest,
    exchange_rate: Option<f64>,
) -> Result<LogisticsQuote, QuoteError> {
    let input = normalize(request, exchange_rate, tables);
    let rates = validate(&input, tables)?;
    let rate = input.exchange_rate;
    let currency = &tables.local_currency;

    let (ocean_freight_usd, charge_units) = match rates.fcl_freight_usd {
        Some(flat) => (flat, 1.0),
        None => {
            let rt = revenue_tons(input.cbm, input.weight_kg, tables.kg_per_cbm);
            (rt * tables.lcl_base_rate_usd, rt.max(tables.lcl_min_charge_units))
        }
    };

    let items: Vec<PortChargeItem> = tables
        .port_charges
        .iter()
        .map(|charge| PortChargeItem {
            name: charge.name.clone(),
            amount_usd: format_usd(charge.usd * charge_units),
        })
        .collect();
    let total_port_charges_usd: f64 = items.iter().map(|item| item.amount_usd.raw).sum();

    let insurance_usd = if input.incoterms == Incoterms::Cif {
        (input.cargo_value_usd + ocean_freight_usd) * tables.insurance_rate * tables.insurance_loading
    } else {
        0.0
    };

    let inland_transport_local = rates.inland_transport_local;
    let export_customs_local = tables.export_customs_fee_local;

    let ocean_included = input.incoterms.includes_ocean_freight();
    let insurance_included = input.incoterms.includes_insurance();

    let included_ocean_usd = if ocean_included { ocean_freight_usd } else { 0.0 };
    let included_insurance_usd = if insurance_included { insurance_usd } else { 0.0 };

    let subtotal_usd = included_ocean_usd
        + included_insurance_usd
        + total_port_charges_usd
        + inland_transport_local / rate
        + export_customs_local / rate;
    let margin_amount_usd = subtotal_usd * (input.margin_percent / 100.0);
    let final_quote_usd = subtotal_usd + margin_amount_usd;

    debug!(
        incoterms = %input.incoterms,
        container = %input.container_type,
        lane = %format!("{} -> {}", input.departure_port, input.destination_port),
        ocean_freight_usd,
        insurance_usd,
        subtotal_usd,
        final_quote_usd,
        exchange_rate = rate,
        "computed logistics quote"
    );

    let dual = |usd: f64| DualAmount {
        usd: format_usd(usd),
        local: format_local(usd * rate, currency),
    };

    Ok(LogisticsQuote {
        incoterms: input.incoterms,
        ocean_freight: ChargeLine {
            usd: format_usd(ocean_freight_usd),
            local: format_local(ocean_freight_usd * rate, currency),
            is_included: ocean_included,
        },
        insurance: ChargeLine {
            usd: format_usd(insurance_usd),
            local: format_local(insurance_usd * rate, currency),
            is_included: insurance_included,
        },
        port_charges: PortCharges {
            items,
            total_usd: format_usd(total_port_charges_usd),
            total_local: format_local(total_port_charges_usd * rate, currency),
        },
        inland_transport: LocalAmount {
            local: format_local(inland_transport_local, currency),
        },
        export_customs: LocalAmount {
            local: format_local(export_customs_local, currency),
        },
        subtotal_cost: dual(subtotal_usd),
        margin_amount: dual(margin_amount_usd),
        final_quote: dual(final_quote_usd),
        margin_percent: input.margin_percent,
        local_currency: currency.code.clone(),
        exchange_rate: rate,
    })
}
