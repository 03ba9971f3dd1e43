//! Static freight, inland and port tariffs consulted by the calculator.
//!
//! - Tables are plain data; the calculator borrows them read-only.
//! - The built-in set covers Korean export ports priced in KRW.
//! - Every constant can be overridden from a JSON file (see `util::persistence`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{entities::ContainerType, money::LocalCurrency};

pub const DEFAULT_EXCHANGE_RATE: f64 = 1400.0;
pub const LCL_BASE_RATE_USD: f64 = 80.0;
pub const EXPORT_CUSTOMS_FEE_LOCAL: f64 = 30_000.0;
pub const DEFAULT_INSURANCE_RATE: f64 = 0.003;
/// Insured value is CIF value plus 10%.
pub const INSURANCE_LOADING: f64 = 1.1;
/// 1000 kg is billed like 1 CBM.
pub const KG_PER_CBM: f64 = 1000.0;
/// LCL port charges never scale below one revenue ton.
pub const LCL_MIN_CHARGE_UNITS: f64 = 1.0;

/// lane destination -> container -> USD
pub type LaneRates = BTreeMap<String, BTreeMap<ContainerType, f64>>;

/// One named entry of the port-charge schedule, in USD per container or per RT.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortChargeRate {
    pub name: String,
    pub usd: f64,
}

impl PortChargeRate {
    pub fn new(name: &str, usd: f64) -> Self {
        Self {
            name: name.to_string(),
            usd,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateTables {
    #[serde(default)]
    pub local_currency: LocalCurrency,
    /// departure port -> destination port -> container -> USD
    pub freight_rates: BTreeMap<String, LaneRates>,
    /// departure city -> departure port -> local currency
    pub inland_transport: BTreeMap<String, BTreeMap<String, f64>>,
    /// Applied in order; the quote lists items the same way.
    pub port_charges: Vec<PortChargeRate>,
    #[serde(default = "default_lcl_base_rate")]
    pub lcl_base_rate_usd: f64,
    #[serde(default = "default_export_customs_fee")]
    pub export_customs_fee_local: f64,
    #[serde(default = "default_insurance_rate")]
    pub insurance_rate: f64,
    #[serde(default = "default_insurance_loading")]
    pub insurance_loading: f64,
    #[serde(default = "default_kg_per_cbm")]
    pub kg_per_cbm: f64,
    #[serde(default = "default_lcl_min_charge_units")]
    pub lcl_min_charge_units: f64,
    #[serde(default = "default_exchange_rate")]
    pub default_exchange_rate: f64,
}

fn default_lcl_base_rate() -> f64 {
    LCL_BASE_RATE_USD
}

fn default_export_customs_fee() -> f64 {
    EXPORT_CUSTOMS_FEE_LOCAL
}

fn default_insurance_rate() -> f64 {
    DEFAULT_INSURANCE_RATE
}

fn default_insurance_loading() -> f64 {
    INSURANCE_LOADING
}

fn default_kg_per_cbm() -> f64 {
    KG_PER_CBM
}

fn default_lcl_min_charge_units() -> f64 {
    LCL_MIN_CHARGE_UNITS
}

fn default_exchange_rate() -> f64 {
    DEFAULT_EXCHANGE_RATE
}

impl RateTables {
    /// Tables with no lanes or routes and the default constants.
    pub fn empty() -> Self {
        Self {
            local_currency: LocalCurrency::default(),
            freight_rates: BTreeMap::new(),
            inland_transport: BTreeMap::new(),
            port_charges: Vec::new(),
            lcl_base_rate_usd: LCL_BASE_RATE_USD,
            export_customs_fee_local: EXPORT_CUSTOMS_FEE_LOCAL,
            insurance_rate: DEFAULT_INSURANCE_RATE,
            insurance_loading: INSURANCE_LOADING,
            kg_per_cbm: KG_PER_CBM,
            lcl_min_charge_units: LCL_MIN_CHARGE_UNITS,
            default_exchange_rate: DEFAULT_EXCHANGE_RATE,
        }
    }

    /// Flat FCL price for the exact lane and container, if tabled.
    pub fn fcl_rate(
        &self,
        departure_port: &str,
        destination_port: &str,
        container_type: ContainerType,
    ) -> Option<f64> {
        self.freight_rates
            .get(departure_port)?
            .get(destination_port)?
            .get(&container_type)
            .copied()
    }

    pub fn inland_rate(&self, departure_city: &str, departure_port: &str) -> Option<f64> {
        self.inland_transport
            .get(departure_city)?
            .get(departure_port)
            .copied()
    }

    pub fn with_lane(
        mut self,
        departure_port: &str,
        destination_port: &str,
        rates: &[(ContainerType, f64)],
    ) -> Self {
        let lane = self
            .freight_rates
            .entry(departure_port.to_string())
            .or_default()
            .entry(destination_port.to_string())
            .or_default();
        lane.extend(rates.iter().copied());
        self
    }

    pub fn with_inland_route(mut self, departure_city: &str, departure_port: &str, local: f64) -> Self {
        self.inland_transport
            .entry(departure_city.to_string())
            .or_default()
            .insert(departure_port.to_string(), local);
        self
    }

    pub fn with_port_charge(mut self, name: &str, usd: f64) -> Self {
        self.port_charges.push(PortChargeRate::new(name, usd));
        self
    }

    pub fn lane_count(&self) -> usize {
        self.freight_rates.values().map(BTreeMap::len).sum()
    }
}

impl Default for RateTables {
    fn default() -> Self {
        use ContainerType::{Ft20, Ft40, Ft40Hc};

        let lanes: [(&str, &str, [f64; 3]); 16] = [
            ("부산항", "LA", [1200.0, 2400.0, 2600.0]),
            ("부산항", "뉴욕", [2500.0, 5000.0, 5400.0]),
            ("부산항", "상하이", [300.0, 600.0, 650.0]),
            ("부산항", "도쿄", [500.0, 1000.0, 1100.0]),
            ("부산항", "함부르크", [1800.0, 3500.0, 3800.0]),
            ("부산항", "로테르담", [1700.0, 3400.0, 3700.0]),
            ("부산항", "싱가포르", [400.0, 800.0, 900.0]),
            ("부산항", "호치민", [350.0, 700.0, 800.0]),
            ("인천항", "LA", [1300.0, 2600.0, 2800.0]),
            ("인천항", "칭다오", [200.0, 400.0, 450.0]),
            ("인천항", "상하이", [250.0, 500.0, 550.0]),
            ("인천항", "도쿄", [450.0, 900.0, 1000.0]),
            ("인천항", "호치민", [500.0, 1000.0, 1100.0]),
            ("광양항", "상하이", [280.0, 560.0, 620.0]),
            ("광양항", "도쿄", [480.0, 960.0, 1050.0]),
            ("광양항", "싱가포르", [450.0, 900.0, 1000.0]),
        ];

        // (city, 부산항, 인천항, 광양항)
        let inland: [(&str, [f64; 3]); 9] = [
            ("구미", [300_000.0, 450_000.0, 350_000.0]),
            ("청주", [350_000.0, 400_000.0, 380_000.0]),
            ("화성", [450_000.0, 250_000.0, 480_000.0]),
            ("수도권", [450_000.0, 200_000.0, 500_000.0]),
            ("부산", [100_000.0, 500_000.0, 300_000.0]),
            ("대구", [200_000.0, 420_000.0, 320_000.0]),
            ("광주", [350_000.0, 480_000.0, 150_000.0]),
            ("울산", [150_000.0, 480_000.0, 350_000.0]),
            ("창원", [120_000.0, 500_000.0, 280_000.0]),
        ];

        let mut tables = lanes.iter().fold(
            Self::empty(),
            |tables, (from, to, [ft20, ft40, ft40hc])| {
                tables.with_lane(from, to, &[(Ft20, *ft20), (Ft40, *ft40), (Ft40Hc, *ft40hc)])
            },
        );

        for (city, [busan, incheon, gwangyang]) in inland {
            tables = tables
                .with_inland_route(city, "부산항", busan)
                .with_inland_route(city, "인천항", incheon)
                .with_inland_route(city, "광양항", gwangyang);
        }

        tables
            .with_port_charge("THC", 150.0)
            .with_port_charge("Wharfage", 50.0)
            .with_port_charge("DocFee", 30.0)
            .with_port_charge("Handling", 40.0)
            .with_port_charge("SealFee", 10.0)
            .with_port_charge("ContainerTax", 20.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_tables_cover_known_lanes() {
        let tables = RateTables::default();
        assert_eq!(tables.fcl_rate("부산항", "LA", ContainerType::Ft20), Some(1200.0));
        assert_eq!(tables.fcl_rate("인천항", "칭다오", ContainerType::Ft40Hc), Some(450.0));
        assert_eq!(tables.fcl_rate("광양항", "LA", ContainerType::Ft20), None);
        assert_eq!(tables.fcl_rate("부산항", "LA", ContainerType::Lcl), None);
        assert_eq!(tables.lane_count(), 16);
    }

    #[test]
    fn built_in_inland_routes() {
        let tables = RateTables::default();
        assert_eq!(tables.inland_rate("구미", "부산항"), Some(300_000.0));
        assert_eq!(tables.inland_rate("수도권", "인천항"), Some(200_000.0));
        assert_eq!(tables.inland_rate("제주", "부산항"), None);
        assert_eq!(tables.inland_rate("구미", "평택항"), None);
    }

    #[test]
    fn port_charge_schedule_keeps_order() {
        let tables = RateTables::default();
        let names: Vec<_> = tables.port_charges.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["THC", "Wharfage", "DocFee", "Handling", "SealFee", "ContainerTax"]
        );
        let total: f64 = tables.port_charges.iter().map(|c| c.usd).sum();
        assert_eq!(total, 300.0);
    }

    #[test]
    fn json_round_trip_fills_missing_constants() {
        let raw = r#"{
            "freight_rates": { "부산항": { "LA": { "20ft": 1000 } } },
            "inland_transport": { "부산": { "부산항": 90000 } },
            "port_charges": [ { "name": "THC", "usd": 120 } ],
            "lcl_base_rate_usd": 95
        }"#;
        let tables: RateTables = serde_json::from_str(raw).unwrap();
        assert_eq!(tables.fcl_rate("부산항", "LA", ContainerType::Ft20), Some(1000.0));
        assert_eq!(tables.lcl_base_rate_usd, 95.0);
        assert_eq!(tables.kg_per_cbm, KG_PER_CBM);
        assert_eq!(tables.default_exchange_rate, DEFAULT_EXCHANGE_RATE);
        assert_eq!(tables.local_currency.code, "KRW");
    }
}
