use super::entities::{Incoterms, LogisticsQuote, ShipmentQuoteRequest};

/// Plain-text quotation for pasting into mail or chat.
pub fn render_quotation(quote: &LogisticsQuote, request: &ShipmentQuoteRequest) -> String {
    let ocean_note = if quote.ocean_freight.is_included {
        ""
    } else {
        " (Buyer Pays)"
    };
    let insurance = if quote.incoterms == Incoterms::Cif {
        quote.insurance.usd.formatted.clone()
    } else {
        "N/A (Buyer Pays)".to_string()
    };

    let lines = vec![
        "LOGISTICS QUOTATION".to_string(),
        format!("Incoterms: {}", quote.incoterms),
        format!(
            "Routing: {} → {}",
            request.departure_port, request.destination_port
        ),
        format!("Container: {}", request.container_type),
        format!(
            "Ocean Freight: {}{ocean_note}",
            quote.ocean_freight.usd.formatted
        ),
        format!("Port Charges: {}", quote.port_charges.total_usd.formatted),
        format!("Inland Transport: {}", quote.inland_transport.local.formatted),
        format!("Export Customs: {}", quote.export_customs.local.formatted),
        format!("Insurance: {insurance}"),
        format!("Subtotal: {}", quote.subtotal_cost.usd.formatted),
        format!(
            "Margin ({}%): {}",
            quote.margin_percent, quote.margin_amount.usd.formatted
        ),
        "──────────────".to_string(),
        format!(
            "TOTAL QUOTE: {} ({})",
            quote.final_quote.usd.formatted, quote.final_quote.local.formatted
        ),
        "* Subject to change based on actual sailing schedule and exchange rate.".to_string(),
    ];
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{compute_quote, ContainerType, RateTables};

    #[test]
    fn fob_quotation_marks_buyer_paid_lines() {
        let request =
            ShipmentQuoteRequest::new(Incoterms::Fob, "구미", "부산항", "LA", ContainerType::Ft20);
        let quote = compute_quote(&RateTables::default(), &request, Some(1400.0)).unwrap();
        let text = render_quotation(&quote, &request);

        assert!(text.starts_with("LOGISTICS QUOTATION\nIncoterms: FOB\n"));
        assert!(text.contains("Routing: 부산항 → LA"));
        assert!(text.contains("Container: 20ft"));
        assert!(text.contains("Ocean Freight: $1,200.00 (Buyer Pays)"));
        assert!(text.contains("Port Charges: $300.00"));
        assert!(text.contains("Inland Transport: ₩300,000"));
        assert!(text.contains("Export Customs: ₩30,000"));
        assert!(text.contains("Insurance: N/A (Buyer Pays)"));
        assert!(text.contains("Margin (5%): "));
        assert!(text.ends_with("exchange rate."));
        assert_eq!(text.lines().count(), 14);
    }

    #[test]
    fn cif_quotation_lists_insurance() {
        let request =
            ShipmentQuoteRequest::new(Incoterms::Cif, "구미", "부산항", "LA", ContainerType::Ft20)
                .with_cargo_value_usd(10_000.0);
        let quote = compute_quote(&RateTables::default(), &request, Some(1400.0)).unwrap();
        let text = render_quotation(&quote, &request);

        assert!(text.contains("Ocean Freight: $1,200.00\n"));
        assert!(text.contains("Insurance: $36.96"));
        assert!(text.contains("TOTAL QUOTE: $1,861.31 (₩"));
    }
}
