//! Built-in holdings used when the config file lists none.

use crate::types::{Holding, PrimarySymbol};

fn holding(
    id: &str,
    symbol: &str,
    primary: &str,
    name: &str,
    purchase_price: f64,
    quantity: f64,
    sector: &str,
) -> Holding {
    Holding {
        id: id.to_string(),
        symbol: symbol.to_string(),
        primary_symbol: PrimarySymbol(primary.to_string()),
        secondary_symbol: None,
        name: name.to_string(),
        purchase_price,
        quantity,
        exchange: "NSE".to_string(),
        sector: sector.to_string(),
    }
}

pub fn default_holdings() -> Vec<Holding> {
    vec![
        holding("1", "RELIANCE", "RELIANCE.NS", "Reliance Industries", 2800.0, 5.0, "Financials"),
        holding("2", "TCS", "TCS.NS", "Tata Consultancy Services", 3500.0, 10.0, "Technology"),
        holding("3", "INFY", "INFY.NS", "Infosys", 1800.0, 8.0, "Technology"),
        holding("4", "HDFC", "HDFCBANK.NS", "HDFC Bank", 1600.0, 12.0, "Financials"),
        holding("5", "WIPRO", "WIPRO.NS", "Wipro", 450.0, 20.0, "Technology"),
        holding("6", "MARUTI", "MARUTI.NS", "Maruti Suzuki", 9500.0, 2.0, "Automotive"),
        holding("7", "ICICIBANK", "ICICIBANK.NS", "ICICI Bank", 1250.0, 15.0, "Financials"),
        holding("8", "ADANIPORTS", "ADANIPORTS.NS", "Adani Ports", 650.0, 30.0, "Infrastructure"),
    ]
}
