//! Resolve one record per holding from primary quotes, scraped fields and fallback.
//!
//! Precedence per holding:
//! 1. primary hit: price from primary; P/E and earnings from the scraped page when
//!    present, else from primary, else 0.
//! 2. primary miss: synthetic quote, scraped data ignored.
//! 3. primary batch failed: every holding synthetic, everything tagged fallback.

use rand::Rng;
use std::collections::HashMap;

use crate::fallback::synthesize_with;
use crate::types::{
    Holding, MergedRecord, PrimaryQuote, PrimarySymbol, QuoteFields, ScrapedFields,
    SecondarySymbol, Source, SourceProvenance,
};
use crate::utils::finite_or_zero;

fn resolve(value: Option<f64>) -> f64 {
    value.map(finite_or_zero).unwrap_or(0.0)
}

fn from_sources(primary: &PrimaryQuote, scraped: Option<&ScrapedFields>) -> QuoteFields {
    let scraped_pe = scraped.and_then(|s| s.pe_ratio);
    let scraped_earnings = scraped.and_then(|s| s.latest_earnings);
    QuoteFields {
        current_price: resolve(primary.regular_market_price),
        pe_ratio: resolve(scraped_pe.or(primary.trailing_pe)),
        latest_earnings: resolve(scraped_earnings.or(primary.eps_trailing_twelve_months)),
    }
}

/// Every holding priced by the fallback generator.
pub fn merge_all_fallback<R: Rng + ?Sized>(
    holdings: &[Holding],
    rng: &mut R,
) -> (Vec<MergedRecord>, SourceProvenance) {
    let data = holdings
        .iter()
        .map(|h| MergedRecord {
            holding: h.clone(),
            quote: synthesize_with(h, rng),
        })
        .collect();
    (data, SourceProvenance::all(Source::Fallback))
}

/// Merge a successful primary batch with whatever the scraper found.
pub fn merge_live<R: Rng + ?Sized>(
    holdings: &[Holding],
    primary: &HashMap<PrimarySymbol, PrimaryQuote>,
    scraped: &HashMap<SecondarySymbol, ScrapedFields>,
    rng: &mut R,
) -> (Vec<MergedRecord>, SourceProvenance) {
    let mut any_pe = false;
    let mut any_earnings = false;

    let data = holdings
        .iter()
        .map(|h| {
            let s = scraped.get(&h.secondary_id());
            if let Some(s) = s {
                any_pe |= s.pe_ratio.is_some();
                any_earnings |= s.latest_earnings.is_some();
            }
            let quote = match primary.get(&h.primary_symbol) {
                Some(q) => from_sources(q, s),
                None => synthesize_with(h, rng),
            };
            MergedRecord {
                holding: h.clone(),
                quote,
            }
        })
        .collect();

    // Batch-level only: one scraped value anywhere relabels the whole column.
    let price = Source::Primary;
    let provenance = SourceProvenance {
        price,
        pe_ratio: if any_pe { Source::Secondary } else { price },
        latest_earnings: if any_earnings { Source::Secondary } else { price },
    };
    (data, provenance)
}

/// Dispatch on the outcome of the primary batch call.
pub fn merge<R: Rng + ?Sized, E>(
    holdings: &[Holding],
    primary: Result<&HashMap<PrimarySymbol, PrimaryQuote>, E>,
    scraped: &HashMap<SecondarySymbol, ScrapedFields>,
    rng: &mut R,
) -> (Vec<MergedRecord>, SourceProvenance) {
    match primary {
        Ok(quotes) => merge_live(holdings, quotes, scraped, rng),
        Err(_) => merge_all_fallback(holdings, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn holding(id: &str, symbol: &str, price: f64, qty: f64) -> Holding {
        Holding {
            id: id.into(),
            symbol: symbol.into(),
            primary_symbol: PrimarySymbol(format!("{symbol}.NS")),
            secondary_symbol: None,
            name: symbol.into(),
            purchase_price: price,
            quantity: qty,
            exchange: "NSE".into(),
            sector: "Technology".into(),
        }
    }

    fn pq(symbol: &str, price: Option<f64>, pe: Option<f64>, eps: Option<f64>) -> (PrimarySymbol, PrimaryQuote) {
        (
            PrimarySymbol(symbol.to_string()),
            PrimaryQuote {
                symbol: Some(symbol.to_string()),
                regular_market_price: price,
                trailing_pe: pe,
                eps_trailing_twelve_months: eps,
            },
        )
    }

    fn sq(symbol: &str, pe: Option<f64>, earnings: Option<f64>) -> (SecondarySymbol, ScrapedFields) {
        (
            SecondarySymbol(symbol.to_string()),
            ScrapedFields {
                pe_ratio: pe,
                latest_earnings: earnings,
            },
        )
    }

    fn assert_finite(records: &[MergedRecord]) {
        for r in records {
            assert!(r.quote.current_price.is_finite());
            assert!(r.quote.pe_ratio.is_finite());
            assert!(r.quote.latest_earnings.is_finite());
        }
    }

    #[test]
    fn scraped_pe_wins_and_earnings_fall_through() {
        let hs = vec![holding("1", "TCS", 3500.0, 10.0)];
        let primary = HashMap::from([pq("TCS.NS", Some(3900.0), Some(18.0), Some(5.0))]);
        let scraped = HashMap::from([sq("TCS:NSE", Some(20.0), None)]);
        let mut rng = StdRng::seed_from_u64(1);

        let (data, prov) = merge_live(&hs, &primary, &scraped, &mut rng);
        assert_eq!(data[0].quote.current_price, 3900.0);
        assert_eq!(data[0].quote.pe_ratio, 20.0);
        assert_eq!(data[0].quote.latest_earnings, 5.0);
        assert_eq!(prov.price, Source::Primary);
        assert_eq!(prov.pe_ratio, Source::Secondary);
        assert_eq!(prov.latest_earnings, Source::Primary);
    }

    #[test]
    fn missing_everywhere_defaults_to_zero() {
        let hs = vec![holding("1", "TCS", 3500.0, 10.0)];
        let primary = HashMap::from([pq("TCS.NS", None, None, Some(f64::NAN))]);
        let mut rng = StdRng::seed_from_u64(1);

        let (data, prov) = merge_live(&hs, &primary, &HashMap::new(), &mut rng);
        assert_eq!(data[0].quote, QuoteFields::default());
        assert_eq!(prov, SourceProvenance::all(Source::Primary));
    }

    #[test]
    fn primary_miss_uses_fallback_and_ignores_scrape() {
        let hs = vec![
            holding("1", "TCS", 3500.0, 10.0),
            holding("2", "INFY", 1800.0, 8.0),
        ];
        let primary = HashMap::from([pq("TCS.NS", Some(3900.0), Some(18.0), Some(5.0))]);
        let scraped = HashMap::from([sq("INFY:NSE", Some(999.0), Some(999.0))]);
        let mut rng = StdRng::seed_from_u64(3);

        let (data, _) = merge_live(&hs, &primary, &scraped, &mut rng);
        assert_eq!(data.len(), 2);
        let infy = &data[1].quote;
        assert!((1620.0..=1980.0).contains(&infy.current_price));
        assert!((15.0..=25.0).contains(&infy.pe_ratio));
        assert_ne!(infy.latest_earnings, 999.0);
        assert_finite(&data);
    }

    #[test]
    fn batch_failure_falls_back_for_everyone() {
        let hs = vec![
            holding("1", "TCS", 3500.0, 10.0),
            holding("2", "INFY", 1800.0, 8.0),
            holding("3", "WIPRO", 450.0, 20.0),
        ];
        let scraped = HashMap::from([sq("TCS:NSE", Some(20.0), Some(150.0))]);
        let mut rng = StdRng::seed_from_u64(9);

        let (data, prov) = merge(&hs, Err::<&HashMap<_, _>, _>("provider down"), &scraped, &mut rng);
        assert_eq!(data.len(), 3);
        assert_eq!(prov, SourceProvenance::all(Source::Fallback));
        for (r, h) in data.iter().zip(&hs) {
            assert_eq!(r.holding, *h);
            assert!((15.0..=25.0).contains(&r.quote.pe_ratio));
            assert!(r.quote.current_price >= h.purchase_price * 0.9 - 0.01);
            assert!(r.quote.current_price <= h.purchase_price * 1.1 + 0.01);
        }
        assert_finite(&data);
    }

    #[test]
    fn scraped_earnings_relabel_whole_batch() {
        let hs = vec![
            holding("1", "TCS", 3500.0, 10.0),
            holding("2", "INFY", 1800.0, 8.0),
        ];
        let primary = HashMap::from([
            pq("TCS.NS", Some(3900.0), Some(18.0), Some(5.0)),
            pq("INFY.NS", Some(1500.0), Some(24.0), Some(60.0)),
        ]);
        let scraped = HashMap::from([
            sq("TCS:NSE", Some(21.0), Some(185.71)),
            sq("INFY:NSE", None, None),
        ]);
        let mut rng = StdRng::seed_from_u64(1);

        let (data, prov) = merge_live(&hs, &primary, &scraped, &mut rng);
        assert_eq!(data[0].quote.latest_earnings, 185.71);
        assert_eq!(data[1].quote.latest_earnings, 60.0);
        assert_eq!(data[1].quote.pe_ratio, 24.0);
        assert_eq!(prov.pe_ratio, Source::Secondary);
        assert_eq!(prov.latest_earnings, Source::Secondary);
    }

    #[test]
    fn explicit_secondary_symbol_is_used() {
        let mut h = holding("1", "HDFC", 1600.0, 12.0);
        h.primary_symbol = PrimarySymbol("HDFCBANK.NS".into());
        h.secondary_symbol = Some(SecondarySymbol("HDFCBANK:NSE".into()));
        let primary = HashMap::from([pq("HDFCBANK.NS", Some(1700.0), None, None)]);
        let scraped = HashMap::from([sq("HDFCBANK:NSE", Some(19.5), Some(87.18))]);
        let mut rng = StdRng::seed_from_u64(1);

        let (data, _) = merge_live(&[h], &primary, &scraped, &mut rng);
        assert_eq!(data[0].quote.pe_ratio, 19.5);
        assert_eq!(data[0].quote.latest_earnings, 87.18);
    }

    #[test]
    fn scrape_for_unpriced_holding_still_labels_pe() {
        let hs = vec![
            holding("1", "TCS", 3500.0, 10.0),
            holding("2", "INFY", 1800.0, 8.0),
        ];
        let primary = HashMap::from([pq("TCS.NS", Some(3900.0), Some(18.0), Some(5.0))]);
        let scraped = HashMap::from([sq("INFY:NSE", Some(20.0), None)]);
        let mut rng = StdRng::seed_from_u64(5);

        let (data, prov) = merge_live(&hs, &primary, &scraped, &mut rng);
        // TCS keeps its provider P/E; the INFY scrape is only counted for the label
        assert_eq!(data[0].quote.pe_ratio, 18.0);
        assert!((15.0..=25.0).contains(&data[1].quote.pe_ratio));
        assert_eq!(prov.price, Source::Primary);
        assert_eq!(prov.pe_ratio, Source::Secondary);
        assert_eq!(prov.latest_earnings, Source::Primary);
    }
}
