//! Synthetic quotes for holdings no live source could price.

use rand::Rng;

use crate::types::{Holding, QuoteFields};
use crate::utils::{finite_or_zero, round2};

/// Price within ±10% of cost, P/E in [15, 25], earnings around 5% of the position.
pub fn synthesize_with<R: Rng + ?Sized>(holding: &Holding, rng: &mut R) -> QuoteFields {
    let price_factor: f64 = rng.gen_range(0.9..=1.1);
    let pe: f64 = rng.gen_range(15.0..=25.0);
    let earnings_factor: f64 = rng.gen_range(0.8..=1.2);

    QuoteFields {
        current_price: finite_or_zero(round2(holding.purchase_price * price_factor)),
        pe_ratio: round2(pe),
        latest_earnings: finite_or_zero(round2(
            holding.investment() * 0.05 * earnings_factor,
        )),
    }
}
