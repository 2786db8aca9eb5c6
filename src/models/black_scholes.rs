use crate::errors::{PricerResult, PricingError};
use crate::models::{OptionKind, PricingModel, PricingRequest};
use statrs::distribution::{ContinuousCDF, Normal};

/// Closed-form Black-Scholes European option pricing.
///
/// call = S * Phi(d1) - K * e^{-rT} * Phi(d2)
/// put  = K * e^{-rT} * Phi(-d2) - S * Phi(-d1)
///
/// where d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma * sqrt(T))
/// and d2 = d1 - sigma * sqrt(T).
///
/// Reference value for the Monte Carlo engine. Ignores `simulations`.
pub struct BlackScholes {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl BlackScholes {
    pub fn new() -> Self {
        Self {
            normal: Normal::standard(),
        }
    }
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingModel for BlackScholes {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes"
    }

    fn price(&self, request: &PricingRequest) -> PricerResult<f64> {
        request.validate_market()?;

        let sigma_sqrt_t = request.sigma_sqrt_t();
        let d1 = ((request.spot / request.strike).ln()
            + (request.rate + 0.5 * request.volatility * request.volatility) * request.maturity)
            / sigma_sqrt_t;
        let d2 = d1 - sigma_sqrt_t;
        let pv_strike = request.strike * request.discount_factor();

        let price = match request.kind {
            OptionKind::Call => {
                request.spot * self.normal.cdf(d1) - pv_strike * self.normal.cdf(d2)
            }
            OptionKind::Put => {
                pv_strike * self.normal.cdf(-d2) - request.spot * self.normal.cdf(-d1)
            }
        };

        if !price.is_finite() {
            return Err(PricingError::Computation(format!(
                "closed-form price is not finite (d1={d1}, d2={d2})"
            )));
        }

        // Cancellation in deep OTM tails can leave a tiny negative residue
        Ok(price.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(spot: f64, kind: OptionKind) -> PricingRequest {
        PricingRequest {
            spot,
            strike: 100.0,
            maturity: 1.0,
            rate: 0.05,
            volatility: 0.2,
            simulations: 1,
            kind,
        }
    }

    #[test]
    fn test_textbook_atm_values() {
        let model = BlackScholes::new();
        let call = model.price(&request(100.0, OptionKind::Call)).unwrap();
        let put = model.price(&request(100.0, OptionKind::Put)).unwrap();
        assert!((call - 10.4506).abs() < 1e-3, "ATM call={call} should be ~10.4506");
        assert!((put - 5.5735).abs() < 1e-3, "ATM put={put} should be ~5.5735");
    }

    #[test]
    fn test_reference_scenario() {
        let model = BlackScholes::new();
        let call = model.price(&request(105.0, OptionKind::Call)).unwrap();
        assert!((call - 13.8579).abs() < 1e-3, "call={call} should be ~13.858");
    }

    #[test]
    fn test_put_call_parity_exact() {
        let model = BlackScholes::new();
        for spot in [80.0, 95.0, 105.0, 130.0] {
            let c = model.price(&request(spot, OptionKind::Call)).unwrap();
            let p = model.price(&request(spot, OptionKind::Put)).unwrap();
            let forward_gap = spot - 100.0 * (-0.05_f64).exp();
            assert!((c - p - forward_gap).abs() < 1e-9, "parity broken at S={spot}: c={c} p={p}");
        }
    }

    #[test]
    fn test_rejects_zero_maturity() {
        let model = BlackScholes::new();
        let mut req = request(100.0, OptionKind::Call);
        req.maturity = 0.0;
        let err = model.price(&req).unwrap_err();
        assert_eq!(err.field(), Some("time_to_maturity"));
    }
}
