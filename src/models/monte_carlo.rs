use crate::errors::{PricerResult, PricingError};
use crate::models::{OptionKind, PriceEstimate, PricingModel, PricingRequest};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Risk-neutral Monte Carlo estimate of a European option price.
///
/// Simulates the exact GBM terminal price for each draw z ~ N(0,1):
///
/// F = S * exp((r - sigma^2/2)*T + sigma*sqrt(T)*z)
///
/// then returns e^{-rT} * mean(payoff(F)). Only the terminal price matters
/// for a European payoff, so no intermediate steps are simulated.
///
/// Draws are accumulated as they are produced, so memory is constant in N.
/// The result is random: two calls with differently seeded `rng` differ by
/// roughly `std_error`. Seed the RNG identically to reproduce a run.
pub fn estimate_price<R: Rng + ?Sized>(
    request: &PricingRequest,
    rng: &mut R,
) -> PricerResult<PriceEstimate> {
    request.validate()?;

    let drift = (request.rate - 0.5 * request.volatility * request.volatility) * request.maturity;
    let diffusion = request.sigma_sqrt_t();
    let discount = request.discount_factor();

    // sigma^2 overflows to inf long before sigma itself does
    if !drift.is_finite() || !diffusion.is_finite() {
        return Err(PricingError::Computation(format!(
            "exponent terms are not finite (drift={drift}, sigma*sqrt(T)={diffusion})"
        )));
    }

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut underflows: u64 = 0;

    for _ in 0..request.simulations {
        let z: f64 = StandardNormal.sample(rng);
        let terminal = request.spot * (drift + diffusion * z).exp();
        if !terminal.is_finite() {
            return Err(PricingError::Computation(format!(
                "terminal price overflowed (drift={drift}, sigma*sqrt(T)={diffusion}, z={z})"
            )));
        }
        if terminal == 0.0 {
            underflows += 1;
        }
        let payoff = request.kind.payoff(terminal, request.strike);
        sum += payoff;
        sum_sq += payoff * payoff;
    }

    if underflows == request.simulations {
        return Err(PricingError::Computation(format!(
            "every terminal price underflowed to zero (drift={drift}, sigma*sqrt(T)={diffusion})"
        )));
    }

    let n = request.simulations as f64;
    let mean = sum / n;
    let option_price = discount * mean;

    if !option_price.is_finite() || !sum_sq.is_finite() {
        return Err(PricingError::Computation(format!(
            "payoff accumulation is not finite (sum={sum}, sum_sq={sum_sq})"
        )));
    }

    let variance = if request.simulations > 1 {
        ((sum_sq - n * mean * mean) / (n - 1.0)).max(0.0)
    } else {
        0.0
    };
    let std_error = discount * (variance / n).sqrt();

    Ok(PriceEstimate {
        option_price,
        std_error,
        simulations: request.simulations,
    })
}

/// Convenience entry taking the raw inputs, with the option kind as text.
/// An unrecognised kind fails with `InvalidArgument` before any sampling.
#[allow(clippy::too_many_arguments)]
pub fn price_option<R: Rng + ?Sized>(
    spot: f64,
    strike: f64,
    maturity: f64,
    rate: f64,
    volatility: f64,
    simulations: u64,
    kind: &str,
    rng: &mut R,
) -> PricerResult<f64> {
    let request = PricingRequest {
        spot,
        strike,
        maturity,
        rate,
        volatility,
        simulations,
        kind: kind.parse::<OptionKind>()?,
    };
    estimate_price(&request, rng).map(|e| e.option_price)
}

/// Owns the random-source policy for callers that do not bring their own RNG.
///
/// Every call gets a fresh `StdRng`: seeded from `seed` when set (reproducible),
/// otherwise from OS entropy. No generator is shared between calls, so one
/// engine can be used from many threads at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloEngine {
    seed: Option<u64>,
}

impl MonteCarloEngine {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    pub fn estimate(&self, request: &PricingRequest) -> PricerResult<PriceEstimate> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        estimate_price(request, &mut rng)
    }
}

impl PricingModel for MonteCarloEngine {
    #[inline]
    fn name(&self) -> &'static str {
        "Monte-Carlo"
    }

    fn price(&self, request: &PricingRequest) -> PricerResult<f64> {
        self.estimate(request).map(|e| e.option_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::black_scholes::BlackScholes;

    fn request(spot: f64, simulations: u64, kind: OptionKind) -> PricingRequest {
        PricingRequest {
            spot,
            strike: 100.0,
            maturity: 1.0,
            rate: 0.05,
            volatility: 0.2,
            simulations,
            kind,
        }
    }

    #[test]
    fn test_reference_scenario_near_closed_form() {
        let req = request(105.0, 100_000, OptionKind::Call);
        let reference = BlackScholes::new().price(&req).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let est = estimate_price(&req, &mut rng).unwrap();
        assert!(
            (est.option_price - reference).abs() < 0.25,
            "MC={} vs BS={reference} (se={})",
            est.option_price,
            est.std_error
        );
        assert!(est.std_error > 0.0 && est.std_error < 0.1, "se={}", est.std_error);
    }

    #[test]
    fn test_non_negative() {
        let mut rng = StdRng::seed_from_u64(1);
        for spot in [1.0, 50.0, 100.0, 400.0] {
            for kind in [OptionKind::Call, OptionKind::Put] {
                for rate in [-0.02, 0.0, 0.1] {
                    let mut req = request(spot, 500, kind);
                    req.rate = rate;
                    let est = estimate_price(&req, &mut rng).unwrap();
                    assert!(
                        est.option_price >= 0.0 && est.option_price.is_finite(),
                        "price={} for S={spot} {kind} r={rate}",
                        est.option_price
                    );
                }
            }
        }
    }

    #[test]
    fn test_converges_to_closed_form() {
        let reference = BlackScholes::new()
            .price(&request(100.0, 1, OptionKind::Call))
            .unwrap();
        let mut errors = Vec::new();
        for n in [100, 10_000, 1_000_000] {
            let mut rng = StdRng::seed_from_u64(2024);
            let est = estimate_price(&request(100.0, n, OptionKind::Call), &mut rng).unwrap();
            let err = (est.option_price - reference).abs();
            assert!(
                err < 5.0 * est.std_error + 1e-9,
                "N={n}: error {err} outside 5 standard errors ({})",
                est.std_error
            );
            errors.push((err, est.std_error));
        }
        // Error band shrinks roughly 10x per 100x more draws
        assert!(errors[2].1 < errors[1].1 && errors[1].1 < errors[0].1);
        assert!(errors[2].0 < 0.06, "N=1e6 error {} too large", errors[2].0);
    }

    #[test]
    fn test_put_call_parity_approx() {
        let n = 200_000;
        let mut rng = StdRng::seed_from_u64(99);
        let call = estimate_price(&request(105.0, n, OptionKind::Call), &mut rng).unwrap();
        let put = estimate_price(&request(105.0, n, OptionKind::Put), &mut rng).unwrap();
        let expected = 105.0 - 100.0 * (-0.05_f64).exp();
        let gap = call.option_price - put.option_price;
        assert!((gap - expected).abs() < 0.3, "c-p={gap}, expected {expected}");
    }

    #[test]
    fn test_invalid_kind_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err =
            price_option(105.0, 100.0, 1.0, 0.05, 0.2, 1_000, "straddle", &mut rng).unwrap_err();
        assert!(matches!(err, PricingError::InvalidArgument { field: "option_type", .. }), "{err}");
    }

    #[test]
    fn test_zero_maturity_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = price_option(105.0, 100.0, 0.0, 0.05, 0.2, 1_000, "call", &mut rng).unwrap_err();
        assert!(
            matches!(err, PricingError::InvalidArgument { field: "time_to_maturity", .. }),
            "{err}"
        );
    }

    #[test]
    fn test_zero_simulations_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = price_option(105.0, 100.0, 1.0, 0.05, 0.2, 0, "put", &mut rng).unwrap_err();
        assert_eq!(err.field(), Some("simulations"));
    }

    #[test]
    fn test_call_increases_with_spot() {
        // Common random numbers: same seed per spot, so the ordering is exact
        let mut last = -1.0;
        for spot in [80.0, 90.0, 100.0, 110.0, 120.0] {
            let mut rng = StdRng::seed_from_u64(5);
            let est = estimate_price(&request(spot, 20_000, OptionKind::Call), &mut rng).unwrap();
            assert!(est.option_price > last, "S={spot}: {} <= {last}", est.option_price);
            last = est.option_price;
        }
    }

    #[test]
    fn test_same_seed_reproducible() {
        let engine = MonteCarloEngine::new(Some(42));
        let req = request(100.0, 10_000, OptionKind::Put);
        let a = engine.estimate(&req).unwrap();
        let b = engine.estimate(&req).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_entropy_engine_within_band() {
        let engine = MonteCarloEngine::default();
        let req = request(100.0, 50_000, OptionKind::Put);
        let reference = BlackScholes::new().price(&req).unwrap();
        let est = engine.estimate(&req).unwrap();
        assert!(
            (est.option_price - reference).abs() < 6.0 * est.std_error,
            "MC={} BS={reference}",
            est.option_price
        );
    }

    #[test]
    fn test_single_simulation() {
        let mut rng = StdRng::seed_from_u64(3);
        let est = estimate_price(&request(100.0, 1, OptionKind::Call), &mut rng).unwrap();
        assert_eq!(est.std_error, 0.0);
        assert!(est.option_price >= 0.0);
    }

    #[test]
    fn test_overflow_is_computation_error() {
        let mut req = request(100.0, 1_000, OptionKind::Call);
        req.volatility = 1.0;
        req.maturity = 10.0;
        req.rate = 100.0;
        // Drift alone is ~995, so exp() overflows on every draw
        let mut rng = StdRng::seed_from_u64(11);
        let err = estimate_price(&req, &mut rng).unwrap_err();
        assert!(matches!(err, PricingError::Computation(_)), "{err}");
    }

    #[test]
    fn test_huge_volatility_is_computation_error() {
        // sigma^2 overflows while sigma*sqrt(T) stays finite
        for kind in [OptionKind::Call, OptionKind::Put] {
            let mut req = request(105.0, 1_000, kind);
            req.volatility = 1e155;
            let mut rng = StdRng::seed_from_u64(1);
            let err = estimate_price(&req, &mut rng).unwrap_err();
            assert!(matches!(err, PricingError::Computation(_)), "{kind}: {err}");
        }
    }

    #[test]
    fn test_all_terminal_prices_underflow() {
        // Drift of -1250 with sigma*sqrt(T)=50 puts every exp() below f64 range
        let mut req = request(105.0, 1_000, OptionKind::Call);
        req.volatility = 50.0;
        let mut rng = StdRng::seed_from_u64(1);
        let err = estimate_price(&req, &mut rng).unwrap_err();
        assert!(matches!(err, PricingError::Computation(_)), "{err}");
    }

    #[test]
    fn test_payoff_square_overflow_rejected() {
        // Payoffs near 1e160: the mean is finite but the sum of squares is not,
        // so no standard error can be reported
        let mut req = request(1e160, 10, OptionKind::Call);
        req.strike = 1.0;
        req.rate = 0.0;
        let mut rng = StdRng::seed_from_u64(4);
        let err = estimate_price(&req, &mut rng).unwrap_err();
        match err {
            PricingError::Computation(msg) => assert!(msg.contains("sum_sq=inf"), "{msg}"),
            other => panic!("expected computation error, got {other}"),
        }
    }
}
