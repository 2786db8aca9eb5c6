pub mod black_scholes;
pub mod monte_carlo;

use crate::errors::{PricerResult, PricingError};
use std::str::FromStr;

/// Hard upper bound on simulation count accepted by the pricers.
/// Draws are streamed, so this caps CPU time rather than memory.
pub const MAX_SIMULATIONS: u64 = 100_000_000;

/// All pricers implement this trait.
/// Send + Sync required for use across tokio tasks.
pub trait PricingModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Present value of the option described by `request`.
    /// Never returns a negative or non-finite price.
    fn price(&self, request: &PricingRequest) -> PricerResult<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// Payoff at maturity for terminal price `terminal`. Always >= 0.
    #[inline]
    pub fn payoff(self, terminal: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (terminal - strike).max(0.0),
            Self::Put => (strike - terminal).max(0.0),
        }
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

impl FromStr for OptionKind {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            other => Err(PricingError::invalid(
                "option_type",
                format!("unrecognised option type {other:?}, expected \"call\" or \"put\""),
            )),
        }
    }
}

/// Contract and market inputs for a single pricing call.
/// Plain value type. Nothing is retained once the call returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingRequest {
    pub spot: f64,
    pub strike: f64,
    pub maturity: f64,   // Years
    pub rate: f64,       // Continuously compounded, may be negative
    pub volatility: f64, // Annualised
    pub simulations: u64,
    pub kind: OptionKind,
}

impl PricingRequest {
    /// Check every market/contract precondition. Simulation count is checked
    /// separately since the closed-form pricer ignores it.
    pub fn validate_market(&self) -> PricerResult<()> {
        positive("stock_price", self.spot)?;
        positive("strike_price", self.strike)?;
        positive("time_to_maturity", self.maturity)?;
        positive("volatility", self.volatility)?;
        if !self.rate.is_finite() {
            return Err(PricingError::invalid(
                "risk_free_rate",
                format!("must be finite, got {}", self.rate),
            ));
        }
        if self.sigma_sqrt_t() <= 0.0 {
            return Err(PricingError::invalid(
                "volatility",
                "sigma * sqrt(T) must be strictly positive",
            ));
        }
        Ok(())
    }

    /// Full precondition check for the simulator.
    pub fn validate(&self) -> PricerResult<()> {
        self.validate_market()?;
        if self.simulations == 0 {
            return Err(PricingError::invalid("simulations", "must be at least 1"));
        }
        if self.simulations > MAX_SIMULATIONS {
            return Err(PricingError::invalid(
                "simulations",
                format!("{} exceeds the maximum of {MAX_SIMULATIONS}", self.simulations),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn sigma_sqrt_t(&self) -> f64 {
        self.volatility * self.maturity.sqrt()
    }

    #[inline]
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.maturity).exp()
    }
}

fn positive(field: &'static str, value: f64) -> PricerResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::invalid(
            field,
            format!("must be finite and > 0, got {value}"),
        ))
    }
}

/// Monte Carlo price estimate with its sampling error.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PriceEstimate {
    pub option_price: f64,
    /// Standard error of `option_price`. Shrinks as 1/sqrt(simulations).
    pub std_error: f64,
    pub simulations: u64,
}
