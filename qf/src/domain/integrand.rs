//! Integrand functions shared by every worker

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Named integrand as it appears in config files and on the command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IntegrandSpec {
    /// `f(x) = value`
    Constant { value: f64 },

    /// `f(x) = c0 + c1*x + c2*x^2 + ...`
    Polynomial { coefficients: Vec<f64> },

    /// `f(x) = cosh(x)^power`
    CoshPower { power: i32 },

    /// `f(x) = sin(x)`
    Sine,

    /// `f(x) = e^x`
    Exp,
}

impl Default for IntegrandSpec {
    fn default() -> Self {
        Self::CoshPower { power: 4 }
    }
}

impl std::fmt::Display for IntegrandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant { value } => write!(f, "constant:{}", value),
            Self::Polynomial { coefficients } => {
                let coefficients: Vec<String> = coefficients.iter().map(|c| c.to_string()).collect();
                write!(f, "poly:{}", coefficients.join(","))
            }
            Self::CoshPower { power } => write!(f, "cosh:{}", power),
            Self::Sine => write!(f, "sin"),
            Self::Exp => write!(f, "exp"),
        }
    }
}

impl std::str::FromStr for IntegrandSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "IntegrandSpec::from_str: called");
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name.trim().to_lowercase(), Some(args.trim())),
            None => (s.trim().to_lowercase(), None),
        };

        let parse_f64 = |v: &str| v.trim().parse::<f64>().map_err(|e| format!("Invalid number '{}': {}", v, e));

        match (name.as_str(), args) {
            ("constant" | "const", Some(value)) => Ok(Self::Constant {
                value: parse_f64(value)?,
            }),
            ("poly" | "polynomial", Some(list)) => {
                let coefficients = list.split(',').map(parse_f64).collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Polynomial { coefficients })
            }
            ("cosh", Some(power)) => {
                let power = power
                    .parse::<i32>()
                    .map_err(|e| format!("Invalid power '{}': {}", power, e))?;
                Ok(Self::CoshPower { power })
            }
            ("cosh", None) => Ok(Self::default()),
            ("sin" | "sine", None) => Ok(Self::Sine),
            ("exp", None) => Ok(Self::Exp),
            _ => Err(format!(
                "Unknown integrand: {}. Use: constant:C, poly:c0,c1,..., cosh:P, sin, or exp",
                s
            )),
        }
    }
}

type IntegrandFn = dyn Fn(f64) -> f64 + Send + Sync;

/// Callable integrand, cheap to clone across worker tasks
#[derive(Clone)]
pub struct Integrand {
    name: String,
    func: Arc<IntegrandFn>,
}

impl Integrand {
    /// Wrap an arbitrary function
    pub fn new(name: impl Into<String>, func: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn eval(&self, x: f64) -> f64 {
        (self.func)(x)
    }
}

impl std::fmt::Debug for Integrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integrand").field("name", &self.name).finish()
    }
}

impl From<&IntegrandSpec> for Integrand {
    fn from(spec: &IntegrandSpec) -> Self {
        let name = spec.to_string();
        match spec.clone() {
            IntegrandSpec::Constant { value } => Integrand::new(name, move |_| value),
            IntegrandSpec::Polynomial { coefficients } => Integrand::new(name, move |x| {
                // Horner, highest power first
                coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
            }),
            IntegrandSpec::CoshPower { power } => Integrand::new(name, move |x: f64| x.cosh().powi(power)),
            IntegrandSpec::Sine => Integrand::new(name, f64::sin),
            IntegrandSpec::Exp => Integrand::new(name, f64::exp),
        }
    }
}

impl From<IntegrandSpec> for Integrand {
    fn from(spec: IntegrandSpec) -> Self {
        Integrand::from(&spec)
    }
}
