use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Radially symmetric smoothing kernels for density estimation
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Gaussian,
    Epanechnikov,
    Tricube,
    Box,
}

impl Kernel {
    /// Unnormalized kernel weight at scaled distance `u = r / bw`
    #[inline]
    pub fn weight(&self, u: f64) -> f64 {
        match self {
            Self::Gaussian => (-0.5 * u * u).exp(),
            Self::Epanechnikov => {
                if u < 1.0 {
                    1.0 - u * u
                } else {
                    0.0
                }
            }
            Self::Tricube => {
                if u < 1.0 {
                    (1.0 - u.powi(3)).powi(3)
                } else {
                    0.0
                }
            }
            Self::Box => {
                if u <= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Scaled distance beyond which the kernel contributes nothing (or, for
    /// the Gaussian, a negligible amount).
    #[inline]
    pub fn support(&self) -> f64 {
        match self {
            Self::Gaussian => 3.0,
            Self::Epanechnikov | Self::Tricube | Self::Box => 1.0,
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Gaussian
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Gaussian => "gaussian",
            Self::Epanechnikov => "epanechnikov",
            Self::Tricube => "tricube",
            Self::Box => "box",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "unknown kernel `{0}`. Options are `gaussian`, `epanechnikov`, `tricube`, \
     and `box`."
)]
pub struct UnknownKernelError(pub String);

impl FromStr for Kernel {
    type Err = UnknownKernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaussian" => Ok(Kernel::Gaussian),
            "epanechnikov" => Ok(Kernel::Epanechnikov),
            "tricube" => Ok(Kernel::Tricube),
            "box" => Ok(Kernel::Box),
            _ => Err(UnknownKernelError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    #[test]
    fn kernels_peak_at_zero() {
        for k in [
            Kernel::Gaussian,
            Kernel::Epanechnikov,
            Kernel::Tricube,
            Kernel::Box,
        ] {
            assert_relative_eq!(k.weight(0.0), 1.0);
            assert!(k.weight(0.5) <= 1.0);
        }
    }

    #[test]
    fn compact_kernels_vanish_outside_support() {
        assert_eq!(Kernel::Epanechnikov.weight(1.5), 0.0);
        assert_eq!(Kernel::Tricube.weight(1.0), 0.0);
        assert_eq!(Kernel::Box.weight(1.01), 0.0);
    }

    #[test]
    fn parse_round_trips_display() {
        for k in [Kernel::Gaussian, Kernel::Tricube] {
            assert_eq!(Kernel::from_str(&k.to_string()).unwrap(), k);
        }
        assert_eq!(
            Kernel::from_str("cosine"),
            Err(UnknownKernelError("cosine".into()))
        );
    }
}
