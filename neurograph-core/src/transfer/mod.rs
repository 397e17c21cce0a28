//! # Transfer functions (`transfer`)
//!
//! Pure elementwise mappings applied by clusters between their input and
//! output ports. The family is a closed sum type: adding a function means
//! adding a variant, and every dispatch site is checked for exhaustiveness.
//!
//! Some variants are differentiable and expose their derivative through
//! [`TransferFunction::derivate`]; the backpropagation engine treats the
//! local Jacobian of the others as identity.

use std::f32::consts::PI;

use crate::algebra::Vector;
use crate::error::NeuroGraphError;
use crate::props::PropertyMap;

/// Elementwise mapping from a cluster's input vector to its output vector.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferFunction {
    /// `y = x`
    Identity,
    /// `y = m*x + b`
    Linear { m: f32, b: f32 },
    /// Linear between `(min_x, min_y)` and `(max_x, max_y)`, clamped outside.
    Ramp {
        min_x: f32,
        max_x: f32,
        min_y: f32,
        max_y: f32,
    },
    /// `y = max` above the threshold, `y = min` otherwise.
    Step { min: f32, max: f32, threshold: f32 },
    /// `y = 1 / (1 + e^(-lambda*x))`
    Sigmoid { lambda: f32 },
    /// Cheap sigmoid approximation `y = lambda*x / (2*(1 + |lambda*x|)) + 1/2`.
    FakeSigmoid { lambda: f32 },
    /// Sigmoid rescaled onto `[min, max]`.
    ScaledSigmoid { lambda: f32, min: f32, max: f32 },
    /// `y = max * e^(-(x-centre)^2 / variance)`
    Gaussian {
        centre: f32,
        variance: f32,
        max: f32,
    },
    /// `y = amplitude * sin(2*pi*x/span + phase)`, the periodic family.
    Sin {
        phase: f32,
        span: f32,
        amplitude: f32,
    },
    /// 1.0 at the index of the largest input, 0.0 elsewhere.
    WinnerTakeAll,
}

impl TransferFunction {
    /// Applies the mapping, reading `inputs` and overwriting `outputs`.
    /// Pure: no state outside `outputs` is touched.
    pub fn apply(&self, inputs: &Vector, outputs: &Vector) {
        debug_assert_eq!(inputs.len(), outputs.len(), "transfer apply size mismatch");
        match self {
            TransferFunction::WinnerTakeAll => {
                let winner = inputs.max_index();
                outputs.zero();
                if !outputs.is_empty() {
                    outputs.set(winner, 1.0);
                }
            }
            _ => {
                let n = inputs.len().min(outputs.len());
                for i in 0..n {
                    outputs.set(i, self.eval(inputs.get(i)));
                }
            }
        }
    }

    /// Scalar form of the map, for every variant except WinnerTakeAll
    /// (which is the one whole-vector mapping of the family).
    pub fn eval(&self, x: f32) -> f32 {
        match *self {
            TransferFunction::Identity => x,
            TransferFunction::Linear { m, b } => m * x + b,
            TransferFunction::Ramp {
                min_x,
                max_x,
                min_y,
                max_y,
            } => {
                if x <= min_x {
                    min_y
                } else if x >= max_x {
                    max_y
                } else {
                    min_y + (max_y - min_y) * (x - min_x) / (max_x - min_x)
                }
            }
            TransferFunction::Step {
                min,
                max,
                threshold,
            } => {
                if x > threshold {
                    max
                } else {
                    min
                }
            }
            TransferFunction::Sigmoid { lambda } => 1.0 / (1.0 + (-lambda * x).exp()),
            TransferFunction::FakeSigmoid { lambda } => {
                let z = lambda * x;
                0.5 * z / (1.0 + z.abs()) + 0.5
            }
            TransferFunction::ScaledSigmoid { lambda, min, max } => {
                min + (max - min) / (1.0 + (-lambda * x).exp())
            }
            TransferFunction::Gaussian {
                centre,
                variance,
                max,
            } => max * (-(x - centre) * (x - centre) / variance).exp(),
            TransferFunction::Sin {
                phase,
                span,
                amplitude,
            } => amplitude * (2.0 * PI * x / span + phase).sin(),
            TransferFunction::WinnerTakeAll => x,
        }
    }

    /// Writes `d(output)/d(input)` evaluated at `(x, y)` into `out` and
    /// returns `true`, or returns `false` (leaving `out` untouched) when the
    /// variant has no derivative. Consumed only by backpropagation, which
    /// falls back to an identity Jacobian on `false`.
    pub fn derivate(&self, x: &Vector, y: &Vector, out: &Vector) -> bool {
        debug_assert_eq!(x.len(), out.len(), "derivate size mismatch");
        let n = x.len().min(y.len()).min(out.len());
        match *self {
            TransferFunction::Identity => {
                out.fill(1.0);
                true
            }
            TransferFunction::Linear { m, .. } => {
                out.fill(m);
                true
            }
            TransferFunction::Ramp {
                min_x,
                max_x,
                min_y,
                max_y,
            } => {
                let slope = (max_y - min_y) / (max_x - min_x);
                for i in 0..n {
                    let xi = x.get(i);
                    out.set(i, if xi > min_x && xi < max_x { slope } else { 0.0 });
                }
                true
            }
            TransferFunction::Sigmoid { lambda } => {
                // Expressed through y: d/dx = lambda*y*(1-y).
                for i in 0..n {
                    let yi = y.get(i);
                    out.set(i, lambda * yi * (1.0 - yi));
                }
                true
            }
            TransferFunction::FakeSigmoid { lambda } => {
                // Same form as the sigmoid it approximates.
                for i in 0..n {
                    let yi = y.get(i);
                    out.set(i, lambda * yi * (1.0 - yi));
                }
                true
            }
            TransferFunction::ScaledSigmoid { lambda, min, max } => {
                for i in 0..n {
                    let yi = y.get(i);
                    out.set(i, lambda * (yi - min) * (max - yi) / (max - min));
                }
                true
            }
            TransferFunction::Gaussian {
                centre, variance, ..
            } => {
                for i in 0..n {
                    out.set(i, -2.0 * (x.get(i) - centre) / variance * y.get(i));
                }
                true
            }
            TransferFunction::Sin {
                phase,
                span,
                amplitude,
            } => {
                let w = 2.0 * PI / span;
                for i in 0..n {
                    out.set(i, amplitude * w * (w * x.get(i) + phase).cos());
                }
                true
            }
            TransferFunction::Step { .. } | TransferFunction::WinnerTakeAll => false,
        }
    }

    /// Tag used by the named-property schema.
    pub fn type_name(&self) -> &'static str {
        match self {
            TransferFunction::Identity => "identity",
            TransferFunction::Linear { .. } => "linear",
            TransferFunction::Ramp { .. } => "ramp",
            TransferFunction::Step { .. } => "step",
            TransferFunction::Sigmoid { .. } => "sigmoid",
            TransferFunction::FakeSigmoid { .. } => "fakesigmoid",
            TransferFunction::ScaledSigmoid { .. } => "scaledsigmoid",
            TransferFunction::Gaussian { .. } => "gaussian",
            TransferFunction::Sin { .. } => "sin",
            TransferFunction::WinnerTakeAll => "winnertakeall",
        }
    }

    /// Saves the function as named properties (type tag plus numeric fields).
    pub fn save_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.set("type", self.type_name());
        match *self {
            TransferFunction::Linear { m, b } => {
                props.set("m", m);
                props.set("b", b);
            }
            TransferFunction::Ramp {
                min_x,
                max_x,
                min_y,
                max_y,
            } => {
                props.set("min_x", min_x);
                props.set("max_x", max_x);
                props.set("min_y", min_y);
                props.set("max_y", max_y);
            }
            TransferFunction::Step {
                min,
                max,
                threshold,
            } => {
                props.set("min", min);
                props.set("max", max);
                props.set("threshold", threshold);
            }
            TransferFunction::Sigmoid { lambda }
            | TransferFunction::FakeSigmoid { lambda } => {
                props.set("lambda", lambda);
            }
            TransferFunction::ScaledSigmoid { lambda, min, max } => {
                props.set("lambda", lambda);
                props.set("min", min);
                props.set("max", max);
            }
            TransferFunction::Gaussian {
                centre,
                variance,
                max,
            } => {
                props.set("centre", centre);
                props.set("variance", variance);
                props.set("max", max);
            }
            TransferFunction::Sin {
                phase,
                span,
                amplitude,
            } => {
                props.set("phase", phase);
                props.set("span", span);
                props.set("amplitude", amplitude);
            }
            TransferFunction::Identity | TransferFunction::WinnerTakeAll => {}
        }
        props
    }

    /// Rebuilds a function from its named properties.
    ///
    /// # Errors
    /// `UnknownType` for an unrecognized tag, `PropertyError` for a missing
    /// or unparsable numeric field.
    pub fn from_properties(props: &PropertyMap) -> Result<Self, NeuroGraphError> {
        let tag = props.require("type")?;
        match tag {
            "identity" => Ok(TransferFunction::Identity),
            "linear" => Ok(TransferFunction::Linear {
                m: props.require_parsed("m")?,
                b: props.require_parsed("b")?,
            }),
            "ramp" => Ok(TransferFunction::Ramp {
                min_x: props.require_parsed("min_x")?,
                max_x: props.require_parsed("max_x")?,
                min_y: props.require_parsed("min_y")?,
                max_y: props.require_parsed("max_y")?,
            }),
            "step" => Ok(TransferFunction::Step {
                min: props.require_parsed("min")?,
                max: props.require_parsed("max")?,
                threshold: props.require_parsed("threshold")?,
            }),
            "sigmoid" => Ok(TransferFunction::Sigmoid {
                lambda: props.require_parsed("lambda")?,
            }),
            "fakesigmoid" => Ok(TransferFunction::FakeSigmoid {
                lambda: props.require_parsed("lambda")?,
            }),
            "scaledsigmoid" => Ok(TransferFunction::ScaledSigmoid {
                lambda: props.require_parsed("lambda")?,
                min: props.require_parsed("min")?,
                max: props.require_parsed("max")?,
            }),
            "gaussian" => Ok(TransferFunction::Gaussian {
                centre: props.require_parsed("centre")?,
                variance: props.require_parsed("variance")?,
                max: props.require_parsed("max")?,
            }),
            "sin" => Ok(TransferFunction::Sin {
                phase: props.require_parsed("phase")?,
                span: props.require_parsed("span")?,
                amplitude: props.require_parsed("amplitude")?,
            }),
            "winnertakeall" => Ok(TransferFunction::WinnerTakeAll),
            other => Err(NeuroGraphError::UnknownType {
                type_name: other.to_string(),
                operation: "TransferFunction::from_properties".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "transfer_test.rs"]
mod tests;
