//! Vocabulary for describing a head-calibration setup: which recharge model
//! and response function to fit, how to sample the observed head, and
//! whether to add an AR noise model. The description is passive; the fit
//! itself is performed by an external solver.

use crate::series::align::{resample_daily, Aggregation};
use crate::series::error::SeriesError;
use crate::series::frame::TimeSeries;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A name that does not match any variant of one of the closed vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} '{name}'")]
pub struct UnknownVariant {
    pub(crate) kind: &'static str,
    pub(crate) name: String,
}

/// How recharge is derived from precipitation and evaporation stresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RechargeModel {
    #[default]
    Linear,
    FlexModel,
    Berendrecht,
}

impl RechargeModel {
    pub const ALL: [RechargeModel; 3] = [
        RechargeModel::Linear,
        RechargeModel::FlexModel,
        RechargeModel::Berendrecht,
    ];

    pub(crate) fn name(&self) -> &'static str {
        match self {
            RechargeModel::Linear => "Linear",
            RechargeModel::FlexModel => "FlexModel",
            RechargeModel::Berendrecht => "Berendrecht",
        }
    }
}

impl fmt::Display for RechargeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RechargeModel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Linear" => Ok(RechargeModel::Linear),
            "FlexModel" => Ok(RechargeModel::FlexModel),
            "Berendrecht" => Ok(RechargeModel::Berendrecht),
            other => Err(UnknownVariant {
                kind: "recharge model",
                name: other.to_string(),
            }),
        }
    }
}

/// The impulse-response shape relating recharge to head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseFunction {
    #[default]
    Exponential,
    Gamma,
    DoubleExponential,
    Hantush,
    FourParam,
}

impl ResponseFunction {
    pub const ALL: [ResponseFunction; 5] = [
        ResponseFunction::Exponential,
        ResponseFunction::Gamma,
        ResponseFunction::DoubleExponential,
        ResponseFunction::Hantush,
        ResponseFunction::FourParam,
    ];

    pub(crate) fn name(&self) -> &'static str {
        match self {
            ResponseFunction::Exponential => "Exponential",
            ResponseFunction::Gamma => "Gamma",
            ResponseFunction::DoubleExponential => "DoubleExponential",
            ResponseFunction::Hantush => "Hantush",
            ResponseFunction::FourParam => "FourParam",
        }
    }
}

impl fmt::Display for ResponseFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ResponseFunction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Exponential" => Ok(ResponseFunction::Exponential),
            "Gamma" => Ok(ResponseFunction::Gamma),
            "DoubleExponential" => Ok(ResponseFunction::DoubleExponential),
            "Hantush" => Ok(ResponseFunction::Hantush),
            "FourParam" => Ok(ResponseFunction::FourParam),
            other => Err(UnknownVariant {
                kind: "response function",
                name: other.to_string(),
            }),
        }
    }
}

/// A complete calibration configuration.
///
/// The default keeps the observed head at its original sampling, fits a
/// linear recharge model through an exponential response, and adds no
/// noise model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationSpec {
    pub recharge_model: RechargeModel,
    pub response_function: ResponseFunction,
    /// `None` keeps the head series at its original sampling.
    pub head_aggregation: Option<Aggregation>,
    pub ar_noise: bool,
}

impl CalibrationSpec {
    /// Applies the configured head aggregation to an observed head series.
    pub fn prepare_head(&self, head: &TimeSeries) -> Result<TimeSeries, SeriesError> {
        match self.head_aggregation {
            Some(method) => resample_daily(head, method),
            None => Ok(head.clone()),
        }
    }
}
