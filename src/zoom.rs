//! Camera zoom capability and constraint values.

use nokhwa::utils::{CameraControl, ControlValueDescription, ControlValueSetter};

/// Zoom bounds reported by the active camera at session start.
///
/// Absent entirely on devices that expose no zoom range; requested values
/// are clamped to `[min, max]`, never applied verbatim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomCapability {
    pub min: f64,
    pub max: f64,
    pub current: f64,
    /// Whether the underlying control takes integer values.
    integral: bool,
}

impl ZoomCapability {
    /// Read the zoom range out of a camera control descriptor, if the
    /// control exposes one.
    pub(crate) fn from_control(control: &CameraControl) -> Option<Self> {
        match control.description().clone() {
            ControlValueDescription::IntegerRange {
                min, max, value, ..
            } => Some(Self {
                min: min as f64,
                max: max as f64,
                current: value as f64,
                integral: true,
            }),
            ControlValueDescription::FloatRange {
                min, max, value, ..
            } => Some(Self {
                min,
                max,
                current: value,
                integral: false,
            }),
            _ => None,
        }
    }

    /// Clamp a requested zoom level into the reported range.
    pub fn clamp(&self, requested: f64) -> f64 {
        requested.clamp(self.min, self.max)
    }

    /// Constraint value for applying `level` to the camera control.
    pub(crate) fn setter(&self, level: f64) -> ControlValueSetter {
        if self.integral {
            ControlValueSetter::Integer(level.round() as i64)
        } else {
            ControlValueSetter::Float(level)
        }
    }

    #[cfg(test)]
    pub(crate) fn test_range(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            current: min,
            integral: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_above_maximum() {
        let cap = ZoomCapability::test_range(1.0, 4.0);
        assert_eq!(cap.clamp(10.0), 4.0);
    }

    #[test]
    fn clamps_below_minimum() {
        let cap = ZoomCapability::test_range(1.0, 4.0);
        assert_eq!(cap.clamp(0.25), 1.0);
    }

    #[test]
    fn in_range_values_pass_through() {
        let cap = ZoomCapability::test_range(1.0, 4.0);
        assert_eq!(cap.clamp(2.5), 2.5);
    }

    #[test]
    fn integral_controls_round_the_setter() {
        let cap = ZoomCapability {
            min: 1.0,
            max: 8.0,
            current: 1.0,
            integral: true,
        };
        assert_eq!(cap.setter(2.6), ControlValueSetter::Integer(3));
    }

    #[test]
    fn float_controls_keep_the_setter_exact() {
        let cap = ZoomCapability::test_range(1.0, 8.0);
        assert_eq!(cap.setter(2.6), ControlValueSetter::Float(2.6));
    }
}
