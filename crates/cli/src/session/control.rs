//! Built-in driver: constant throttle, straight ahead.

use contracts::{ControlIntent, ControlSource, VehicleControl};

/// Holds a fixed throttle and never asks to quit
#[derive(Debug, Clone)]
pub struct CruiseControl {
    throttle: f32,
}

impl CruiseControl {
    pub fn new(throttle: f32) -> Self {
        Self {
            throttle: throttle.clamp(0.0, 1.0),
        }
    }
}

impl ControlSource for CruiseControl {
    fn poll(&mut self, _control: &VehicleControl) -> ControlIntent {
        ControlIntent {
            throttle: self.throttle,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_clamped() {
        let mut control = CruiseControl::new(1.7);
        let intent = control.poll(&VehicleControl::default());
        assert_eq!(intent.throttle, 1.0);
        assert!(!intent.quit);
        assert!(!intent.reverse_toggle);
    }
}
