//! Binary output driven by the gate.

/// A single on/off output. Writes are assumed to succeed; implementations
/// log driver errors instead of returning them.
pub trait Actuator {
    fn set_active(&mut self, active: bool);
}

#[cfg(target_os = "espidf")]
pub use led::LedActuator;

#[cfg(target_os = "espidf")]
mod led {
    use esp_idf_svc::hal::{
        gpio::{Output, OutputPin, PinDriver},
        peripheral::Peripheral,
    };

    use super::Actuator;

    /// LED on a GPIO, active high.
    pub struct LedActuator<'d, P: OutputPin> {
        pin: PinDriver<'d, P, Output>,
    }

    impl<'d, P: OutputPin> LedActuator<'d, P> {
        /// Configures the pin as an output and drives it low.
        pub fn new(pin: impl Peripheral<P = P> + 'd) -> anyhow::Result<Self> {
            let mut pin = PinDriver::output(pin)?;
            pin.set_low()?;
            log::info!("LED actuator on GPIO{} initialised low", pin.pin());
            Ok(Self { pin })
        }
    }

    impl<P: OutputPin> Actuator for LedActuator<'_, P> {
        fn set_active(&mut self, active: bool) {
            let r = if active {
                self.pin.set_high()
            } else {
                self.pin.set_low()
            };
            if let Err(e) = r {
                log::error!("Failed to drive GPIO{}: {:?}", self.pin.pin(), e);
            }
        }
    }
}
