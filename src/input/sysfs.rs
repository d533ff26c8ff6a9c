use super::Board;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// PWM LEDs run at 1 kHz
const PWM_PERIOD_NS: u64 = 1_000_000;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Board {
        path: path.to_path_buf(),
        source,
    }
}

fn write_attr(path: &Path, value: &str) -> Result<()> {
    fs::write(path, value).map_err(io_err(path))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// A sysfs GPIO line, exported for the lifetime of the value
pub struct GpioPin {
    root: PathBuf,
    number: u32,
    direction: Direction,
    exported_here: bool,
}

impl GpioPin {
    pub fn open(sysfs_root: &Path, number: u32, direction: Direction) -> Result<Self> {
        let root = sysfs_root.join("class/gpio");
        let pin_dir = root.join(format!("gpio{}", number));

        let exported_here = !pin_dir.exists();
        if exported_here {
            write_attr(&root.join("export"), &number.to_string())?;
        }

        let pin = Self {
            root,
            number,
            direction,
            exported_here,
        };
        let dir = match direction {
            Direction::In => "in",
            Direction::Out => "out",
        };
        write_attr(&pin.attr("direction"), dir)?;

        tracing::debug!("GPIO {} opened as {}", number, dir);
        Ok(pin)
    }

    fn attr(&self, name: &str) -> PathBuf {
        self.root.join(format!("gpio{}", self.number)).join(name)
    }

    pub fn read(&self) -> Result<bool> {
        let path = self.attr("value");
        let value = fs::read_to_string(&path).map_err(io_err(&path))?;
        Ok(value.trim() == "1")
    }

    pub fn write(&self, high: bool) -> Result<()> {
        write_attr(&self.attr("value"), if high { "1" } else { "0" })
    }
}

impl Drop for GpioPin {
    fn drop(&mut self) {
        if self.direction == Direction::Out {
            if let Err(e) = self.write(false) {
                tracing::warn!("Failed to clear GPIO {}: {}", self.number, e);
            }
        }
        if self.exported_here {
            if let Err(e) = write_attr(&self.root.join("unexport"), &self.number.to_string()) {
                tracing::warn!("Failed to unexport GPIO {}: {}", self.number, e);
            }
        }
    }
}

/// A sysfs PWM channel driven as a dimmable LED
pub struct PwmChannel {
    chip_dir: PathBuf,
    channel: u32,
    exported_here: bool,
}

impl PwmChannel {
    /// Export, set 1 kHz with zero duty and enable
    pub fn open(sysfs_root: &Path, chip: u32, channel: u32) -> Result<Self> {
        let chip_dir = sysfs_root.join(format!("class/pwm/pwmchip{}", chip));
        let exported_here = !chip_dir.join(format!("pwm{}", channel)).exists();
        if exported_here {
            write_attr(&chip_dir.join("export"), &channel.to_string())?;
        }

        let pwm = Self {
            chip_dir,
            channel,
            exported_here,
        };
        write_attr(&pwm.attr("period"), &PWM_PERIOD_NS.to_string())?;
        write_attr(&pwm.attr("duty_cycle"), "0")?;
        write_attr(&pwm.attr("enable"), "1")?;

        tracing::debug!("PWM chip {} channel {} enabled", chip, channel);
        Ok(pwm)
    }

    fn attr(&self, name: &str) -> PathBuf {
        self.chip_dir.join(format!("pwm{}", self.channel)).join(name)
    }

    /// Duty cycle as a fraction of the period, clamped to [0, 1]
    pub fn set_duty(&self, fraction: f64) -> Result<()> {
        let duty = (fraction.clamp(0.0, 1.0) * PWM_PERIOD_NS as f64).round() as u64;
        write_attr(&self.attr("duty_cycle"), &duty.to_string())
    }
}

impl Drop for PwmChannel {
    fn drop(&mut self) {
        if let Err(e) = write_attr(&self.attr("enable"), "0") {
            tracing::warn!("Failed to disable PWM channel {}: {}", self.channel, e);
        }
        if self.exported_here {
            if let Err(e) = write_attr(&self.chip_dir.join("unexport"), &self.channel.to_string())
            {
                tracing::warn!("Failed to unexport PWM channel {}: {}", self.channel, e);
            }
        }
    }
}

/// An LED wired either to a plain GPIO or to a PWM channel
pub enum Led {
    Gpio(GpioPin),
    Pwm(PwmChannel),
}

impl Led {
    pub fn set(&self, on: bool) -> Result<()> {
        match self {
            Led::Gpio(pin) => pin.write(on),
            Led::Pwm(pwm) => pwm.set_duty(if on { 1.0 } else { 0.0 }),
        }
    }
}

/// Linux sysfs front panel
///
/// Every pin is released when the board is dropped, including on error
/// paths part way through construction.
pub struct SysfsBoard {
    buttons: Vec<GpioPin>,
    leds: Vec<Led>,
    active_low: bool,
}

/// Where an LED is wired on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPin {
    Gpio(u32),
    /// PWM chip number, channel 0
    Pwm(u32),
}

impl SysfsBoard {
    /// Button GPIOs on the Edge TPU dev board (active low)
    pub const DEV_BOARD_BUTTONS: [u32; 5] = [6, 138, 140, 7, 141];

    /// LED wiring on the Edge TPU dev board
    pub const DEV_BOARD_LEDS: [LedPin; 5] = [
        LedPin::Pwm(2),
        LedPin::Gpio(73),
        LedPin::Pwm(1),
        LedPin::Pwm(0),
        LedPin::Gpio(77),
    ];

    pub fn open(
        sysfs_root: &Path,
        buttons: &[u32],
        leds: &[LedPin],
        active_low: bool,
    ) -> Result<Self> {
        // Every button mirrors onto the LED of the same line
        if buttons.len() != leds.len() {
            return Err(Error::LedCountMismatch {
                buttons: buttons.len(),
                leds: leds.len(),
            });
        }

        let buttons = buttons
            .iter()
            .map(|&n| GpioPin::open(sysfs_root, n, Direction::In))
            .collect::<Result<Vec<_>>>()?;
        let leds = leds
            .iter()
            .map(|&pin| match pin {
                LedPin::Gpio(n) => GpioPin::open(sysfs_root, n, Direction::Out).map(Led::Gpio),
                LedPin::Pwm(chip) => PwmChannel::open(sysfs_root, chip, 0).map(Led::Pwm),
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            "Opened board with {} buttons and {} LEDs",
            buttons.len(),
            leds.len()
        );
        Ok(Self {
            buttons,
            leds,
            active_low,
        })
    }

    pub fn dev_board() -> Result<Self> {
        Self::open(
            Path::new("/sys"),
            &Self::DEV_BOARD_BUTTONS,
            &Self::DEV_BOARD_LEDS,
            true,
        )
    }
}

impl Board for SysfsBoard {
    fn line_count(&self) -> usize {
        self.buttons.len()
    }

    fn set_line(&mut self, index: usize, on: bool) -> Result<()> {
        let count = self.leds.len();
        self.leds
            .get(index)
            .ok_or(Error::LineOutOfRange { index, count })?
            .set(on)
    }

    fn read_raw(&mut self) -> Result<Vec<bool>> {
        self.buttons
            .iter()
            .map(|pin| pin.read().map(|high| high != self.active_low))
            .collect()
    }
}
