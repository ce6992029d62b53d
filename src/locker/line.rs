use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

/// A single digital output driving the lock relay
pub trait RelayLine: Send {
    /// Drive the relay into its energised (`true`) or released (`false`) state
    fn set_active(&mut self, active: bool) -> io::Result<()>;
}

/// Relay line on the Linux sysfs GPIO interface
#[derive(Debug)]
pub struct SysfsRelayLine {
    pin: u32,
    line: u32,
    active_low: bool,
    value: File,
}

/// A `gpiochipN` entry under the sysfs root
#[derive(Debug, Clone, PartialEq)]
struct GpioChip {
    base: u32,
    ngpio: u32,
    label: String,
}

impl SysfsRelayLine {
    /// Export BCM `pin` under `gpio_root`, configure it as an output and leave
    /// the relay released.
    ///
    /// Newer kernels number sysfs lines from the chip base (512 on a Pi 4), so
    /// the pin is offset by the base of the SoC pin controller.
    pub fn open<P: AsRef<Path>>(gpio_root: P, pin: u32, active_low: bool) -> io::Result<Self> {
        let gpio_root = gpio_root.as_ref();
        let line = resolve_line(gpio_root, pin)?;
        let line_dir = gpio_root.join(format!("gpio{}", line));

        if !line_dir.is_dir() {
            debug!(
                "Exporting GPIO {} as sysfs line {} via {}",
                pin,
                line,
                gpio_root.display()
            );
            fs::write(gpio_root.join("export"), line.to_string())?;
        }

        if !line_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} did not appear after export", line_dir.display()),
            ));
        }

        // Direction and released level in a single write
        let released_level = if active_low { "high" } else { "low" };
        fs::write(line_dir.join("direction"), released_level)?;

        let value = OpenOptions::new()
            .write(true)
            .open(line_dir.join("value"))?;

        let mut relay = Self {
            pin,
            line,
            active_low,
            value,
        };
        relay.set_active(false)?;

        Ok(relay)
    }

    /// BCM pin number
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Kernel sysfs line number backing the pin
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// Map a BCM pin to its sysfs line number.
///
/// Without any `gpiochip*` entries the pin is used as-is.
fn resolve_line(gpio_root: &Path, pin: u32) -> io::Result<u32> {
    let mut chips = Vec::new();
    if let Ok(entries) = fs::read_dir(gpio_root) {
        for entry in entries.flatten() {
            let is_chip = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("gpiochip"));
            if is_chip {
                match read_chip(&entry.path()) {
                    Ok(chip) => chips.push(chip),
                    Err(e) => debug!("Skipping {}: {}", entry.path().display(), e),
                }
            }
        }
    }

    let Some(chip) = select_soc_chip(&chips) else {
        return Ok(pin);
    };

    if pin >= chip.ngpio {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "GPIO {} is out of range for {} ({} lines)",
                pin, chip.label, chip.ngpio
            ),
        ));
    }

    debug!(
        "GPIO {} maps to sysfs line {} on {}",
        pin,
        chip.base + pin,
        chip.label
    );
    Ok(chip.base + pin)
}

fn read_chip(dir: &Path) -> io::Result<GpioChip> {
    let read_number = |name: &str| -> io::Result<u32> {
        fs::read_to_string(dir.join(name))?
            .trim()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{}: {}", name, e)))
    };

    Ok(GpioChip {
        base: read_number("base")?,
        ngpio: read_number("ngpio")?,
        label: fs::read_to_string(dir.join("label"))
            .map(|label| label.trim().to_string())
            .unwrap_or_default(),
    })
}

/// The SoC pin controller carries the BCM header pins; otherwise take the
/// lowest-numbered chip.
fn select_soc_chip(chips: &[GpioChip]) -> Option<&GpioChip> {
    chips
        .iter()
        .filter(|chip| chip.label.starts_with("pinctrl-"))
        .min_by_key(|chip| chip.base)
        .or_else(|| chips.iter().min_by_key(|chip| chip.base))
}

impl RelayLine for SysfsRelayLine {
    fn set_active(&mut self, active: bool) -> io::Result<()> {
        let high = active != self.active_low;
        let level: &[u8] = if high { b"1" } else { b"0" };

        self.value.seek(SeekFrom::Start(0))?;
        self.value.write_all(level)?;
        self.value.flush()?;

        debug!(
            "GPIO {} set {} (sysfs line {} {})",
            self.pin,
            if active { "ON" } else { "OFF" },
            self.line,
            if high { "high" } else { "low" }
        );

        Ok(())
    }
}
