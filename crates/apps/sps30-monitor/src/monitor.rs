use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use sensirion_sensors::sps30::SECONDS_PER_DAY;
use sensirion_sensors::VersionInformation;
use shdlc::Transport;

use crate::config::MonitorSettings;
use crate::output::{CleaningInterval, DeviceInfo, Printer, Sample};
use crate::sensor::Sensor;

pub fn info<T: Transport, W: Write>(
    sensor: &mut Sensor<T>,
    printer: &mut Printer<W>,
) -> anyhow::Result<()> {
    let serial_number = sensor.probe().context("sensor probing failed")?;
    let version = match sensor.read_version() {
        Ok(version) => Some(version),
        Err(err) => {
            log::warn!("error reading version information: {err}");
            None
        }
    };
    let status_register = sensor
        .read_device_status_register()
        .context("failed to read device status register")?;

    printer.info(&DeviceInfo { sensor: sensor.kind(), serial_number, version, status_register })?;
    Ok(())
}

/// Starts a measurement, prints `count` samples `interval` apart, and stops.
pub fn measure<T: Transport, W: Write>(
    sensor: &mut Sensor<T>,
    printer: &mut Printer<W>,
    count: u32,
    interval: Duration,
) -> anyhow::Result<()> {
    sensor.probe().context("sensor probing failed")?;
    sensor.start_measurement().context("failed to start measurement")?;

    let result = sample_batch(sensor, printer, 0, count, interval);

    let stopped = sensor.stop_measurement().context("failed to stop measurement");
    if let Err(err) = &stopped {
        log::warn!("{err:#}");
    }
    result.and(stopped)
}

/// Runs measurement cycles until `cycles` is reached, or forever when `None`.
///
/// Each cycle measures for `samples_per_cycle` samples, then stops and idles,
/// putting the sensor to sleep when its firmware allows. Command failures
/// inside a cycle are logged and the loop carries on.
pub fn monitor<T: Transport, W: Write>(
    sensor: &mut Sensor<T>,
    printer: &mut Printer<W>,
    settings: &MonitorSettings,
    cycles: Option<u64>,
) -> anyhow::Result<()> {
    let serial_number = sensor.probe().context("sensor probing failed")?;
    log::info!("{} sensor probing successful, serial {}", sensor.kind(), serial_number);

    let version = read_version_logged(sensor);
    let can_sleep = sensor.supports_sleep(version.as_ref());

    if let Some(days) = settings.auto_clean_days {
        if let Err(err) = sensor.set_fan_auto_cleaning_interval_days(days) {
            log::warn!("error setting the auto-clean interval: {err:#}");
        }
    }

    let mut cycle = 0;
    while cycles.map_or(true, |limit| cycle < limit) {
        match sensor.start_measurement() {
            Ok(()) => log::info!("measurements started"),
            Err(err) => log::warn!("error starting measurement: {err}"),
        }

        sample_batch(sensor, printer, cycle, settings.samples_per_cycle, settings.sample_interval())?;

        if let Err(err) = sensor.stop_measurement() {
            log::warn!("stopping measurement failed: {err}");
        }
        if can_sleep {
            if let Err(err) = sensor.sleep() {
                log::warn!("entering sleep failed: {err:#}");
            }
        }

        log::info!("no measurements for {} s", settings.idle_secs);
        sensor.pause(settings.idle());

        if can_sleep {
            if let Err(err) = sensor.wake_up() {
                log::warn!("error waking up sensor: {err:#}");
            }
        }
        cycle += 1;
    }

    Ok(())
}

pub fn clean<T: Transport, W: Write>(
    sensor: &mut Sensor<T>,
    printer: &mut Printer<W>,
) -> anyhow::Result<()> {
    sensor.probe().context("sensor probing failed")?;
    sensor.start_manual_fan_cleaning().context("failed to start fan cleaning")?;
    printer.message("fan cleaning started")?;
    Ok(())
}

/// Prints the auto-cleaning interval, setting it first when `days` is given.
pub fn auto_clean<T: Transport, W: Write>(
    sensor: &mut Sensor<T>,
    printer: &mut Printer<W>,
    days: Option<u8>,
) -> anyhow::Result<()> {
    sensor.probe().context("sensor probing failed")?;
    if let Some(days) = days {
        sensor
            .set_fan_auto_cleaning_interval_days(days)
            .context("failed to set the auto-clean interval")?;
    }
    let seconds =
        sensor.fan_auto_cleaning_interval().context("failed to read the auto-clean interval")?;
    printer.cleaning_interval(CleaningInterval { seconds, days: seconds / SECONDS_PER_DAY })?;
    Ok(())
}

pub fn reset<T: Transport, W: Write>(
    sensor: &mut Sensor<T>,
    printer: &mut Printer<W>,
) -> anyhow::Result<()> {
    sensor.reset().context("failed to send reset")?;
    printer.message("reset sent")?;
    Ok(())
}

fn read_version_logged<T: Transport>(sensor: &mut Sensor<T>) -> Option<VersionInformation> {
    match sensor.read_version() {
        Ok(version) => {
            log::info!("{version}");
            Some(version)
        }
        Err(err) => {
            log::warn!("error reading version information: {err}");
            None
        }
    }
}

/// Read failures are logged; only output errors end the batch.
fn sample_batch<T: Transport, W: Write>(
    sensor: &mut Sensor<T>,
    printer: &mut Printer<W>,
    cycle: u64,
    count: u32,
    interval: Duration,
) -> anyhow::Result<()> {
    for index in 0..count {
        match sensor.read_measurement() {
            Ok(measured) => printer.sample(&Sample {
                cycle,
                index,
                state: measured.state,
                accurate: measured.is_accurate(),
                reading: measured.value,
            })?,
            Err(err) => log::warn!("error reading measurement: {err}"),
        }
        sensor.pause(interval);
    }
    Ok(())
}
