use sensirion_sensors::sps30::{self, Sps30};
use sensirion_sensors::{DeviceState, SensorError};
use shdlc::bytes::f32_to_bytes;
use shdlc::{Shdlc, ShdlcError};
use test_support::{init_logging, ScriptedTransport};

fn sensor(script: impl FnOnce(&mut ScriptedTransport)) -> Sps30<ScriptedTransport> {
    init_logging();
    let mut transport = ScriptedTransport::new();
    script(&mut transport);
    Sps30::new(Shdlc::new(transport))
}

fn measurement_payload() -> Vec<u8> {
    [1.0_f32, 2.5, 4.0, 10.0, 0.5, 1.0, 2.5, 4.0, 10.0, 0.6]
        .iter()
        .flat_map(|value| f32_to_bytes(*value))
        .collect()
}

#[test]
fn start_measurement_sends_float_output_mode() {
    let mut sps = sensor(|t| t.push_response(0x00, 0x00, 0x00, &[]));
    sps.start_measurement().expect("start");

    let transport = sps.into_inner().into_inner();
    assert_eq!(
        transport.transmitted(),
        &[vec![0x7e, 0x00, 0x00, 0x02, 0x01, 0x03, 0xf9, 0x7e]]
    );
}

#[test]
fn read_measurement_decodes_ten_floats() {
    let payload = measurement_payload();
    let mut sps = sensor(|t| t.push_response(0x00, 0x03, 0x00, &payload));

    let reading = sps.read_measurement().expect("measurement");
    assert!(reading.is_accurate());
    assert_eq!(reading.value.mc_1p0, 1.0);
    assert_eq!(reading.value.mc_2p5, 2.5);
    assert_eq!(reading.value.nc_0p5, 0.5);
    assert_eq!(reading.value.typical_particle_size, 0.6);
    assert_eq!(sps.shdlc().transport().receive_limits(), &[shdlc::frame::max_rx_frame_len(40)]);
}

#[test]
fn read_measurement_keeps_values_on_device_state() {
    let payload = measurement_payload();
    let mut sps = sensor(|t| t.push_response(0x00, 0x03, 0x43, &payload));

    let reading = sps.read_measurement().expect("measurement with state");
    assert!(!reading.is_accurate());
    assert_eq!(reading.state, DeviceState(0x43));
    assert_eq!(reading.value.mc_10p0, 10.0);
}

#[test]
fn short_measurement_is_not_enough_data() {
    let mut sps = sensor(|t| t.push_response(0x00, 0x03, 0x00, &[0u8; 20]));
    let err = sps.read_measurement().expect_err("short");
    assert!(matches!(err, SensorError::NotEnoughData { expected: 40, received: 20 }));
}

#[test]
fn serial_number_strips_terminator() {
    let mut sps = sensor(|t| t.push_response(0x00, 0xd0, 0x00, b"9A2B3C4D5E6F7A8B\0"));
    assert_eq!(sps.serial_number().expect("serial"), "9A2B3C4D5E6F7A8B");

    let request = &sps.shdlc().transport().requests()[0];
    assert_eq!(request.command, sps30::CMD_DEVICE_INFO);
    assert_eq!(request.data, vec![0x03]);
}

#[test]
fn non_zero_state_fails_plain_commands() {
    let mut sps = sensor(|t| t.push_response(0x00, 0x01, 0x43, &[]));
    let err = sps.stop_measurement().expect_err("state");
    assert_eq!(err.device_state(), Some(DeviceState(0x43)));
}

#[test]
fn wake_up_pulses_before_the_frame() {
    let mut sps = sensor(|t| t.push_response(0x00, 0x11, 0x00, &[]));
    sps.wake_up().expect("wake");

    let transport = sps.into_inner().into_inner();
    assert_eq!(transport.transmitted()[0], vec![0xff]);
    assert_eq!(transport.commands(), vec![sps30::CMD_WAKE_UP]);
}

#[test]
fn probe_ignores_failed_wake_up() {
    let mut sps = sensor(|t| {
        // No reply to the wake-up command, then the serial number.
        t.push_raw(&[]);
        t.push_response(0x00, 0xd0, 0x00, b"SERIAL\0");
    });

    assert_eq!(sps.probe().expect("probe"), "SERIAL");
    assert_eq!(
        sps.shdlc().transport().commands(),
        vec![sps30::CMD_WAKE_UP, sps30::CMD_DEVICE_INFO]
    );
}

#[test]
fn probe_fails_without_a_sensor() {
    let mut sps = sensor(|_| {});
    let err = sps.probe().expect_err("no sensor");
    assert!(matches!(err, SensorError::Shdlc(ShdlcError::MissingStart)));
}

#[test]
fn fan_auto_cleaning_interval_round_trip() {
    let mut sps = sensor(|t| {
        t.push_response(0x00, 0x80, 0x00, &[]);
        t.push_response(0x00, 0x80, 0x00, &[0x00, 0x05, 0x46, 0x00]);
    });

    sps.set_fan_auto_cleaning_interval_days(4).expect("set");
    assert_eq!(sps.fan_auto_cleaning_interval_days().expect("get"), 4);

    let requests = sps.shdlc().transport().requests();
    assert_eq!(requests[0].data, vec![0x00, 0x00, 0x05, 0x46, 0x00]);
    assert_eq!(requests[1].data, vec![0x00]);
}

#[test]
fn interval_days_round_down() {
    let mut sps = sensor(|t| t.push_response(0x00, 0x80, 0x00, &[0x00, 0x00, 0xff, 0xff]));
    assert_eq!(sps.fan_auto_cleaning_interval_days().expect("get"), 0);
}

#[test]
fn read_version_parses_seven_bytes() {
    let mut sps = sensor(|t| t.push_response(0x00, 0xd1, 0x00, &[2, 2, 0, 7, 0, 2, 0]));
    let version = sps.read_version().expect("version");
    assert_eq!(version.firmware_major, 2);
    assert_eq!(version.hardware_revision, 7);
    assert_eq!(version.shdlc_major, 2);
}

#[test]
fn reset_is_transmit_only() {
    let mut sps = sensor(|_| {});
    sps.reset().expect("reset");

    let transport = sps.into_inner().into_inner();
    assert_eq!(transport.commands(), vec![sps30::CMD_RESET]);
    assert!(transport.receive_limits().is_empty());
}

#[test]
fn manual_cleaning_and_sleep_commands() {
    let mut sps = sensor(|t| {
        t.push_response(0x00, 0x56, 0x00, &[]);
        t.push_response(0x00, 0x10, 0x00, &[]);
    });
    sps.start_manual_fan_cleaning().expect("clean");
    sps.sleep().expect("sleep");
    assert_eq!(sps.shdlc().transport().commands(), vec![0x56, 0x10]);
}

#[test]
fn measurement_serializes_as_json_object() {
    let payload = measurement_payload();
    let mut sps = sensor(|t| t.push_response(0x00, 0x03, 0x00, &payload));
    let reading = sps.read_measurement().expect("measurement");

    let json = serde_json::to_value(reading).expect("json");
    assert_eq!(json["state"], 0);
    assert_eq!(json["value"]["mc_2p5"], 2.5);
}

#[test]
fn short_write_surfaces_as_tx_incomplete() {
    let mut sps = sensor(|t| {
        t.limit_writes(4);
        t.push_response(0x00, 0x00, 0x00, &[]);
    });

    let err = sps.start_measurement().expect_err("short write");
    assert!(matches!(
        err,
        SensorError::Shdlc(ShdlcError::TxIncomplete { written: 4, expected: 8 })
    ));

    let transport = sps.into_inner().into_inner();
    assert!(transport.receive_limits().is_empty());
    assert_eq!(transport.pending_replies(), 1);
}

#[test]
fn port_lifecycle_goes_through_the_engine() {
    let mut sps = sensor(|_| {});
    sps.shdlc_mut().open().expect("open");
    assert!(sps.shdlc().transport().is_open());

    sps.shdlc_mut().close().expect("close");
    assert!(!sps.shdlc().transport().is_open());
}
