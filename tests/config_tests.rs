use agrisense_simulator::config::Settings;
use agrisense_simulator::errors::SimulatorError;

#[test]
fn command_line_overrides_win_over_files() {
    let settings = Settings::load(Some("http://192.168.1.20:3000/api/sensors/data".to_string()), Some(3)).unwrap();
    assert_eq!(settings.simulator.api_url, "http://192.168.1.20:3000/api/sensors/data");
    assert_eq!(settings.simulator.interval_secs, 3);
    assert_eq!(settings.simulator.request_timeout_secs, 5);
}

#[test]
fn invalid_overrides_are_rejected() {
    let bad_url = Settings::load(Some("localhost:3000".to_string()), None);
    assert!(matches!(bad_url, Err(SimulatorError::ConfigError(_))));

    let zero_interval = Settings::load(None, Some(0));
    assert!(matches!(zero_interval, Err(SimulatorError::ConfigError(_))));
}
