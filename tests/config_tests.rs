use botswarm::Config;
use std::io::Write;

#[tokio::test]
async fn the_shipped_config_matches_the_defaults() {
    let loaded = Config::from_file("config.toml").await.unwrap();
    let defaults = Config::default();

    assert_eq!(loaded.vision.workers, defaults.vision.workers);
    assert_eq!(loaded.grid.cell_size, defaults.grid.cell_size);
    assert_eq!(
        loaded.planner.exclusion_radius_cm,
        defaults.planner.exclusion_radius_cm
    );
    assert_eq!(loaded.steering.max_power, defaults.steering.max_power);
    assert_eq!(loaded.pursuit.target_id, defaults.pursuit.target_id);
    assert_eq!(loaded.radio.max_stop_all, defaults.radio.max_stop_all);
    assert_eq!(loaded.radio.device, None);
}

#[tokio::test]
async fn overrides_are_read_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[vision]
workers = 5
dispatch_interval_ms = 33
marker_size_cm = 10.0

[grid]
cell_size = 16

[planner]
clearance_level = 2
exclusion_radius_cm = 20.0
replan_interval_ms = 250

[steering]
max_power = 150
p_gain = 4.0
d_gain = 0.5
motors_angle_thresh = 45
turn_speed = 80
closest_node_dist_cm = 7.5

[pursuit]
target_id = 3
undetected_limit = 5

[radio]
device = "/dev/ttyACM0"
baud_rate = 57600
preamble = 0
end_hold_ms = 400
drive_deadline_ms = 5000
turn_deadline_ms = 1500
max_stop_all = 4
log_interval_ms = 100
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).await.unwrap();
    assert_eq!(config.vision.workers, 5);
    assert_eq!(config.grid.cell_size, 16);
    assert_eq!(config.pursuit.target_id, 3);
    assert_eq!(config.radio.device.as_deref(), Some("/dev/ttyACM0"));
    assert_eq!(config.radio.baud_rate, 57_600);
}

#[tokio::test]
async fn a_missing_file_is_an_error() {
    assert!(Config::from_file("does-not-exist.toml").await.is_err());
}
