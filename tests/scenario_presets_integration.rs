use std::path::Path;
use std::process::{Command, Output};

use mppt_sim::config::ScenarioConfig;

#[derive(Debug)]
struct Report {
    samples: usize,
    final_efficiency_pct: f64,
    mean_efficiency_pct: f64,
    environment_changes: usize,
}

#[test]
fn scenario_files_match_builtin_presets() {
    for name in ScenarioConfig::PRESETS {
        let path = format!("scenarios/{name}.toml");
        let from_file = ScenarioConfig::from_toml_file(Path::new(&path))
            .unwrap_or_else(|e| panic!("{path} should parse: {e}"));
        let preset = ScenarioConfig::from_preset(name).expect("preset should exist");
        assert_eq!(from_file, preset, "{path} drifted from the `{name}` preset");
    }
}

#[test]
fn scenario_presets_run_via_cli_and_track_the_maximum() {
    let baseline = run_and_parse_report(&["--scenario", "scenarios/baseline.toml"]);
    let linear = run_and_parse_report(&["--scenario", "scenarios/linear.toml"]);
    let power_only = run_and_parse_report(&["--scenario", "scenarios/power_only.toml"]);
    let duty_cycle = run_and_parse_report(&["--scenario", "scenarios/duty_cycle.toml"]);
    let cloudy = run_and_parse_report(&["--scenario", "scenarios/cloudy.toml"]);

    assert_eq!(baseline.samples, 60);
    assert_eq!(linear.samples, 100);
    assert_eq!(power_only.samples, 100);

    assert_eq!(baseline.environment_changes, 2);
    assert_eq!(linear.environment_changes, 0);
    assert_eq!(power_only.environment_changes, 0);
    assert_eq!(duty_cycle.environment_changes, 2);
    assert_eq!(cloudy.environment_changes, 11);

    for (name, report) in [
        ("baseline", &baseline),
        ("linear", &linear),
        ("power_only", &power_only),
        ("duty_cycle", &duty_cycle),
    ] {
        assert!(
            report.final_efficiency_pct > 99.0,
            "{name} should end within 1% of the maximum: {report:?}"
        );
    }
    assert!(
        cloudy.final_efficiency_pct > 90.0,
        "cloudy run lost track: {cloudy:?}"
    );

    assert!(
        (baseline.mean_efficiency_pct - duty_cycle.mean_efficiency_pct).abs() > 0.01,
        "expected baseline and duty_cycle to differ: baseline={:.3}, duty_cycle={:.3}",
        baseline.mean_efficiency_pct,
        duty_cycle.mean_efficiency_pct
    );
}

#[test]
fn preset_flag_matches_scenario_file() {
    let from_preset = run_and_parse_report(&["--preset", "duty_cycle"]);
    let from_file = run_and_parse_report(&["--scenario", "scenarios/duty_cycle.toml"]);
    assert_eq!(from_preset.samples, from_file.samples);
    assert_eq!(
        from_preset.final_efficiency_pct,
        from_file.final_efficiency_pct
    );
}

#[test]
fn quiet_suppresses_per_sample_lines() {
    let quiet = run(&["--preset", "linear", "--quiet"]);
    let verbose = run(&["--preset", "linear"]);
    let quiet_out = String::from_utf8_lossy(&quiet.stdout);
    let verbose_out = String::from_utf8_lossy(&verbose.stdout);

    assert!(!quiet_out.lines().any(|l| l.starts_with("k=")));
    assert_eq!(
        verbose_out.lines().filter(|l| l.starts_with("k=")).count(),
        100
    );
    assert!(quiet_out.contains("--- Tracking Report ---"));
}

#[test]
fn history_out_writes_csv() {
    let path = std::env::temp_dir().join(format!("mppt-sim-history-{}.csv", std::process::id()));
    let path_str = path.to_string_lossy().into_owned();
    let output = run(&["--preset", "baseline", "--quiet", "--history-out", &path_str]);
    assert!(output.status.success());

    let csv = std::fs::read_to_string(&path).expect("CSV should be written");
    let _ = std::fs::remove_file(&path);
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some(
            "iteration,time_s,voltage_v,current_a,power_w,operating_point,\
             irradiance_w_m2,temperature_c,max_power_w,efficiency_pct"
        )
    );
    assert_eq!(lines.count(), 60);
}

#[test]
fn invalid_inputs_exit_with_error() {
    let unknown_preset = run(&["--preset", "nonexistent"]);
    assert!(!unknown_preset.status.success());
    assert!(String::from_utf8_lossy(&unknown_preset.stderr).contains("unknown preset"));

    let missing_file = run(&["--scenario", "scenarios/does_not_exist.toml"]);
    assert!(!missing_file.status.success());

    let unknown_flag = run(&["--bogus"]);
    assert!(!unknown_flag.status.success());
}

#[test]
fn incomplete_or_oversized_scenarios_are_rejected() {
    let linear = std::fs::read_to_string("scenarios/linear.toml").expect("linear.toml exists");
    let dir = std::env::temp_dir();

    let missing_r_sh = dir.join(format!("mppt-sim-no-rsh-{}.toml", std::process::id()));
    std::fs::write(&missing_r_sh, linear.replace("r_sh = 100.0\n", "")).unwrap();
    let output = run(&["--scenario", &missing_r_sh.to_string_lossy()]);
    let _ = std::fs::remove_file(&missing_r_sh);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("r_sh"));

    let huge = dir.join(format!("mppt-sim-huge-{}.toml", std::process::id()));
    std::fs::write(&huge, linear.replace("duration = 100.0", "duration = 1e300")).unwrap();
    let output = run(&["--scenario", &huge.to_string_lossy()]);
    let _ = std::fs::remove_file(&huge);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("simulation.duration"));
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mppt-sim"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("mppt-sim process should run")
}

fn run_and_parse_report(args: &[&str]) -> Report {
    let mut full = args.to_vec();
    full.push("--quiet");
    let output = run(&full);

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    parse_report(&stdout)
}

fn parse_report(stdout: &str) -> Report {
    Report {
        samples: parse_metric(stdout, "Samples:", "") as usize,
        final_efficiency_pct: parse_metric(stdout, "Final efficiency:", "%"),
        mean_efficiency_pct: parse_metric(stdout, "Mean efficiency:", "%"),
        environment_changes: parse_metric(stdout, "Environment changes:", "") as usize,
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing report line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid report format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from report line `{line}`"))
}
