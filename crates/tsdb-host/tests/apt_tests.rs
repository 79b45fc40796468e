use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;
use tsdb_host::{Apt, HostCommand, PackageSpec, Systemd};

#[rstest]
#[case(Apt::update_command(), "apt-get update -qq")]
#[case(Apt::dist_upgrade_command(), "apt-get dist-upgrade -y")]
#[case(Apt::install_local_command(Path::new("/res/deb")), "dpkg -i /res/deb")]
#[case(Systemd::restart_command("postgresql"), "systemctl restart postgresql")]
fn test_privileged_commands(#[case] command: HostCommand, #[case] rendered: &str) {
    assert!(command.privileged);
    assert_eq!(command.to_string(), rendered);
    assert_eq!(command.argv(true)[0], "sudo");
}

#[test]
fn test_install_command_pins_each_package() {
    let pin = Some("2.11.2~ubuntu22.04");
    let command = Apt::install_command(&[
        PackageSpec::new("timescaledb-2-postgresql-14", pin),
        PackageSpec::new("timescaledb-2-loader-postgresql-14", pin),
    ]);

    assert_eq!(
        command.to_string(),
        "apt-get install -y timescaledb-2-postgresql-14=2.11.2~ubuntu22.04 \
         timescaledb-2-loader-postgresql-14=2.11.2~ubuntu22.04"
    );
}

