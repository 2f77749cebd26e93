pub fn assert_cmd_contains(cmd: &str, fragment: &str) {
    assert!(
        cmd.contains(fragment),
        "Expected FFmpeg command to contain '{}' but it didn't.\nCommand: {}",
        fragment,
        cmd
    );
}

pub fn assert_cmd_not_contains(cmd: &str, fragment: &str) {
    assert!(
        !cmd.contains(fragment),
        "Expected FFmpeg command to NOT contain '{}' but it did.\nCommand: {}",
        fragment,
        cmd
    );
}
