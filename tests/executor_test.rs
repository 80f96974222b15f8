use cryptstrap::CryptstrapError;
use cryptstrap::executor::{
    CommandExecutor, CommandSpec, RealCommandExecutor, StdinPayload, run_checked,
};

#[test]
fn dry_run_skips_command_lookup() {
    let executor = RealCommandExecutor { dry_run: true };
    let spec = CommandSpec::new("definitely-not-a-command", Vec::<String>::new());

    let result = executor
        .execute(&spec)
        .expect("dry run should not require command to exist");
    assert!(result.status.is_none(), "dry run result should not have an exit status");
}

#[test]
fn dry_run_with_stdin_succeeds() {
    let executor = RealCommandExecutor { dry_run: true };
    let spec = CommandSpec::new("cryptsetup", ["open", "--key-file", "-", "/dev/vda2", "root"])
        .with_stdin(StdinPayload::new("secret"));

    run_checked(&executor, &spec).expect("dry run should succeed");
}

#[test]
fn non_dry_run_fails_for_nonexistent_command() {
    let executor = RealCommandExecutor { dry_run: false };
    let spec = CommandSpec::new("this-command-should-not-exist", Vec::<String>::new());

    let result = executor.execute(&spec);

    assert!(result.is_err());
    if let Err(e) = result {
        let msg = e.to_string();
        assert!(
            msg.contains("not found in PATH"),
            "Expected 'not found in PATH' in error, got: {}",
            msg
        );
        let typed = e.downcast_ref::<CryptstrapError>();
        assert!(typed.is_some(), "Expected CryptstrapError, got: {:#}", e);
        assert!(
            matches!(typed.unwrap(), CryptstrapError::CommandNotFound { .. }),
            "Expected CommandNotFound variant, got: {:?}",
            typed.unwrap()
        );
    }
}

#[test]
fn successful_command_reports_success() {
    let executor = RealCommandExecutor { dry_run: false };
    let spec = CommandSpec::new("true", Vec::<String>::new());

    let result = executor.execute(&spec).expect("true should run");
    assert!(result.success());
    assert_eq!(result.code(), Some(0));
}

#[test]
fn run_checked_rejects_non_zero_exit() {
    let executor = RealCommandExecutor { dry_run: false };
    let spec = CommandSpec::new("sh", ["-c", "exit 3"]);

    let err = run_checked(&executor, &spec).unwrap_err();
    match err.downcast_ref::<CryptstrapError>() {
        Some(CryptstrapError::Execution { command, status }) => {
            assert!(command.contains("sh"), "got: {}", command);
            assert!(status.contains('3'), "got: {}", status);
        }
        other => panic!("Expected Execution variant, got: {:?}", other),
    }
}

#[test]
fn stdin_payload_reaches_the_child() {
    let executor = RealCommandExecutor { dry_run: false };
    // Exits 0 only if stdin is exactly the payload, without a trailing newline.
    let spec = CommandSpec::new("sh", ["-c", r#"test "$(cat; echo x)" = "s3cr3tx""#])
        .with_stdin(StdinPayload::new("s3cr3t"));

    run_checked(&executor, &spec).expect("child should read the payload from stdin");
}

#[test]
fn stdin_is_closed_without_payload() {
    let executor = RealCommandExecutor { dry_run: false };
    // Would block forever if stdin were inherited from an interactive terminal.
    let spec = CommandSpec::new("sh", ["-c", r#"test -z "$(cat)""#]);

    run_checked(&executor, &spec).expect("stdin should be empty");
}

#[test]
fn payload_is_not_part_of_the_command_display() {
    let spec = CommandSpec::new("cryptsetup", ["luksFormat", "--key-file", "-", "/dev/sda2"])
        .with_stdin(StdinPayload::new("hunter2"));

    assert!(!spec.display().contains("hunter2"));
    assert!(!format!("{:?}", spec).contains("hunter2"));
}
