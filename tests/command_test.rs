use quiver::command::{Argument, Command, CommandError, Options, Parameter};

#[test]
fn test_new_derives_parameters_from_template() {
    let cmd = Command::new("echo", "simple echo", "echo '{{.text}}'", Options::default()).unwrap();

    assert_eq!(cmd.params.len(), 1);
    assert_eq!(cmd.params[0].name, "text");
    assert!(!cmd.id.is_nil());
}

#[test]
fn test_new_with_seed_parameters() {
    let mut seed = Parameter::new("host");
    seed.description = "target host".to_string();
    seed.default_value = "localhost".to_string();

    let cmd = Command::new(
        "ping",
        "",
        "ping -c 3 {{.host}}",
        Options { params: vec![seed] },
    )
    .unwrap();

    assert_eq!(cmd.params.len(), 1);
    assert_eq!(cmd.params[0].description, "target host");
    assert_eq!(cmd.params[0].default_value, "localhost");
}

#[test]
fn test_new_rejects_seed_not_in_template() {
    let err = Command::new(
        "ping",
        "",
        "ping -c 3 {{.host}}",
        Options {
            params: vec![Parameter::new("count")],
        },
    )
    .unwrap_err();

    assert_eq!(err, CommandError::ParameterNotInTemplate("count".to_string()));
}

#[test]
fn test_build_is_idempotent() {
    let mut cmd = Command::new("mv", "", "mv {{.src}} {{.dest}}", Options::default()).unwrap();
    cmd.build();
    let first = cmd.clone();
    cmd.build();
    assert_eq!(cmd, first);
}

#[test]
fn test_build_preserves_metadata_by_name() {
    let mut cmd = Command::new("df", "", "df -h {{.path}} {{.extra}}", Options::default()).unwrap();
    cmd.params[0].description = "mount point".to_string();
    cmd.params[0].default_value = "/".to_string();
    let path_id = cmd.params[0].id;

    // Template change drops `extra` and keeps `path`.
    cmd.template = "df -h {{.path}}".to_string();
    cmd.build();

    assert_eq!(cmd.params.len(), 1);
    assert_eq!(cmd.params[0].id, path_id);
    assert_eq!(cmd.params[0].description, "mount point");
    assert_eq!(cmd.params[0].default_value, "/");
}

#[test]
fn test_build_rename_drops_metadata() {
    let mut cmd = Command::new("cat", "", "cat {{.file}}", Options::default()).unwrap();
    cmd.params[0].description = "the file".to_string();
    let old_id = cmd.params[0].id;

    cmd.template = "cat {{.path}}".to_string();
    cmd.build();

    // A renamed placeholder is a new parameter with fresh metadata.
    assert_eq!(cmd.params.len(), 1);
    assert_eq!(cmd.params[0].name, "path");
    assert_ne!(cmd.params[0].id, old_id);
    assert!(cmd.params[0].description.is_empty());
}

#[test]
fn test_build_mints_id_when_nil() {
    let mut cmd = Command::new("ls", "", "ls -la", Options::default()).unwrap();
    cmd.id = uuid::Uuid::nil();
    cmd.build();
    assert!(!cmd.id.is_nil());
}

#[test]
fn test_compile_simple() {
    let mut cmd = Command::new("echo", "simple echo", "echo '{{.text}}'", Options::default())
        .unwrap();
    let out = cmd.compile(&[Argument::new("text", "hello")]).unwrap();
    assert_eq!(out, "echo 'hello'");
}

#[test]
fn test_compile_arity_mismatch() {
    let mut cmd = Command::new("echo", "", "echo {{.a}} {{.b}}", Options::default()).unwrap();
    let err = cmd.compile(&[Argument::new("a", "x")]).unwrap_err();
    assert_eq!(err, CommandError::ArityMismatch { expected: 2, got: 1 });
}

#[test]
fn test_compile_unknown_argument() {
    let mut cmd = Command::new("echo", "", "echo {{.a}}", Options::default()).unwrap();
    let err = cmd.compile(&[Argument::new("b", "x")]).unwrap_err();
    assert_eq!(err, CommandError::UnknownArgument("b".to_string()));
}

#[test]
fn test_duplicate_placeholder_collapses() {
    let mut cmd = Command::new("dup", "", "{{.x}} and {{.x}}", Options::default()).unwrap();

    assert_eq!(cmd.params.len(), 1);
    assert_eq!(cmd.params[0].name, "x");

    let out = cmd.compile(&[Argument::new("x", "y")]).unwrap();
    assert_eq!(out, "y and y");
}

#[test]
fn test_compile_no_parameters() {
    let mut cmd = Command::new("uptime", "", "uptime", Options::default()).unwrap();
    assert!(cmd.params.is_empty());
    assert_eq!(cmd.compile(&[]).unwrap(), "uptime");
}
