use anyhow::Result;
use quiver::command::{Command, Options};
use quiver::db::{Store, StoreError};
use tempfile::tempdir;
use uuid::Uuid;

fn open_store(dir: &tempfile::TempDir) -> Result<Store> {
    Ok(Store::open(&dir.path().join("store.db"))?)
}

fn sample_command(name: &str, description: &str, template: &str) -> Command {
    Command::new(name, description, template, Options::default()).unwrap()
}

#[test]
fn test_save_and_get_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    let mut cmd = sample_command("backup", "database backup", "pg_dump {{.db}} -f {{.out}}");
    cmd.params[0].description = "database name".to_string();
    cmd.params[1].default_value = "dump.sql".to_string();
    store.save(&cmd)?;

    let fetched = store.get_command_by_id(cmd.id)?;
    assert_eq!(fetched, cmd);
    // Parameter order is insertion order.
    assert_eq!(fetched.params[0].name, "db");
    assert_eq!(fetched.params[1].name, "out");
    Ok(())
}

#[test]
fn test_save_is_an_upsert() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    let mut cmd = sample_command("ls", "", "ls -la {{.path}}");
    store.save(&cmd)?;

    cmd.name = "list".to_string();
    cmd.params[0].default_value = "/tmp".to_string();
    store.save(&cmd)?;

    let fetched = store.get_command_by_id(cmd.id)?;
    assert_eq!(fetched.name, "list");
    assert_eq!(fetched.params.len(), 1);
    assert_eq!(fetched.params[0].default_value, "/tmp");
    Ok(())
}

#[test]
fn test_get_command_not_found() -> Result<()> {
    let dir = tempdir()?;
    let store = open_store(&dir)?;

    let err = store.get_command_by_id(Uuid::now_v7()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    Ok(())
}

#[test]
fn test_list_commands_leaves_params_unpopulated() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    store.save(&sample_command("a", "", "echo {{.x}}"))?;
    store.save(&sample_command("b", "", "echo {{.y}}"))?;

    let commands = store.list_commands()?;
    assert_eq!(commands.len(), 2);
    assert!(commands.iter().all(|c| c.params.is_empty()));
    Ok(())
}

#[test]
fn test_search_ranks_name_above_description() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    store.save(&sample_command("log viewer", "", "journalctl -u unit"))?;
    store.save(&sample_command("log2", "", "tail -f /tmp/a"))?;
    store.save(&sample_command("rotate", "rotate the log file", "savelog /tmp/b"))?;

    let results = store.search_command("log")?;
    assert_eq!(results.len(), 3);
    // Name matches (weight 15) come before the description-only match (5).
    assert_eq!(results[2].name, "rotate");
    assert!(results[..2].iter().all(|c| c.name.starts_with("log")));
    Ok(())
}

#[test]
fn test_search_is_prefix_match() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    store.save(&sample_command("gitlog", "", "git log --oneline"))?;

    let results = store.search_command("gitl")?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "gitlog");

    assert!(store.search_command("nomatch")?.is_empty());
    Ok(())
}

#[test]
fn test_search_empty_term_matches_nothing() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    store.save(&sample_command("present", "", "true"))?;

    // A bare quoted-empty MATCH would be an FTS5 syntax error.
    assert!(store.search_command("")?.is_empty());
    assert!(store.search_command("   \t")?.is_empty());
    Ok(())
}

#[test]
fn test_search_index_follows_updates() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    let mut cmd = sample_command("deploy", "", "make deploy");
    store.save(&cmd)?;
    assert_eq!(store.search_command("deploy")?.len(), 1);

    cmd.name = "release".to_string();
    store.save(&cmd)?;

    // The update trigger rewrote the FTS row.
    assert!(store.search_command("deploy")?.is_empty());
    assert_eq!(store.search_command("release")?.len(), 1);
    Ok(())
}

#[test]
fn test_delete_command_cascades() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    let cmd = sample_command("rmme", "", "echo {{.x}}");
    store.save(&cmd)?;
    store.write_explanation(cmd.id, "ZXhwbGFuYXRpb24=")?;
    store.insert_usage(cmd.id, "echo 1")?;

    store.delete_command(cmd.id)?;

    assert!(matches!(
        store.get_command_by_id(cmd.id),
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        store.read_explanation(cmd.id),
        Err(StoreError::NotFound)
    ));
    assert!(matches!(store.get_history(cmd.id), Err(StoreError::NotFound)));
    // The delete trigger also dropped the FTS mirror row.
    assert!(store.search_command("rmme")?.is_empty());
    Ok(())
}

#[test]
fn test_delete_command_not_found() -> Result<()> {
    let dir = tempdir()?;
    let store = open_store(&dir)?;

    let err = store.delete_command(Uuid::now_v7()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    Ok(())
}

#[test]
fn test_delete_parameters() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    let cmd = sample_command("cp", "", "cp {{.src}} {{.dest}}");
    store.save(&cmd)?;

    store.delete_parameters(&[cmd.params[0].id])?;

    let fetched = store.get_command_by_id(cmd.id)?;
    assert_eq!(fetched.params.len(), 1);
    assert_eq!(fetched.params[0].name, "dest");
    Ok(())
}

#[test]
fn test_update_command_removes_stale_params_atomically() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    let mut cmd = sample_command("two", "", "a {{.p}} b {{.q}}");
    store.save(&cmd)?;
    let stale = cmd.params[1].id;

    cmd.template = "a {{.p}} only".to_string();
    cmd.build();
    store.update_command(&cmd, &[stale])?;

    let fetched = store.get_command_by_id(cmd.id)?;
    assert_eq!(fetched.template, "a {{.p}} only");
    assert_eq!(fetched.params.len(), 1);
    assert_eq!(fetched.params[0].name, "p");
    Ok(())
}

#[test]
fn test_explanation_write_read_delete() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    let cmd = sample_command("doc", "", "man {{.page}}");
    store.save(&cmd)?;

    store.write_explanation(cmd.id, "first")?;
    assert_eq!(store.read_explanation(cmd.id)?, "first");

    // Upsert replaces the single row.
    store.write_explanation(cmd.id, "second")?;
    assert_eq!(store.read_explanation(cmd.id)?, "second");

    store.delete_explanation(cmd.id)?;
    assert!(matches!(
        store.read_explanation(cmd.id),
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        store.delete_explanation(cmd.id),
        Err(StoreError::NotFound)
    ));
    Ok(())
}

#[test]
fn test_history_is_most_recent_first_and_capped() -> Result<()> {
    let dir = tempdir()?;
    let mut store = open_store(&dir)?;

    let cmd = sample_command("head", "", "head {{.file}}");
    store.save(&cmd)?;

    for i in 0..105 {
        store.insert_usage(cmd.id, &format!("head file-{i}"))?;
    }

    let usages = store.get_history(cmd.id)?;
    assert_eq!(usages.len(), 100);
    assert_eq!(usages[0].command, "head file-104");
    assert!(usages
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    Ok(())
}

#[test]
fn test_close_releases_handle() -> Result<()> {
    let dir = tempdir()?;
    let store = open_store(&dir)?;
    store.close()?;
    Ok(())
}
