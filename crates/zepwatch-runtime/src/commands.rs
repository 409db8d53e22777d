//! `zepwatch config` and `zepwatch identity`.

use anyhow::bail;
use zepwatch_store::namespace::{clear_identity, read_identity, read_settings, write_settings};
use zepwatch_store::{KvStore, SettingsPatch};

use crate::cli::{ConfigCommand, IdentityCommand, SetOpts};

pub fn config(store: &impl KvStore, cmd: ConfigCommand) -> anyhow::Result<String> {
    match cmd {
        ConfigCommand::Show => {}
        ConfigCommand::Set(opts) => {
            let patch = patch_from(&opts);
            if patch.is_empty() {
                bail!("nothing to set; pass --cooldown-ms, --only-when-private-on or --debug");
            }
            let changes = write_settings(store, patch)?;
            tracing::info!(changed = changes.len(), "settings written");
        }
    }
    Ok(serde_json::to_string_pretty(&read_settings(store))?)
}

pub fn identity(store: &impl KvStore, cmd: IdentityCommand) -> anyhow::Result<String> {
    match cmd {
        IdentityCommand::Show => Ok(read_identity(store).unwrap_or_else(|| "(unknown)".into())),
        IdentityCommand::Forget => {
            let changes = clear_identity(store)?;
            Ok(if changes.is_empty() {
                "no nickname stored".into()
            } else {
                "nickname forgotten".into()
            })
        }
    }
}

fn patch_from(opts: &SetOpts) -> SettingsPatch {
    SettingsPatch {
        only_when_private_on: opts.only_when_private_on,
        cooldown_ms: opts.cooldown_ms,
        debug: opts.debug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zepwatch_store::FileStore;
    use zepwatch_store::namespace::write_identity;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(dir.path().join("storage.json")).expect("open");
        (dir, store)
    }

    #[test]
    fn show_prints_defaults() {
        let (_dir, store) = store();
        let out = config(&store, ConfigCommand::Show).expect("show");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["cooldownMs"], 1500);
        assert_eq!(value["onlyWhenPrivateOn"], true);
        assert_eq!(value["debug"], false);
    }

    #[test]
    fn set_writes_through_to_file() {
        let (dir, store) = store();
        config(
            &store,
            ConfigCommand::Set(SetOpts {
                cooldown_ms: Some(0),
                only_when_private_on: None,
                debug: Some(true),
            }),
        )
        .expect("set");

        let reopened = FileStore::open(dir.path().join("storage.json")).expect("reopen");
        let s = read_settings(&reopened);
        assert_eq!(s.cooldown_ms, 0);
        assert!(s.debug);
        assert!(s.only_when_private_on);
    }

    #[test]
    fn empty_set_is_an_error() {
        let (_dir, store) = store();
        let err = config(
            &store,
            ConfigCommand::Set(SetOpts {
                cooldown_ms: None,
                only_when_private_on: None,
                debug: None,
            }),
        )
        .expect_err("should fail");
        assert!(err.to_string().contains("nothing to set"));
    }

    #[test]
    fn identity_show_and_forget() {
        let (_dir, store) = store();
        assert_eq!(identity(&store, IdentityCommand::Show).expect("show"), "(unknown)");
        write_identity(&store, "Alice").expect("write");
        assert_eq!(identity(&store, IdentityCommand::Show).expect("show"), "Alice");
        assert_eq!(
            identity(&store, IdentityCommand::Forget).expect("forget"),
            "nickname forgotten"
        );
        assert_eq!(
            identity(&store, IdentityCommand::Forget).expect("forget"),
            "no nickname stored"
        );
    }
}
