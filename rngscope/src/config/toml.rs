use super::{ConfigError, SerializableConfig};
use std::path::Path;
use tokio::fs::{canonicalize, read_to_string};

/// Reads a configuration file recursively.
///
/// Relative root paths are resolved against directories of files declaring
/// them.
pub async fn read_config(path: &Path) -> Result<SerializableConfig, ConfigError> {
    let mut path = canonicalize(path).await?;
    let mut paths = vec![path.clone()];
    let mut config = read_bare_config(&path).await?;

    while let Some(parent_path) = config.extend() {
        let parent_path = canonicalize(
            path.parent()
                .unwrap_or_else(|| Path::new("."))
                .join(parent_path),
        )
        .await?;

        if let Some(index) = paths.iter().position(|item| item == &parent_path) {
            paths.push(parent_path);
            return Err(ConfigError::CircularConfigFiles(paths[index..].to_vec()));
        }

        paths.push(parent_path.clone());
        let mut parent = read_bare_config(&parent_path).await?;
        parent.merge(config);
        config = parent;
        path = parent_path;
    }

    Ok(config)
}

async fn read_bare_config(path: &Path) -> Result<SerializableConfig, ConfigError> {
    let mut config: SerializableConfig = toml::from_str(&read_to_string(path).await?)?;

    if let Some(directory) = path.parent() {
        config.resolve_roots(directory);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, read_config};
    use crate::{Syntax, config::compile_config};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use tokio::fs::{canonicalize, create_dir_all, write};

    #[tokio::test]
    async fn merge_configs() {
        let directory = tempdir().unwrap();
        let directory = directory.path();
        let base_file = directory.join("base.toml");
        let middle_file = directory.join("middle.toml");
        let child_file = directory.join("child.toml");

        write(
            &base_file,
            indoc! {r#"
                backward_search = false
                ignored_includes = ["^https?://"]
                [syntax]
                xrng = "xml"
            "#},
        )
        .await
        .unwrap();
        write(
            &middle_file,
            indoc! {r#"
                extend = "base.toml"
                [syntax]
                xrnc = "compact"
            "#},
        )
        .await
        .unwrap();
        write(
            &child_file,
            indoc! {r#"
                extend = "middle.toml"
                backward_search = true
            "#},
        )
        .await
        .unwrap();

        let config = compile_config(read_config(&child_file).await.unwrap()).unwrap();

        assert!(config.backward_search());
        assert!(config.is_ignored("https://example.com/a.rng"));
        assert_eq!(config.syntaxes().get("xrng"), Some(&Syntax::Xml));
        assert_eq!(config.syntaxes().get("xrnc"), Some(&Syntax::Compact));
    }

    #[tokio::test]
    async fn resolve_relative_files() {
        let directory = tempdir().unwrap();
        let directory = canonicalize(directory.path()).await.unwrap();
        let base_file = directory.join("base.toml");
        let sub_directory = directory.join("nested");
        let child_file = sub_directory.join("child.toml");

        create_dir_all(&sub_directory).await.unwrap();
        write(&base_file, r#"roots = ["schema/main.rng"]"#)
            .await
            .unwrap();
        write(&child_file, r#"extend = "../base.toml""#)
            .await
            .unwrap();

        let config = compile_config(read_config(&child_file).await.unwrap()).unwrap();

        assert_eq!(
            config.roots().collect::<Vec<_>>(),
            vec![directory.join("schema/main.rng")]
        );
    }

    #[tokio::test]
    async fn detect_circular_extends() {
        let directory = tempdir().unwrap();
        let directory = directory.path();
        let first_file = directory.join("first.toml");
        let second_file = directory.join("second.toml");

        write(&first_file, r#"extend = "second.toml""#)
            .await
            .unwrap();
        write(&second_file, r#"extend = "first.toml""#)
            .await
            .unwrap();

        let result = read_config(&first_file).await;

        assert!(matches!(result, Err(ConfigError::CircularConfigFiles(_))));
    }

    #[tokio::test]
    async fn reject_unknown_fields() {
        let directory = tempdir().unwrap();
        let file = directory.path().join("config.toml");

        write(&file, "concurrency = 1").await.unwrap();

        assert!(matches!(
            read_config(&file).await,
            Err(ConfigError::TomlDeserialize(_))
        ));
    }
}
