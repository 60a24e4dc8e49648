// ABOUTME: Integration tests for directory reloads against real temp directories
// ABOUTME: Covers per-file isolation, determinism, extends inheritance and empty-set publication

use std::path::Path;

use anyhow::Result;
use promptroute_core::PromptRouteConfig;
use promptroute_loader::{MetadataRegistry, ProfileLoader, ReloadError};
use tempfile::{tempdir, TempDir};
use tokio::fs;

fn config_for(dir: &Path, registry: &Path) -> PromptRouteConfig {
    let mut config = PromptRouteConfig::default();
    config.loader.profiles_dir = dir.to_path_buf();
    config.loader.registry_path = Some(registry.to_path_buf());
    config
}

fn valid_profile(name: &str) -> String {
    format!(
        "---\nname: {name}\ndescription: Profile {name}\nweights:\n  keywords:\n    {name}: 1\n---\n# {name}\n\n## Instructions\n\nHandle {name} requests.\n\n- [ ] Mention {name}\n"
    )
}

async fn write(dir: &Path, file: &str, content: &str) -> Result<()> {
    fs::write(dir.join(file), content).await?;
    Ok(())
}

#[tokio::test]
async fn nine_valid_and_one_malformed_profile() -> Result<()> {
    let dir = tempdir()?;
    let out = tempdir()?;
    for i in 1..=9 {
        write(dir.path(), &format!("profile_{i}.md"), &valid_profile(&format!("profile_{i}"))).await?;
    }
    write(dir.path(), "broken.md", "---\nname: broken\n---\n# Broken\n\nNo instructions here.\n").await?;

    let registry_path = out.path().join("registry.json");
    let loader = ProfileLoader::new(&config_for(dir.path(), &registry_path));
    let result = loader.reload().await;

    assert!(result.success);
    assert_eq!(result.profiles_loaded, 9);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].file, "broken.md");
    assert!(result.errors[0].message.contains("Instructions"));

    let registry = MetadataRegistry::load_from(&registry_path)?;
    assert_eq!(registry.summary.total_profiles, 9);
    assert_eq!(registry.generation, result.generation);
    assert!(registry.get("broken").is_none());
    Ok(())
}

#[tokio::test]
async fn empty_directory_loads_nothing() -> Result<()> {
    let dir = tempdir()?;
    let out = tempdir()?;
    let registry_path = out.path().join("registry.json");
    let loader = ProfileLoader::new(&config_for(dir.path(), &registry_path));

    let result = loader.reload().await;
    assert!(!result.success);
    assert_eq!(result.profiles_loaded, 0);
    assert!(matches!(result.failure, Some(ReloadError::NoProfilesLoaded(_))));
    assert_eq!(result.generation, 1);
    assert!(loader.snapshot().is_empty());

    let registry = MetadataRegistry::load_from(&registry_path)?;
    assert_eq!(registry.summary.total_profiles, 0);
    Ok(())
}

#[tokio::test]
async fn emptied_directory_replaces_live_profiles() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "alpha.md", &valid_profile("alpha")).await?;
    write(dir.path(), "bravo.md", &valid_profile("bravo")).await?;

    let loader = ProfileLoader::new(&config_for(dir.path(), &dir.path().join("out.json")));
    assert!(loader.reload().await.success);
    assert_eq!(loader.snapshot().len(), 2);

    fs::remove_file(dir.path().join("alpha.md")).await?;
    fs::write(dir.path().join("bravo.md"), "no front matter at all").await?;
    let result = loader.reload().await;

    assert!(!result.success);
    assert_eq!(result.profiles_loaded, 0);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].file, "bravo.md");
    assert_eq!(result.generation, 2);
    assert!(loader.snapshot().is_empty());
    assert!(loader.snapshot().get("alpha").is_none());
    Ok(())
}

#[tokio::test]
async fn unreadable_directory_keeps_previous_snapshot() -> Result<()> {
    let root = tempdir()?;
    let dir = root.path().join("profiles");
    fs::create_dir(&dir).await?;
    write(&dir, "alpha.md", &valid_profile("alpha")).await?;

    let loader = ProfileLoader::new(&config_for(&dir, &root.path().join("registry.json")));
    assert!(loader.reload().await.success);
    let live = loader.snapshot();

    fs::remove_dir_all(&dir).await?;
    let result = loader.reload().await;

    assert!(!result.success);
    assert!(matches!(
        result.failure,
        Some(ReloadError::DirectoryUnreadable { .. })
    ));
    assert_eq!(result.generation, live.generation);
    assert_eq!(loader.snapshot().generation, live.generation);
    assert!(loader.snapshot().get("alpha").is_some());
    Ok(())
}

#[tokio::test]
async fn load_order_ignores_creation_order() -> Result<()> {
    let names = ["delta", "alpha", "charlie", "bravo"];

    async fn load(dir: &TempDir, order: &[&str]) -> Result<Vec<(String, usize)>> {
        for name in order {
            write(dir.path(), &format!("{name}.md"), &valid_profile(name)).await?;
        }
        let loader = ProfileLoader::new(&config_for(dir.path(), &dir.path().join("out.json")));
        loader.reload().await;
        Ok(loader
            .snapshot()
            .profiles
            .iter()
            .map(|p| (p.name.clone(), p.load_order))
            .collect())
    }

    let forward = load(&tempdir()?, &names).await?;
    let mut reversed_names = names;
    reversed_names.reverse();
    let reversed = load(&tempdir()?, &reversed_names).await?;

    assert_eq!(forward, reversed);
    assert_eq!(
        forward,
        vec![
            ("alpha".to_string(), 0),
            ("bravo".to_string(), 1),
            ("charlie".to_string(), 2),
            ("delta".to_string(), 3),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn extends_merges_parent_keywords() -> Result<()> {
    let dir = tempdir()?;
    write(
        dir.path(),
        "creative_brainstorm.md",
        "---\nweights:\n  keywords:\n    ideas: 2\n    campaign: 1\n---\n## Instructions\nGenerate ideas.\n",
    )
    .await?;
    write(
        dir.path(),
        "creative_brainstorm_complex.md",
        "---\nextends: creative_brainstorm\nweights:\n  keywords:\n    campaign: 4\n    roadmap: 3\n---\n## Instructions\nGenerate ideas in depth.\n",
    )
    .await?;
    write(
        dir.path(),
        "orphan.md",
        "---\nextends: nowhere\n---\n## Instructions\nLost.\n",
    )
    .await?;

    let loader = ProfileLoader::new(&config_for(dir.path(), &dir.path().join("out.json")));
    let result = loader.reload().await;
    assert_eq!(result.profiles_loaded, 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].file, "orphan.md");

    let snapshot = loader.snapshot();
    let child = snapshot.get("creative_brainstorm_complex").unwrap();
    assert_eq!(child.weights.keywords.get("ideas"), Some(&2));
    assert_eq!(child.weights.keywords.get("campaign"), Some(&4));
    assert_eq!(child.weights.keywords.get("roadmap"), Some(&3));
    assert!(child.is_complex());
    Ok(())
}

#[tokio::test]
async fn concurrent_reload_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "alpha.md", &valid_profile("alpha")).await?;
    let loader = ProfileLoader::new(&config_for(dir.path(), &dir.path().join("out.json")));

    let (first, second) = tokio::join!(loader.reload(), loader.reload());
    assert!(first.success);
    assert!(second.is_rejected());
    assert_eq!(loader.snapshot().generation, 1);
    Ok(())
}
