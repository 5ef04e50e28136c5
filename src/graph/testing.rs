//! Publication fixtures shared by the builder tests

use std::collections::HashMap;

use crate::domain::{PluginInfo, Pom, Publication, RepoSet, RepoSpec, RepoSpecBuilder};

pub fn properties() -> HashMap<String, String> {
    let mut props: HashMap<String, String> = HashMap::new();
    for key in ["mock", "mock0", "mock1", "mock2"] {
        props.insert(format!("repository.maven.{key}.release"), format!("https://{key}/release"));
        props.insert(format!("repository.maven.{key}.snapshot"), format!("https://{key}/snapshot"));
    }
    for (k, v) in [
        ("repository.artifactory.mock.release", "https://artifactory/release"),
        ("repository.artifactory.mock.snapshot", "https://artifactory/snapshot"),
        ("repository.artifactory.mock.repoKey", "libs"),
        ("repository.bintray.username", "bob"),
        ("repository.bintray.apikey", "key"),
    ] {
        props.insert(k.to_string(), v.to_string());
    }
    props
}

pub fn maven_repo(key: &str) -> RepoSpec {
    let props = properties();
    RepoSpecBuilder::new(&props)
        .maven_repo(key)
        .expect("mock repo properties")
}

pub fn artifactory_repo() -> RepoSpec {
    let props = properties();
    RepoSpecBuilder::new(&props)
        .artifactory("mock")
        .expect("artifactory properties")
}

pub fn bintray_repo() -> RepoSpec {
    let props = properties();
    RepoSpecBuilder::new(&props).bintray().expect("bintray properties")
}

pub fn pom(artifact_id: &str, version: &str) -> Pom {
    Pom {
        group: Some("io.example".to_string()),
        artifact_id: Some(artifact_id.to_string()),
        version: Some(version.to_string()),
        ..Pom::default()
    }
}

pub fn plugin_pom(artifact_id: &str, version: &str) -> Pom {
    let mut p = pom(artifact_id, version);
    p.plugin = Some(PluginInfo {
        id: Some(format!("io.example.{artifact_id}")),
        display_name: Some("Example plugin".to_string()),
        implementation_class: Some("io.example.ExamplePlugin".to_string()),
        tags: vec!["publishing".to_string()],
        ..PluginInfo::default()
    });
    p.web.url = Some("https://example.io".to_string());
    p.scm.url = Some("https://github.com/example/plugin".to_string());
    p
}

/// Finalized publication with its own repos plus Maven Local at project level
pub fn publication(pom: Pom, repos: &[RepoSpec]) -> Publication {
    publication_with_variant("", pom, repos)
}

pub fn publication_with_variant(variant: &str, pom: Pom, repos: &[RepoSpec]) -> Publication {
    let mut p = Publication::new(variant);
    p.init(pom, &[]);
    for repo in repos {
        p.add_repo(repo.clone());
    }
    let inherited: RepoSet = [RepoSpec::MavenLocal].into_iter().collect();
    p.finalize(inherited).expect("valid publication");
    p
}

/// Finalized publication that does not target Maven Local
pub fn remote_only_publication(pom: Pom, repos: &[RepoSpec]) -> Publication {
    let mut p = Publication::new("");
    p.init(pom, &[]);
    for repo in repos {
        p.add_repo(repo.clone());
    }
    p.finalize(RepoSet::new()).expect("valid publication");
    p
}
