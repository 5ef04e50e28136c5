//! Per-project publishing configuration
//!
//! An [`Extension`] collects the publications of one project and the repos
//! declared at project level. Publications move through [`PubState`]: a
//! project starts unpopulated, may get one implicit publication, and turns
//! explicit with the first declared publication. The implicit one never
//! comes back.

use serde::Serialize;
use tracing::{debug, warn};

use super::pom::PomResolver;
use super::property::PropertySource;
use super::publication::{ConfigError, Publication, SignWith, SourceSelector, VariantMode};
use super::repo::{RepoKind, RepoSet, RepoSpec, RepoSpecBuilder};

/// Where a Bintray repo was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BintrayOrigin {
    Global,
    /// Declared on a publication and moved up to project level
    Promoted,
}

/// Project level repo declarations
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoDeclarations {
    repos: RepoSet,
    using_defaults: bool,
    bintray: Option<BintrayOrigin>,
}

impl RepoDeclarations {
    /// Starts from `defaults`, which the first explicit declaration discards
    pub fn with_defaults(defaults: RepoSet) -> Self {
        Self {
            repos: defaults,
            using_defaults: true,
            bintray: None,
        }
    }

    pub fn repos(&self) -> &RepoSet {
        &self.repos
    }

    pub fn is_using_defaults(&self) -> bool {
        self.using_defaults
    }

    pub fn bintray_origin(&self) -> Option<BintrayOrigin> {
        self.bintray
    }

    fn disable_defaults(&mut self) {
        if self.using_defaults {
            self.repos.clear();
            self.using_defaults = false;
        }
    }

    fn declare(&mut self, repo: RepoSpec) {
        self.disable_defaults();
        self.repos.insert(repo);
    }
}

/// Declaration state of a project's publications
#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "state", content = "publications", rename_all = "snake_case")]
pub enum PubState {
    #[default]
    Unpopulated,
    ImplicitSingle(Publication),
    Explicit(Vec<Publication>),
}

impl PubState {
    pub fn publications(&self) -> &[Publication] {
        match self {
            PubState::Unpopulated => &[],
            PubState::ImplicitSingle(p) => std::slice::from_ref(p),
            PubState::Explicit(list) => list,
        }
    }

    fn publications_mut(&mut self) -> &mut [Publication] {
        match self {
            PubState::Unpopulated => &mut [],
            PubState::ImplicitSingle(p) => std::slice::from_mut(p),
            PubState::Explicit(list) => list,
        }
    }

    /// Explicitly declared publications; the implicit one does not count
    fn explicit(&self) -> &[Publication] {
        match self {
            PubState::Explicit(list) => list,
            _ => &[],
        }
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self, PubState::ImplicitSingle(_))
    }

    /// Adds an explicit publication, dropping the implicit one if present
    fn add_explicit(&mut self, publication: Publication) {
        match self {
            PubState::Explicit(list) => list.push(publication),
            _ => *self = PubState::Explicit(vec![publication]),
        }
    }
}

/// Declarations available while configuring one publication
pub struct PubScope<'s> {
    publication: &'s mut Publication,
    decl: &'s mut RepoDeclarations,
    builder: RepoSpecBuilder<'s>,
}

impl PubScope<'_> {
    pub fn publication(&self) -> &Publication {
        self.publication
    }

    pub fn variant_with_version(&mut self) {
        self.publication.variant_mode = VariantMode::WithVersion;
    }

    pub fn variant_with_artifact_id(&mut self) {
        self.publication.variant_mode = VariantMode::WithArtifactId;
    }

    pub fn variant_invisible(&mut self) {
        self.publication.variant_mode = VariantMode::Invisible;
    }

    pub fn signing(&mut self, enabled: bool) {
        self.publication.signing.enabled = enabled;
    }

    pub fn sign_with(&mut self, sign_with: SignWith) {
        self.publication.signing.sign_with = sign_with;
    }

    pub fn component(&mut self, name: &str) {
        self.publication.source = SourceSelector::Component(name.to_string());
    }

    pub fn source_set(&mut self, name: &str) {
        self.publication.source = SourceSelector::SourceSet(name.to_string());
    }

    pub fn maven_central(&mut self) {
        let repo = self.builder.maven_central();
        self.publication.add_repo(repo);
    }

    pub fn maven_repo(&mut self, key: &str) -> Result<(), ConfigError> {
        let repo = self.builder.maven_repo(key)?;
        self.publication.add_repo(repo);
        Ok(())
    }

    pub fn maven_local(&mut self) {
        self.publication.add_repo(self.builder.maven_local());
    }

    pub fn gradle_portal(&mut self) {
        self.publication.add_repo(self.builder.gradle_portal());
    }

    /// Artifactory for this publication; must be the project's only server
    pub fn artifactory(&mut self, key: &str) -> Result<(), ConfigError> {
        let repo = self.builder.artifactory(key)?;
        let conflicting = self
            .decl
            .repos
            .iter()
            .chain(self.publication.own_repos().iter())
            .any(|r| r.kind() == RepoKind::Artifactory && r.id() != repo.id());
        if conflicting {
            return Err(ConfigError::DuplicateArtifactory);
        }
        self.publication.add_repo(repo);
        Ok(())
    }

    /// Bintray publishes per project, so the declaration moves to project level
    pub fn bintray(&mut self) -> Result<(), ConfigError> {
        match self.decl.bintray {
            Some(BintrayOrigin::Global) => Err(ConfigError::BintrayDeclaredGlobally),
            Some(BintrayOrigin::Promoted) => Ok(()),
            None => {
                let repo = self.builder.bintray()?;
                warn!(
                    publication = %self.publication.pub_name_with_variant(),
                    "Bintray repo will be treated as project level declaration because \
                     Bintray publishes components per project"
                );
                self.decl.declare(repo);
                self.decl.bintray = Some(BintrayOrigin::Promoted);
                Ok(())
            }
        }
    }
}

/// Publishing configuration of one project
pub struct Extension {
    project_path: String,
    properties: Box<dyn PropertySource>,
    poms: Box<dyn PomResolver>,
    state: PubState,
    decl: RepoDeclarations,
    doc_generator: Option<String>,
    finalized: bool,
}

impl Extension {
    pub fn new(
        project_path: impl Into<String>,
        properties: Box<dyn PropertySource>,
        poms: Box<dyn PomResolver>,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            properties,
            poms,
            state: PubState::Unpopulated,
            decl: RepoDeclarations::default(),
            doc_generator: None,
            finalized: false,
        }
    }

    /// Seeds the project level repos with defaults
    pub fn with_default_repos(mut self, defaults: RepoSet) -> Self {
        self.decl = RepoDeclarations::with_defaults(defaults);
        self
    }

    pub fn project_path(&self) -> &str {
        &self.project_path
    }

    pub fn properties(&self) -> &dyn PropertySource {
        self.properties.as_ref()
    }

    pub fn state(&self) -> &PubState {
        &self.state
    }

    pub fn publications(&self) -> &[Publication] {
        self.state.publications()
    }

    /// Project level repos
    pub fn repos(&self) -> &RepoSet {
        self.decl.repos()
    }

    pub fn declarations(&self) -> &RepoDeclarations {
        &self.decl
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Task generating the docs packaged into doc jars, if any
    pub fn doc_generator(&self) -> Option<&str> {
        self.doc_generator.as_deref()
    }

    pub fn set_doc_generator(&mut self, task: impl Into<String>) {
        self.doc_generator = Some(task.into());
    }

    fn ensure_open(&self) -> Result<(), ConfigError> {
        if self.finalized {
            Err(ConfigError::AlreadyFinalized(self.project_path.clone()))
        } else {
            Ok(())
        }
    }

    fn builder(&self) -> RepoSpecBuilder<'_> {
        RepoSpecBuilder::new(self.properties.as_ref())
    }

    /// Creates the implicit publication if nothing has been declared yet
    pub fn create_implicit(&mut self) -> Result<(), ConfigError> {
        self.ensure_open()?;
        if matches!(self.state, PubState::Unpopulated) {
            self.state = PubState::ImplicitSingle(self.implicit_publication()?);
        }
        Ok(())
    }

    fn implicit_publication(&self) -> Result<Publication, ConfigError> {
        let mut publication = Publication::new("");
        publication.init(self.poms.resolve("")?, &[]);
        debug!(project = %self.project_path, pub_name = %publication.pub_name, "created implicit publication");
        Ok(publication)
    }

    /// Declares a publication for `variant` ("" for none)
    pub fn publication<F>(&mut self, variant: &str, configure: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut PubScope<'_>) -> Result<(), ConfigError>,
    {
        self.ensure_open()?;

        let explicit = self.state.explicit();
        if !variant.is_empty() && explicit.iter().any(|p| p.variant == variant) {
            return Err(ConfigError::DuplicateVariant(variant.to_string()));
        }

        let mut publication = Publication::new(variant);
        publication.init(self.poms.resolve(variant)?, explicit);

        let mut scope = PubScope {
            publication: &mut publication,
            decl: &mut self.decl,
            builder: RepoSpecBuilder::new(self.properties.as_ref()),
        };
        configure(&mut scope)?;

        debug!(
            project = %self.project_path,
            publication = %publication.pub_name_with_variant(),
            "declared publication"
        );
        self.state.add_explicit(publication);
        Ok(())
    }

    pub fn maven_central(&mut self) -> Result<(), ConfigError> {
        self.ensure_open()?;
        let repo = self.builder().maven_central();
        self.decl.declare(repo);
        Ok(())
    }

    pub fn maven_repo(&mut self, key: &str) -> Result<(), ConfigError> {
        self.ensure_open()?;
        let repo = self.builder().maven_repo(key)?;
        self.decl.declare(repo);
        Ok(())
    }

    pub fn maven_local(&mut self) -> Result<(), ConfigError> {
        self.ensure_open()?;
        self.decl.declare(RepoSpec::MavenLocal);
        Ok(())
    }

    pub fn gradle_portal(&mut self) -> Result<(), ConfigError> {
        self.ensure_open()?;
        self.decl.declare(RepoSpec::GradlePortal);
        Ok(())
    }

    /// Declares the project's Artifactory server; only one is allowed
    pub fn artifactory(&mut self, key: &str) -> Result<(), ConfigError> {
        self.ensure_open()?;
        let repo = self.builder().artifactory(key)?;
        // defaults are discarded by this declaration, so only explicit servers count
        if !self.decl.is_using_defaults() && self.decl.repos.has_kind(RepoKind::Artifactory) {
            return Err(ConfigError::DuplicateArtifactory);
        }
        self.decl.declare(repo);
        Ok(())
    }

    pub fn bintray(&mut self) -> Result<(), ConfigError> {
        self.ensure_open()?;
        if self.decl.bintray.is_some() {
            return Err(ConfigError::BintrayDeclaredGlobally);
        }
        let repo = self.builder().bintray()?;
        self.decl.declare(repo);
        self.decl.bintray = Some(BintrayOrigin::Global);
        Ok(())
    }

    /// Ends configuration
    ///
    /// Synthesizes the implicit publication if needed, adds Maven Local to
    /// the project repos and finalizes every publication against the project
    /// repos unioned with `parent` (the parent project's repos, one level).
    /// On error nothing is changed.
    pub fn finalize(&mut self, parent: Option<&RepoSet>) -> Result<(), ConfigError> {
        self.ensure_open()?;

        let mut repos = self.decl.repos.clone();
        repos.insert(RepoSpec::MavenLocal);
        let inherited = match parent {
            Some(parent) => repos.union(parent),
            None => repos.clone(),
        };

        let mut state = match &self.state {
            PubState::Unpopulated => PubState::ImplicitSingle(self.implicit_publication()?),
            state => state.clone(),
        };
        for publication in state.publications_mut() {
            publication.finalize(inherited.clone())?;
        }

        self.decl.repos = repos;
        self.state = state;
        self.finalized = true;
        debug!(
            project = %self.project_path,
            publications = self.publications().len(),
            "finalized extension"
        );
        Ok(())
    }

    /// Ends configuration of a project that only aggregates its children
    ///
    /// No implicit publication is synthesized.
    pub fn finalize_aggregate(&mut self) -> Result<(), ConfigError> {
        self.ensure_open()?;
        self.decl.repos.insert(RepoSpec::MavenLocal);
        self.finalized = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pom::{PluginInfo, Pom, PomError, PomGroup, PomLayer, ProjectInfo};
    use crate::domain::repo::RepoKind;
    use std::collections::{BTreeSet, HashMap};

    fn properties() -> HashMap<String, String> {
        [
            ("repository.maven.mock.release", "https://release"),
            ("repository.maven.mock.snapshot", "https://snapshot"),
            ("repository.artifactory.mock.release", "https://a-release"),
            ("repository.artifactory.mock.snapshot", "https://a-snapshot"),
            ("repository.artifactory.mock.repoKey", "libs"),
            ("repository.artifactory.other.release", "https://o-release"),
            ("repository.artifactory.other.snapshot", "https://o-snapshot"),
            ("repository.artifactory.other.repoKey", "libs"),
            ("repository.bintray.username", "bob"),
            ("repository.bintray.apikey", "key"),
            ("repository.mavencentral.newUser", "true"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn poms(docs: Vec<Pom>) -> PomGroup {
        let project = ProjectInfo {
            name: "lib".to_string(),
            group: "io.example".to_string(),
            version: "1.0".to_string(),
            description: None,
        };
        PomGroup::new(vec![PomLayer::new(docs).unwrap()], project)
    }

    fn extension() -> Extension {
        Extension::new(":lib", Box::new(properties()), Box::new(poms(Vec::new())))
    }

    fn variant_doc(variant: &str) -> Pom {
        Pom {
            variant: Some(variant.to_string()),
            ..Pom::default()
        }
    }

    fn kinds(set: &RepoSet) -> BTreeSet<RepoKind> {
        set.iter().map(|r| r.kind()).collect()
    }

    #[test]
    fn implicit_publication_survives_finalize() {
        let mut ext = extension();
        ext.create_implicit().unwrap();
        ext.create_implicit().unwrap();
        assert!(ext.state().is_implicit());
        assert_eq!(ext.publications().len(), 1);

        ext.finalize(None).unwrap();

        assert_eq!(ext.publications().len(), 1);
        assert_eq!(
            kinds(&ext.publications()[0].repos()),
            BTreeSet::from([RepoKind::MavenLocal])
        );
    }

    #[test]
    fn finalize_synthesizes_implicit_publication() {
        let mut ext = extension();
        ext.finalize(None).unwrap();

        assert!(ext.state().is_implicit());
        assert_eq!(ext.publications()[0].pub_name, "lib");
    }

    #[test]
    fn explicit_publication_replaces_implicit() {
        let mut ext = extension();
        ext.create_implicit().unwrap();
        ext.publication("", |_| Ok(())).unwrap();
        assert!(!ext.state().is_implicit());
        assert_eq!(ext.publications().len(), 1);

        ext.publication("", |_| Ok(())).unwrap();
        ext.create_implicit().unwrap();

        assert_eq!(ext.publications().len(), 2);
        assert!(!ext.state().is_implicit());
    }

    #[test]
    fn artifactory_publication_needs_artifactory() {
        let mut ext = extension();
        ext.publication("", |p| p.artifactory("mock")).unwrap();
        ext.finalize(None).unwrap();

        let publication = &ext.publications()[0];
        assert!(publication.needs_artifactory());
        assert!(ext.publications().iter().any(Publication::needs_artifactory));
        assert_eq!(
            kinds(&publication.repos()),
            BTreeSet::from([RepoKind::MavenLocal, RepoKind::Artifactory])
        );
    }

    #[test]
    fn repeated_repo_declarations_collapse() {
        let mut ext = extension();
        ext.maven_central().unwrap();
        ext.maven_central().unwrap();
        ext.maven_repo("mock").unwrap();
        ext.maven_repo("mock").unwrap();

        assert_eq!(ext.repos().len(), 2);
    }

    #[test]
    fn first_explicit_repo_clears_defaults() {
        let defaults: RepoSet = [RepoSpec::GradlePortal].into_iter().collect();
        let mut ext = extension().with_default_repos(defaults);
        assert!(ext.declarations().is_using_defaults());

        ext.maven_repo("mock").unwrap();
        ext.maven_central().unwrap();

        assert!(!ext.declarations().is_using_defaults());
        assert_eq!(
            kinds(ext.repos()),
            BTreeSet::from([RepoKind::Maven, RepoKind::MavenCentral])
        );
    }

    #[test]
    fn explicit_artifactory_replaces_default_artifactory() {
        let props = properties();
        let builder = RepoSpecBuilder::new(&props);
        let default_server = builder.artifactory("mock").unwrap();
        let declared = builder.artifactory("other").unwrap();
        let mut ext = extension().with_default_repos(RepoSet::from_iter([default_server]));

        ext.artifactory("other").unwrap();

        assert!(!ext.declarations().is_using_defaults());
        let servers: Vec<&str> = ext
            .repos()
            .iter()
            .filter(|r| r.kind() == RepoKind::Artifactory)
            .map(RepoSpec::id)
            .collect();
        assert_eq!(servers, vec![declared.id()]);
        assert_eq!(
            ext.artifactory("mock").unwrap_err(),
            ConfigError::DuplicateArtifactory
        );
    }

    #[test]
    fn finalize_keeps_defaults_and_adds_maven_local() {
        let defaults: RepoSet = [RepoSpec::GradlePortal].into_iter().collect();
        let mut ext = extension().with_default_repos(defaults);
        ext.finalize(None).unwrap();

        assert_eq!(
            kinds(ext.repos()),
            BTreeSet::from([RepoKind::GradlePortal, RepoKind::MavenLocal])
        );
    }

    #[test]
    fn duplicate_variant_is_rejected() {
        let mut ext = Extension::new(
            ":lib",
            Box::new(properties()),
            Box::new(poms(vec![Pom::default(), variant_doc("debug")])),
        );
        ext.publication("debug", |_| Ok(())).unwrap();

        assert_eq!(
            ext.publication("debug", |_| Ok(())).unwrap_err(),
            ConfigError::DuplicateVariant("debug".to_string())
        );
    }

    #[test]
    fn unknown_variant_without_default_fails() {
        let mut ext = Extension::new(
            ":lib",
            Box::new(properties()),
            Box::new(poms(vec![variant_doc("debug")])),
        );

        assert_eq!(
            ext.publication("release", |_| Ok(())).unwrap_err(),
            ConfigError::Pom(PomError::VariantNotFound("release".to_string()))
        );
    }

    #[test]
    fn second_artifactory_is_rejected() {
        let mut ext = extension();
        ext.artifactory("mock").unwrap();

        assert_eq!(
            ext.artifactory("mock").unwrap_err(),
            ConfigError::DuplicateArtifactory
        );
    }

    #[test]
    fn publication_artifactory_must_match_project_server() {
        let mut ext = extension();
        ext.artifactory("mock").unwrap();

        ext.publication("", |p| p.artifactory("mock")).unwrap();
        assert_eq!(
            ext.publication("", |p| p.artifactory("other")).unwrap_err(),
            ConfigError::DuplicateArtifactory
        );
    }

    #[test]
    fn bintray_twice_at_global_level_fails() {
        let mut ext = extension();
        ext.bintray().unwrap();

        assert_eq!(ext.bintray().unwrap_err(), ConfigError::BintrayDeclaredGlobally);
    }

    #[test]
    fn publication_bintray_is_promoted() {
        let mut ext = extension();
        ext.publication("", |p| p.bintray()).unwrap();
        ext.publication("", |p| p.bintray()).unwrap();

        assert_eq!(ext.declarations().bintray_origin(), Some(BintrayOrigin::Promoted));
        assert!(ext.repos().has_kind(RepoKind::Bintray));
        assert!(!ext.publications()[0].own_repos().has_kind(RepoKind::Bintray));
    }

    #[test]
    fn publication_bintray_conflicts_with_global() {
        let mut ext = extension();
        ext.bintray().unwrap();

        assert_eq!(
            ext.publication("", |p| p.bintray()).unwrap_err(),
            ConfigError::BintrayDeclaredGlobally
        );
    }

    #[test]
    fn promoted_bintray_conflicts_with_later_global() {
        let mut ext = extension();
        ext.publication("", |p| p.bintray()).unwrap();

        assert_eq!(ext.bintray().unwrap_err(), ConfigError::BintrayDeclaredGlobally);
    }

    #[test]
    fn declarations_after_finalize_fail() {
        let mut ext = extension();
        ext.finalize(None).unwrap();

        let closed = ConfigError::AlreadyFinalized(":lib".to_string());
        assert_eq!(ext.maven_central().unwrap_err(), closed);
        assert_eq!(ext.publication("", |_| Ok(())).unwrap_err(), closed);
        assert_eq!(ext.finalize(None).unwrap_err(), closed);
    }

    #[test]
    fn parent_repos_are_inherited_one_level() {
        let mut ext = extension();
        ext.publication("", |p| {
            p.maven_repo("mock")?;
            Ok(())
        })
        .unwrap();

        let parent: RepoSet = [RepoSpec::GradlePortal].into_iter().collect();
        ext.finalize(Some(&parent)).unwrap();

        assert_eq!(
            kinds(&ext.publications()[0].repos()),
            BTreeSet::from([RepoKind::Maven, RepoKind::MavenLocal, RepoKind::GradlePortal])
        );
    }

    #[test]
    fn finalize_fails_fast_on_empty_coordinate() {
        let project = ProjectInfo::default();
        let mut ext = Extension::new(
            ":lib",
            Box::new(properties()),
            Box::new(PomGroup::new(Vec::new(), project)),
        );

        assert!(matches!(
            ext.finalize(None).unwrap_err(),
            ConfigError::EmptyCoordinate { .. }
        ));
        assert!(!ext.is_finalized());
    }

    #[test]
    fn failed_finalize_changes_nothing() {
        let broken = Pom {
            plugin: Some(PluginInfo::default()),
            ..variant_doc("broken")
        };
        let mut ext = Extension::new(":lib", Box::new(properties()), Box::new(poms(vec![broken])));
        ext.publication("", |_| Ok(())).unwrap();
        ext.publication("broken", |_| Ok(())).unwrap();

        assert!(matches!(
            ext.finalize(None).unwrap_err(),
            ConfigError::MissingPluginId(_)
        ));
        assert!(!ext.is_finalized());
        assert!(ext.publications().iter().all(|p| !p.is_finalized()));
        assert!(!ext.repos().has_kind(RepoKind::MavenLocal));
    }

    #[test]
    fn scope_configures_publication() {
        let mut ext = extension();
        ext.publication("", |p| {
            p.variant_with_version();
            p.signing(false);
            p.sign_with(SignWith::Keybox);
            p.source_set("main");
            Ok(())
        })
        .unwrap();

        let publication = &ext.publications()[0];
        assert_eq!(publication.variant_mode, VariantMode::WithVersion);
        assert!(!publication.signing.enabled);
        assert_eq!(publication.signing.sign_with, SignWith::Keybox);
        assert_eq!(publication.source, SourceSelector::SourceSet("main".to_string()));
    }

    #[test]
    fn aggregate_finalize_has_no_publications() {
        let mut ext = extension();
        ext.finalize_aggregate().unwrap();

        assert!(ext.publications().is_empty());
        assert!(ext.repos().has_kind(RepoKind::MavenLocal));
    }
}
