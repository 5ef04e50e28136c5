//! Publication/repository filtering
//!
//! The native plugin publishes every publication to every repository of a
//! project. Only pairs some publication asked for are wanted.

use crate::domain::Publication;

/// True if some publication targets the native `repository` and owns the
/// native `publication` (its own or, for plugins, its marker)
pub fn is_wanted_combination(pubs: &[Publication], repository: &str, publication: &str) -> bool {
    pubs.iter().any(|p| {
        let targets_repo = p
            .repos()
            .maven_repos()
            .any(|spec| spec.repo_name() == repository);
        targets_repo && owns_publication(p, publication)
    })
}

fn owns_publication(p: &Publication, publication: &str) -> bool {
    if p.pub_name_with_variant() == publication {
        return true;
    }
    p.is_gradle_plugin() && p.marker_pub_name() == publication
}
