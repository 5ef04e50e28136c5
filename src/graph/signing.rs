//! Signing plan
//!
//! Decides per publication whether artifacts get signed and with which
//! mechanism. Anything short of a usable setup is a warning, never an error:
//! the build proceeds unsigned and Maven Central will reject it later.

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{PropertySource, Publication, SignWith};

pub const KEYRING_PROPERTIES: [&str; 3] = [
    "signing.keyId",
    "signing.password",
    "signing.secretKeyRingFile",
];
pub const KEYBOX_PROPERTIES: [&str; 2] = ["signing.gnupg.keyName", "signing.gnupg.passphrase"];

const IGNORED: &str =
    "Signing operation is ignored. Maven Central publishing cannot be done without signing the artifacts.";

/// Which signing setups are fully present in the properties
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SigningProperties {
    pub keyring: bool,
    pub keybox: bool,
}

impl SigningProperties {
    pub fn from_source(source: &dyn PropertySource) -> Self {
        Self {
            keyring: KEYRING_PROPERTIES.iter().all(|k| source.has_property(k)),
            keybox: KEYBOX_PROPERTIES.iter().all(|k| source.has_property(k)),
        }
    }

    fn any(&self) -> bool {
        self.keyring || self.keybox
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    Snapshot,
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "with", rename_all = "snake_case")]
pub enum SigningDecision {
    Sign(SignWith),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PubSigning {
    pub publication: String,
    /// Native publications covered, the plugin marker included
    pub native_publications: Vec<String>,
    pub decision: SigningDecision,
    /// Release artifacts must be signed; snapshots may go unsigned
    pub required: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SigningPlan {
    entries: Vec<PubSigning>,
}

fn decide(publication: &Publication, props: SigningProperties) -> SigningDecision {
    let label = publication.pub_name_with_variant();

    if !publication.signing.enabled {
        return SigningDecision::Skip(SkipReason::Disabled);
    }
    if publication.is_snapshot() {
        warn!(
            publication = %label,
            "Not performing signing for SNAPSHOT artifact ('{}')",
            publication.pom.version()
        );
        return SigningDecision::Skip(SkipReason::Snapshot);
    }
    if !props.any() {
        warn!(publication = %label, "No signing setting is provided. {}", IGNORED);
        return SigningDecision::Skip(SkipReason::NotConfigured);
    }

    let mechanism = match publication.signing.sign_with {
        SignWith::Keybox if props.keyring && !props.keybox => {
            warn!(
                publication = %label,
                "Setting to use keybox file but signing gpg keyring configuration is found. \
                 Fall back to use gpg keyring"
            );
            SignWith::Keyring
        }
        SignWith::Keyring if !props.keyring && props.keybox => {
            warn!(
                publication = %label,
                "Setting to use gpg keyring file but signing gpg keybox configuration is found. \
                 Switch to use gpg keybox"
            );
            SignWith::Keybox
        }
        other => other,
    };

    debug!(publication = %label, ?mechanism, "signing info complete");
    SigningDecision::Sign(mechanism)
}

impl SigningPlan {
    pub fn new(pubs: &[Publication], props: SigningProperties) -> Self {
        let entries = pubs
            .iter()
            .map(|publication| {
                let mut native_publications = vec![publication.pub_name_with_variant()];
                if publication.is_gradle_plugin() {
                    native_publications.push(publication.marker_pub_name());
                }
                PubSigning {
                    publication: publication.pub_name_with_variant(),
                    native_publications,
                    decision: decide(publication, props),
                    required: !publication.is_snapshot(),
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[PubSigning] {
        &self.entries
    }

    /// Native publications handed to the signing plugin
    pub fn publications_to_sign(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| matches!(e.decision, SigningDecision::Sign(_)))
            .flat_map(|e| e.native_publications.iter().cloned())
            .collect()
    }

    /// True if any publication needs signing for its release
    pub fn is_required(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.required && matches!(e.decision, SigningDecision::Sign(_)))
    }

    /// True if the gpg command (keybox) is used
    pub fn uses_gpg_command(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.decision == SigningDecision::Sign(SignWith::Keybox))
    }
}
