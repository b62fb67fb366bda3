//! Type-aware front ends provisioned per dependency manifest.
//!
//! Compiling a fragment against third-party types needs a front end that
//! knows those packages. A [`WorkspaceProvider`] builds one for a
//! [`DependencyManifest`]; the [`WorkspaceCache`] shares the result between
//! every compilation that asks for the same manifest.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::front_end::FrontEnd;

const WORKSPACE_TARGET: &str = "weaver_template::workspace";

/// Package names mapped to version requirements.
///
/// Manifests are compared by content, so entry order does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyManifest(BTreeMap<String, String>);

impl DependencyManifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a manifest with one more dependency.
    #[must_use]
    pub fn with(mut self, package: impl Into<String>, version: impl Into<String>) -> Self {
        self.0.insert(package.into(), version.into());
        self
    }

    /// Returns whether the manifest lists no dependencies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(package, version)` pairs in package order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, version)| (name.as_str(), version.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DependencyManifest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, version)| (name.into(), version.into()))
                .collect(),
        )
    }
}

impl fmt::Display for DependencyManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (position, (name, version)) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}@{version}")?;
        }
        f.write_str("}")
    }
}

/// Failure to provision a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to provision workspace for {manifest}: {message}")]
pub struct WorkspaceError {
    manifest: String,
    message: String,
}

impl WorkspaceError {
    /// Creates an error for `manifest`.
    #[must_use]
    pub fn new(manifest: &DependencyManifest, message: impl Into<String>) -> Self {
        Self {
            manifest: manifest.to_string(),
            message: message.into(),
        }
    }

    /// Returns the provider's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Builds front ends that know the packages of a manifest.
pub trait WorkspaceProvider: Send + Sync {
    /// Provisions a front end for `manifest`.
    ///
    /// # Errors
    ///
    /// Returns an error when the dependencies cannot be installed or loaded.
    fn provision(&self, manifest: &DependencyManifest) -> Result<Arc<dyn FrontEnd>, WorkspaceError>;
}

type Entry = Arc<Mutex<Option<Arc<dyn FrontEnd>>>>;

/// Memoises provisioned front ends by manifest content.
///
/// Concurrent requests for one manifest wait on a per-manifest lock, so the
/// provider runs once. Failures are not remembered; the next request tries
/// again.
pub struct WorkspaceCache {
    provider: Box<dyn WorkspaceProvider>,
    entries: Mutex<HashMap<DependencyManifest, Entry>>,
}

impl WorkspaceCache {
    /// Creates a cache over `provider`.
    #[must_use]
    pub fn new(provider: impl WorkspaceProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the front end for `manifest`, provisioning it on first use.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when provisioning fails.
    pub fn get_or_create(
        &self,
        manifest: &DependencyManifest,
    ) -> Result<Arc<dyn FrontEnd>, WorkspaceError> {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(manifest.clone()).or_default())
        };

        let mut guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(front_end) = guard.as_ref() {
            return Ok(Arc::clone(front_end));
        }

        debug!(target: WORKSPACE_TARGET, manifest = %manifest, "provisioning workspace");
        match self.provider.provision(manifest) {
            Ok(front_end) => {
                *guard = Some(Arc::clone(&front_end));
                Ok(front_end)
            }
            Err(err) => {
                debug!(
                    target: WORKSPACE_TARGET,
                    manifest = %manifest,
                    error = %err,
                    "workspace provisioning failed"
                );
                Err(err)
            }
        }
    }

    /// Returns the number of manifests with a provisioned front end.
    #[must_use]
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .filter(|entry| {
                entry.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    /// Returns whether nothing has been provisioned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for WorkspaceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceCache")
            .field("provisioned", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use weaver_syntax::SupportedLanguage;

    use super::*;
    use crate::front_end::TreeSitterFrontEnd;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl WorkspaceProvider for CountingProvider {
        fn provision(
            &self,
            manifest: &DependencyManifest,
        ) -> Result<Arc<dyn FrontEnd>, WorkspaceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WorkspaceError::new(manifest, "registry unavailable"));
            }
            Ok(Arc::new(TreeSitterFrontEnd::new(SupportedLanguage::TypeScript)))
        }
    }

    fn manifest() -> DependencyManifest {
        DependencyManifest::new().with("react", "^18.0.0")
    }

    #[test]
    fn manifests_compare_by_content() {
        let forwards: DependencyManifest = [("a", "1"), ("b", "2")].into_iter().collect();
        let backwards: DependencyManifest = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(forwards, backwards);
        assert_eq!(forwards.to_string(), "{a@1, b@2}");
    }

    #[test]
    fn concurrent_requests_converge_on_one_provision() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = WorkspaceCache::new(CountingProvider {
            calls: Arc::clone(&calls),
            fail: false,
        });

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cache
                        .get_or_create(&manifest())
                        .unwrap_or_else(|err| panic!("provision: {err}"));
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = WorkspaceCache::new(CountingProvider {
            calls: Arc::clone(&calls),
            fail: true,
        });

        assert!(cache.get_or_create(&manifest()).is_err());
        assert!(cache.get_or_create(&manifest()).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
