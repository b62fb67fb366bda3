//! Compilation settings shared by patterns and templates.

use std::env;
use std::sync::Arc;

use weaver_syntax::SupportedLanguage;

use crate::error::TemplateError;
use crate::front_end::{FrontEnd, TreeSitterFrontEnd};
use crate::workspace::{DependencyManifest, WorkspaceCache};

/// Environment variable consulted by [`DebugDefault::from_env`].
pub const DEBUG_ENV_VAR: &str = "WEAVER_TEMPLATE_DEBUG";

/// Process-wide default for match debugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugDefault(bool);

impl DebugDefault {
    /// Creates a default with an explicit value.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self(enabled)
    }

    /// Reads `WEAVER_TEMPLATE_DEBUG`. `1`, `true`, `yes` and `on` enable
    /// debugging; anything else, or an unset variable, disables it.
    #[must_use]
    pub fn from_env() -> Self {
        Self(env::var(DEBUG_ENV_VAR).is_ok_and(|value| parse_flag(&value)))
    }

    /// Returns whether debugging is enabled.
    #[must_use]
    pub const fn enabled(self) -> bool {
        self.0
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Per-pattern and per-template configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    context: Vec<String>,
    dependencies: DependencyManifest,
    lenient_type_matching: bool,
    debug: Option<bool>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            context: Vec::new(),
            dependencies: DependencyManifest::new(),
            lenient_type_matching: true,
            debug: None,
        }
    }
}

impl CompileConfig {
    /// Returns the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds declarations parsed ahead of the fragment so its names are typed.
    #[must_use]
    pub fn with_context(mut self, declarations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.context.extend(declarations.into_iter().map(Into::into));
        self
    }

    /// Adds import declarations; an alias of [`Self::with_context`].
    #[must_use]
    pub fn with_imports(self, imports: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.with_context(imports)
    }

    /// Adds a package the fragment's types come from.
    #[must_use]
    pub fn with_dependency(mut self, package: impl Into<String>, version: impl Into<String>) -> Self {
        self.dependencies = self.dependencies.with(package, version);
        self
    }

    /// Chooses lenient (`true`, the default) or strict type matching.
    #[must_use]
    pub const fn lenient_type_matching(mut self, lenient: bool) -> Self {
        self.lenient_type_matching = lenient;
        self
    }

    /// Overrides the process-wide debug default.
    #[must_use]
    pub const fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    /// Returns the context declarations.
    #[must_use]
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Returns the dependency manifest.
    #[must_use]
    pub const fn dependencies(&self) -> &DependencyManifest {
        &self.dependencies
    }

    /// Returns whether untyped patterns match typed targets.
    #[must_use]
    pub const fn is_lenient(&self) -> bool {
        self.lenient_type_matching
    }

    /// Returns the debug override.
    #[must_use]
    pub const fn debug_override(&self) -> Option<bool> {
        self.debug
    }
}

/// Owns the front end and shared state used to compile fragments.
///
/// Clones share the same front end and workspace cache.
#[derive(Debug, Clone)]
pub struct Compiler {
    front_end: Arc<dyn FrontEnd>,
    workspaces: Option<Arc<WorkspaceCache>>,
    debug_default: DebugDefault,
}

impl Compiler {
    /// Creates a compiler over a front end.
    #[must_use]
    pub fn new(front_end: Arc<dyn FrontEnd>) -> Self {
        Self {
            front_end,
            workspaces: None,
            debug_default: DebugDefault::default(),
        }
    }

    /// Creates a compiler over the Tree-sitter front end for `language`.
    #[must_use]
    pub fn for_language(language: SupportedLanguage) -> Self {
        Self::new(Arc::new(TreeSitterFrontEnd::new(language)))
    }

    /// Attaches a workspace cache for configurations with dependencies.
    #[must_use]
    pub fn with_workspaces(self, workspaces: Arc<WorkspaceCache>) -> Self {
        Self {
            workspaces: Some(workspaces),
            ..self
        }
    }

    /// Sets the process-wide debug default.
    #[must_use]
    pub const fn with_debug_default(mut self, debug_default: DebugDefault) -> Self {
        self.debug_default = debug_default;
        self
    }

    /// Returns the language of the default front end.
    #[must_use]
    pub fn language(&self) -> SupportedLanguage {
        self.front_end.language()
    }

    /// Returns the debug default.
    #[must_use]
    pub const fn debug_default(&self) -> DebugDefault {
        self.debug_default
    }

    /// Returns the front end a configuration compiles with.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration lists dependencies and no
    /// workspace cache is attached, or when provisioning fails.
    pub fn front_end_for(&self, config: &CompileConfig) -> Result<Arc<dyn FrontEnd>, TemplateError> {
        if config.dependencies.is_empty() {
            return Ok(Arc::clone(&self.front_end));
        }
        let Some(workspaces) = &self.workspaces else {
            return Err(TemplateError::MissingWorkspaceProvider {
                manifest: config.dependencies.to_string(),
            });
        };
        Ok(workspaces.get_or_create(&config.dependencies)?)
    }
}
