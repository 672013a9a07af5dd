//! The context: owner of every module and of all shared state
//!
//! A context holds the string pool, the ordered module set, the search
//! paths and the diagnostic buffer. All operations that touch a
//! context go through `&mut self`; the caller serializes access, and
//! destroying the context releases every module in one sweep.

use crate::compile::{self, CompileCtx, CompileOptions};
use crate::loader;
use crate::parser::{check_date, sort_revisions, ModuleParser, ParserContext, SchemaFormat, YinParser};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use yangkit_core::error::{Diagnostic, Result, YangError};
use yangkit_core::schema::compiled::{CompiledFeature, CompiledModule, CompiledType};
use yangkit_core::schema::iffeature::FeatureRef;
use yangkit_core::schema::parsed::ParsedModule;
use yangkit_core::schema::{ModuleId, NodeFlags};
use yangkit_core::string_pool::StringPool;

/// Caller-supplied context configuration
#[derive(Debug)]
pub struct ContextOptions {
    /// Directories searched for module sources, in priority order
    pub search_paths: Vec<PathBuf>,
    /// Whether the current working directory is searched as well
    pub search_cwd: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextOptions {
    /// Options with working-directory search enabled and no explicit
    /// search paths
    #[must_use]
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            search_cwd: true,
        }
    }
}

/// One module known to a context.
///
/// A handle pairs an optional parsed tree with an optional compiled
/// tree; at least one is present while the handle is alive.
#[derive(Debug, Default)]
pub struct Module {
    name: Arc<str>,
    revision: Option<Arc<str>>,
    implemented: bool,
    latest_revision: bool,
    parsed: Option<ParsedModule>,
    compiled: Option<CompiledModule>,
    compiling: bool,
}

impl Module {
    /// Module name
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Newest revision date known at parse time
    #[must_use]
    pub fn revision(&self) -> Option<&Arc<str>> {
        self.revision.as_ref()
    }

    /// Whether this module's data nodes are served by the context
    #[must_use]
    pub fn is_implemented(&self) -> bool {
        self.implemented
    }

    /// Whether this is the newest revision of its name in the context
    #[must_use]
    pub fn is_latest(&self) -> bool {
        self.latest_revision
    }

    /// The parsed tree, unless it was released after compilation
    #[must_use]
    pub fn parsed(&self) -> Option<&ParsedModule> {
        self.parsed.as_ref()
    }

    /// The compiled tree, once `compile` succeeded
    #[must_use]
    pub fn compiled(&self) -> Option<&CompiledModule> {
        self.compiled.as_ref()
    }

    fn is_alive(&self) -> bool {
        self.parsed.is_some() || self.compiled.is_some()
    }
}

/// A schema processing context
pub struct Context {
    options: ContextOptions,
    pool: StringPool,
    parsers: IndexMap<SchemaFormat, Box<dyn ModuleParser>>,
    modules: Vec<Module>,
    diagnostics: Vec<Diagnostic>,
    typedef_cache: HashMap<(ModuleId, Arc<str>), Arc<CompiledType>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context with default options
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ContextOptions::new())
    }

    /// Create a context with the given options
    #[must_use]
    pub fn with_options(options: ContextOptions) -> Self {
        let mut parsers: IndexMap<SchemaFormat, Box<dyn ModuleParser>> = IndexMap::new();
        parsers.insert(SchemaFormat::Yin, Box::new(YinParser));
        Self {
            options,
            pool: StringPool::new(),
            parsers,
            modules: Vec::new(),
            diagnostics: Vec::new(),
            typedef_cache: HashMap::new(),
        }
    }

    /// The context's string pool
    #[must_use]
    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    /// Register the parser serving one input format
    pub fn register_parser(&mut self, format: SchemaFormat, parser: Box<dyn ModuleParser>) {
        self.parsers.insert(format, parser);
    }

    /// Append a module search directory
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.options.search_paths.push(path.into());
    }

    /// Take the diagnostics collected so far
    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Access a module handle; the id must come from this context
    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    /// Iterate over the live modules of the context
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_alive())
            .map(|(idx, m)| (ModuleId(idx), m))
    }

    /// Find a module by name and exact revision; with `None` the
    /// revision-less handle of that name is matched
    #[must_use]
    pub fn get_module(&self, name: &str, revision: Option<&str>) -> Option<ModuleId> {
        self.modules()
            .find(|(_, m)| &*m.name == name && m.revision.as_deref() == revision)
            .map(|(id, _)| id)
    }

    /// Find the handle holding the latest revision of a name
    #[must_use]
    pub fn get_module_latest(&self, name: &str) -> Option<ModuleId> {
        self.modules()
            .find(|(_, m)| &*m.name == name && m.latest_revision)
            .map(|(id, _)| id)
    }

    /// Find the implemented handle of a name
    #[must_use]
    pub fn get_module_implemented(&self, name: &str) -> Option<ModuleId> {
        self.modules()
            .find(|(_, m)| &*m.name == name && m.implemented)
            .map(|(id, _)| id)
    }

    /// Parse a module out of source text and insert it as implemented
    ///
    /// # Errors
    ///
    /// Returns an error when no parser serves the format, the text is
    /// rejected, an implemented module of the same name or the same
    /// `(name, revision)` pair already exists, or a dependency cannot
    /// be resolved.
    pub fn parse_module(&mut self, data: &str, format: SchemaFormat) -> Result<ModuleId> {
        self.parse_source(data, format, true)
    }

    /// Parse a module from a file and insert it as implemented
    ///
    /// The filename is checked against the module name and revision;
    /// mismatches are only warned about.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Context::parse_module`], plus IO failures.
    pub fn parse_file(&mut self, path: &Path) -> Result<ModuleId> {
        let format = SchemaFormat::from_path(path).ok_or_else(|| {
            YangError::invalid_argument(format!(
                "Unknown schema file suffix of \"{}\".",
                path.display()
            ))
        })?;
        let data = std::fs::read_to_string(path)?;
        let id = self.parse_source(&data, format, true)?;
        self.apply_source_file(id, path);
        Ok(id)
    }

    /// Locate, parse and insert a module as a dependency
    ///
    /// An existing handle satisfying the request short-circuits the
    /// filesystem search.
    ///
    /// # Errors
    ///
    /// Returns not-found when no matching source file exists in the
    /// search paths; otherwise the same conditions as parsing.
    pub fn load_module(&mut self, name: &str, revision: Option<&str>) -> Result<ModuleId> {
        let existing = match revision {
            Some(rev) => self.get_module(name, Some(rev)),
            None => self.get_module_latest(name),
        };
        if let Some(id) = existing {
            return Ok(id);
        }

        let located =
            loader::search_local_file(&self.options.search_paths, self.options.search_cwd, name, revision)?
                .ok_or_else(|| YangError::not_found("module", name))?;
        let data = std::fs::read_to_string(&located.path)?;
        let id = self.parse_source(&data, located.format, false)?;
        self.apply_source_file(id, &located.path);
        Ok(id)
    }

    fn parse_source(&mut self, data: &str, format: SchemaFormat, implement: bool) -> Result<ModuleId> {
        let mut pctx = ParserContext::new();
        let parsed = {
            let parser = self.parsers.get(&format).ok_or_else(|| {
                YangError::invalid_argument(format!(
                    "No parser is registered for the {format:?} input format."
                ))
            })?;
            parser.parse(&self.pool, data, &mut pctx)?
        };
        self.insert_module(parsed, implement, &mut pctx)
    }

    /// Record the source file on a freshly parsed module and warn when
    /// the filename disagrees with the module's name or revision
    fn apply_source_file(&mut self, id: ModuleId, path: &Path) {
        let Some(parsed) = self.modules[id.0].parsed.as_ref() else {
            return;
        };

        if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
            let stem = filename
                .strip_suffix(".yang")
                .or_else(|| filename.strip_suffix(".yin"))
                .unwrap_or(filename);
            let (file_name, file_rev) = match stem.split_once('@') {
                Some((n, r)) => (n, Some(r)),
                None => (stem, None),
            };
            if file_name != &*parsed.name {
                warn!(
                    file = filename,
                    module = %parsed.name,
                    "file name does not match module name"
                );
            }
            if let Some(rev) = file_rev {
                if parsed.latest_revision().map(|d| &**d) != Some(rev) {
                    warn!(
                        file = filename,
                        revision = %parsed.latest_revision().map(|d| &**d).unwrap_or("none"),
                        "file name does not match module revision"
                    );
                }
            }
        }

        let canonical = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .into_owned();
        let filepath = self.pool.intern(&canonical);
        if let Some(parsed) = self.modules[id.0].parsed.as_mut() {
            parsed.filepath = Some(filepath);
        }
    }

    /// Insert a parsed module: dedup by `(name, revision)`, settle the
    /// latest-revision flag, then resolve dependencies
    fn insert_module(
        &mut self,
        mut parsed: ParsedModule,
        implement: bool,
        pctx: &mut ParserContext,
    ) -> Result<ModuleId> {
        if parsed.name.is_empty() {
            return Err(YangError::invalid_argument("Module without a name."));
        }
        if parsed.submodule {
            return Err(YangError::invalid_argument(format!(
                "Input data contains submodule \"{}\" which cannot be parsed directly without \
                 its main module.",
                parsed.name
            )));
        }
        for rev in &parsed.revisions {
            check_date(&rev.date)?;
        }
        sort_revisions(&mut parsed.revisions);

        if implement && self.get_module_implemented(&parsed.name).is_some() {
            return Err(YangError::already_exists(format!(
                "Module \"{}\" is already implemented in the context.",
                parsed.name
            )));
        }

        let revision = parsed.revisions.first().map(|rev| rev.date.clone());
        let mut stolen_latest: Option<ModuleId> = None;
        let (id, attached) = match self.get_module(&parsed.name, revision.as_deref()) {
            Some(existing) => {
                if self.modules[existing.0].parsed.is_some() {
                    let message = match &revision {
                        Some(rev) => format!(
                            "Module \"{}\" of revision \"{rev}\" is already present in the context.",
                            parsed.name
                        ),
                        None => format!(
                            "Module \"{}\" with no revision is already present in the context.",
                            parsed.name
                        ),
                    };
                    return Err(YangError::already_exists(message));
                }
                // a compiled-only handle regains its source tree
                let module = &mut self.modules[existing.0];
                module.parsed = Some(parsed);
                if implement {
                    module.implemented = true;
                }
                (existing, true)
            }
            None => {
                let latest = match self.get_module_latest(&parsed.name) {
                    Some(previous) => {
                        let newer = !parsed.revisions.is_empty()
                            && match &self.modules[previous.0].revision {
                                None => true,
                                Some(old) => revision.as_deref() > Some(&**old),
                            };
                        if newer {
                            self.modules[previous.0].latest_revision = false;
                            stolen_latest = Some(previous);
                        }
                        newer
                    }
                    None => true,
                };
                let name = parsed.name.clone();
                self.modules.push(Module {
                    name,
                    revision,
                    implemented: implement,
                    latest_revision: latest,
                    parsed: Some(parsed),
                    compiled: None,
                    compiling: false,
                });
                (ModuleId(self.modules.len() - 1), false)
            }
        };

        if let Err(err) = self.resolve_dependencies(id, pctx) {
            // unwind to the pre-insert state; a dead handle stays as a
            // skipped slot so earlier ids remain valid
            let module = &mut self.modules[id.0];
            module.parsed = None;
            if !attached {
                module.implemented = false;
                module.latest_revision = false;
                if let Some(previous) = stolen_latest {
                    self.modules[previous.0].latest_revision = true;
                }
            }
            return Err(err);
        }

        Ok(id)
    }

    /// Resolve imports and includes of a freshly inserted module, then
    /// check typedef and grouping uniqueness across its scopes
    fn resolve_dependencies(&mut self, id: ModuleId, pctx: &mut ParserContext) -> Result<()> {
        let mut parsed = self.modules[id.0]
            .parsed
            .take()
            .expect("dependency resolution runs on a parsed module");

        let result = self.resolve_dependencies_inner(&mut parsed, pctx);
        self.modules[id.0].parsed = Some(parsed);
        result
    }

    fn resolve_dependencies_inner(
        &mut self,
        parsed: &mut ParsedModule,
        pctx: &mut ParserContext,
    ) -> Result<()> {
        for idx in 0..parsed.imports.len() {
            if parsed.imports[idx].module.is_none() {
                let name = parsed.imports[idx].name.clone();
                let revision = parsed.imports[idx].revision.clone();
                let target = self.load_module(&name, revision.as_deref())?;
                parsed.imports[idx].module = Some(target);
            }
            // the same module must not be imported under two prefixes
            for earlier in 0..idx {
                if parsed.imports[earlier].module == parsed.imports[idx].module {
                    return Err(YangError::reference(format!(
                        "Single revision of the module \"{}\" referred twice.",
                        parsed.imports[idx].name
                    )));
                }
            }
        }

        for inc in &mut parsed.includes {
            if inc.submodule.is_some() {
                continue;
            }
            let located = loader::search_local_file(
                &self.options.search_paths,
                self.options.search_cwd,
                &inc.name,
                inc.revision.as_deref(),
            )?
            .ok_or_else(|| YangError::not_found("submodule", &*inc.name))?;
            let data = std::fs::read_to_string(&located.path)?;
            let sub = self.parse_submodule(&data, located.format, &parsed.name, pctx)?;
            inc.submodule = Some(Box::new(sub));
        }

        pctx.collect(parsed);
        for inc in &parsed.includes {
            if let Some(sub) = &inc.submodule {
                pctx.collect(sub);
            }
        }
        pctx.check_unique()
    }

    /// Parse an included submodule in its main module's context
    fn parse_submodule(
        &mut self,
        data: &str,
        format: SchemaFormat,
        main_name: &str,
        pctx: &mut ParserContext,
    ) -> Result<ParsedModule> {
        let mut sub = {
            let parser = self.parsers.get(&format).ok_or_else(|| {
                YangError::invalid_argument(format!(
                    "No parser is registered for the {format:?} input format."
                ))
            })?;
            parser.parse(&self.pool, data, pctx)?
        };
        if !sub.submodule {
            return Err(YangError::semantic(format!(
                "Included \"{}\" schema is not a submodule.",
                sub.name
            )));
        }
        if sub.belongs_to.as_deref() != Some(main_name) {
            return Err(YangError::reference(format!(
                "Submodule \"{}\" belongs to module \"{}\", not to \"{main_name}\".",
                sub.name,
                sub.belongs_to.as_deref().unwrap_or("<none>")
            )));
        }
        for rev in &sub.revisions {
            check_date(&rev.date)?;
        }
        sort_revisions(&mut sub.revisions);
        Ok(sub)
    }

    /// Compile a module's parsed tree into its compiled tree
    ///
    /// Imported modules are compiled first when needed. On failure the
    /// handle keeps no partial compiled tree and its parsed tree
    /// always survives, so the caller may adjust and retry.
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable handle or any validation
    /// failure; details are also recorded as diagnostics.
    pub fn compile(&mut self, id: ModuleId, options: CompileOptions) -> Result<()> {
        if self.modules[id.0].compiled.is_some() {
            return Ok(());
        }
        if self.modules[id.0].parsed.is_none() {
            return Err(YangError::invalid_argument(format!(
                "Module \"{}\" has no parsed tree to compile.",
                self.modules[id.0].name
            )));
        }
        if self.modules[id.0].compiling {
            return Err(YangError::reference(format!(
                "Circular dependency on module \"{}\".",
                self.modules[id.0].name
            )));
        }

        self.modules[id.0].compiling = true;
        let result = self.compile_protected(id, options);
        self.modules[id.0].compiling = false;
        result
    }

    fn compile_protected(&mut self, id: ModuleId, options: CompileOptions) -> Result<()> {
        // an import is used with both trees: the parsed one for
        // typedefs and groupings, the compiled one for features and
        // identities
        let import_targets: Vec<ModuleId> = self.modules[id.0]
            .parsed
            .as_ref()
            .expect("checked by compile")
            .imports
            .iter()
            .filter_map(|imp| imp.module)
            .collect();
        for target in import_targets {
            if self.modules[target.0].parsed.is_none() {
                self.reload_module_source(target)?;
            }
            if self.modules[target.0].compiled.is_none() {
                self.compile(target, options - CompileOptions::FREE_PARSED)?;
            }
        }

        let (result, diags, memo, backlinks) = {
            let parsed = self.modules[id.0].parsed.as_ref().expect("checked by compile");
            let mut cctx = CompileCtx::new(self, id, parsed, options);
            let result = compile::compile_module(&mut cctx);
            (result, cctx.diags, cctx.memo, cctx.backlinks)
        };
        self.diagnostics.extend(diags);
        let compiled = result?;

        self.modules[id.0].compiled = Some(compiled);
        for (target, dependent) in backlinks.feature_dependents {
            self.modules[target.module.0]
                .compiled
                .as_mut()
                .expect("backlink targets are compiled")
                .features[target.feature]
                .dependents
                .push(dependent);
        }
        for (base, derived) in backlinks.identity_derived {
            self.modules[base.module.0]
                .compiled
                .as_mut()
                .expect("backlink targets are compiled")
                .identities[base.identity]
                .derived
                .push(derived);
        }
        self.typedef_cache.extend(memo);

        if options.contains(CompileOptions::FREE_PARSED) {
            self.modules[id.0].parsed = None;
        }
        Ok(())
    }

    /// Re-parse the source of a compiled-only module so its parsed
    /// tree is available again
    fn reload_module_source(&mut self, id: ModuleId) -> Result<()> {
        let name = self.modules[id.0].name.clone();
        let revision = self.modules[id.0].revision.clone();
        let located = loader::search_local_file(
            &self.options.search_paths,
            self.options.search_cwd,
            &name,
            revision.as_deref(),
        )?
        .ok_or_else(|| {
            YangError::not_found_in("module", &*name, "source data not found for reload")
        })?;
        let data = std::fs::read_to_string(&located.path)?;
        let reloaded = self.parse_source(&data, located.format, false)?;
        if reloaded != id {
            return Err(YangError::internal(format!(
                "reloaded source of module \"{name}\" did not attach to its handle"
            )));
        }
        Ok(())
    }

    pub(crate) fn cached_typedef(&self, module: ModuleId, name: &str) -> Option<&Arc<CompiledType>> {
        self.typedef_cache.get(&(module, Arc::from(name)))
    }

    /// The current state of one feature
    ///
    /// # Errors
    ///
    /// Returns an error when the module is not compiled or has no such
    /// feature.
    pub fn feature_value(&self, module: ModuleId, name: &str) -> Result<bool> {
        let compiled = self.modules[module.0].compiled.as_ref().ok_or_else(|| {
            YangError::invalid_argument(format!(
                "Module \"{}\" is not compiled.",
                self.modules[module.0].name
            ))
        })?;
        compiled
            .features
            .iter()
            .find(|f| &*f.name == name)
            .map(CompiledFeature::enabled)
            .ok_or_else(|| {
                YangError::not_found_in("feature", name, format!("module \"{}\"", compiled.name))
            })
    }

    /// Enable a feature; `"*"` enables every feature of the module
    ///
    /// # Errors
    ///
    /// See [`Context::set_feature`].
    pub fn enable_feature(&mut self, module: ModuleId, name: &str) -> Result<()> {
        self.set_feature(module, name, true)
    }

    /// Disable a feature; `"*"` disables every feature of the module
    ///
    /// # Errors
    ///
    /// See [`Context::set_feature`].
    pub fn disable_feature(&mut self, module: ModuleId, name: &str) -> Result<()> {
        self.set_feature(module, name, false)
    }

    /// Switch a feature and propagate the change
    ///
    /// Enabling verifies the feature's `if-feature` expressions first.
    /// With `"*"` the pass repeats until a fixed point; if features
    /// remain blocked there, every change of this call is rolled back.
    /// After a successful switch, enabled dependents whose conditions
    /// no longer hold are disabled transitively. Dependents are never
    /// auto-enabled.
    ///
    /// # Errors
    ///
    /// Returns invalid-argument for an uncompiled or feature-less
    /// module, not-found for an unknown name, and denied when an
    /// `if-feature` conflict blocks the change; a failed call leaves
    /// every feature exactly as it was.
    pub fn set_feature(&mut self, module: ModuleId, name: &str, value: bool) -> Result<()> {
        let feature_count = {
            let compiled = self.modules[module.0].compiled.as_ref().ok_or_else(|| {
                YangError::invalid_argument(format!(
                    "Module \"{}\" is not compiled.",
                    self.modules[module.0].name
                ))
            })?;
            if compiled.features.is_empty() {
                return Err(YangError::invalid_argument(format!(
                    "Unable to switch feature since the module \"{}\" has no features.",
                    compiled.name
                )));
            }
            compiled.features.len()
        };

        let all = name == "*";
        let mut changed: Vec<usize> = Vec::new();
        let mut changed_last_run = 0usize;

        loop {
            let mut blocked = 0usize;
            for idx in 0..feature_count {
                {
                    let feature = &self.features(module)[idx];
                    if !all && &*feature.name != name {
                        continue;
                    }
                    if feature.enabled() == value {
                        if all {
                            continue;
                        }
                        // already in the requested state
                        return Ok(());
                    }
                }
                if value {
                    if !self.feature_conditions_hold(module, idx) {
                        if all {
                            blocked += 1;
                            continue;
                        }
                        let feature_name = self.features(module)[idx].name.clone();
                        return Err(YangError::denied(format!(
                            "Feature \"{feature_name}\" cannot be enabled since it is disabled \
                             by its if-feature condition(s)."
                        )));
                    }
                    self.set_feature_flag(module, idx, true);
                } else {
                    self.set_feature_flag(module, idx, false);
                }
                changed.push(idx);
                if !all {
                    break;
                }
            }

            if !all && changed.is_empty() {
                return Err(YangError::not_found_in(
                    "feature",
                    name,
                    format!("module \"{}\"", self.modules[module.0].name),
                ));
            }

            if value && all && blocked > 0 {
                if changed_last_run == changed.len() {
                    // no progress in the last pass: report what stays
                    // blocked and restore the original state
                    for idx in 0..feature_count {
                        if !self.features(module)[idx].enabled() {
                            let feature_name = self.features(module)[idx].name.clone();
                            self.diagnostics.push(Diagnostic::new(
                                format!("/{}", self.modules[module.0].name),
                                "feature-denied",
                                format!(
                                    "Feature \"{feature_name}\" cannot be enabled since it is \
                                     disabled by its if-feature condition(s)."
                                ),
                            ));
                        }
                    }
                    for &idx in &changed {
                        self.set_feature_flag(module, idx, false);
                    }
                    return Err(YangError::denied(format!(
                        "Unable to enable all features of module \"{}\".",
                        self.modules[module.0].name
                    )));
                }
                changed_last_run = changed.len();
                continue;
            }
            break;
        }

        // reflect the changes in dependent features: an enabled
        // dependent whose conditions no longer hold is disabled and
        // cascades further; nothing is ever auto-enabled
        let mut queue: Vec<FeatureRef> = changed
            .into_iter()
            .map(|feature| FeatureRef { module, feature })
            .collect();
        let mut next = 0usize;
        while next < queue.len() {
            let current = queue[next];
            next += 1;
            let dependents = self.modules[current.module.0]
                .compiled
                .as_ref()
                .expect("changed features live in compiled modules")
                .features[current.feature]
                .dependents
                .clone();
            for dependent in dependents {
                if !self.feature_ref_enabled(dependent) {
                    continue;
                }
                if !self.feature_conditions_hold(dependent.module, dependent.feature) {
                    self.set_feature_flag(dependent.module, dependent.feature, false);
                    queue.push(dependent);
                }
            }
        }

        Ok(())
    }

    fn features(&self, module: ModuleId) -> &[CompiledFeature] {
        self.modules[module.0]
            .compiled
            .as_ref()
            .map(|c| c.features.as_slice())
            .unwrap_or_default()
    }

    fn set_feature_flag(&mut self, module: ModuleId, feature: usize, value: bool) {
        let flags = &mut self.modules[module.0]
            .compiled
            .as_mut()
            .expect("feature flags live in compiled modules")
            .features[feature]
            .flags;
        if value {
            flags.insert(NodeFlags::ENABLED);
        } else {
            flags.remove(NodeFlags::ENABLED);
        }
    }

    /// Whether every `if-feature` expression of a feature holds
    fn feature_conditions_hold(&self, module: ModuleId, feature: usize) -> bool {
        self.features(module)[feature]
            .if_features
            .iter()
            .all(|expr| expr.evaluate(&|fref| self.feature_ref_enabled(fref)))
    }

    fn feature_ref_enabled(&self, fref: FeatureRef) -> bool {
        self.modules[fref.module.0]
            .compiled
            .as_ref()
            .and_then(|c| c.features.get(fref.feature))
            .is_some_and(CompiledFeature::enabled)
    }
}
