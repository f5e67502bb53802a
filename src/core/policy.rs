use crate::constants::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_PLUGIN_TYPES, HEADER_CSP, HEADER_CSP_REPORT_ONLY,
    SANDBOX_VALUES,
};
use crate::core::directives::{Directive, DirectiveSet, EMPTY_SET};
use crate::core::render;
use crate::core::source::Source;
use crate::error::CspError;
use crate::security::hash::{HashAlgorithm, HashGenerator};
use crate::security::nonce;
use actix_web::http::header::{HeaderName, HeaderValue};
use bytes::Bytes;
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::{borrow::Cow, fmt, hash::BuildHasherDefault};

type DirectiveMap = IndexMap<Directive, DirectiveSet, BuildHasherDefault<FxHasher>>;
type WordList = SmallVec<[Cow<'static, str>; 4]>;

/// An incrementally built Content-Security-Policy.
///
/// Every mutation validates its input first and leaves the policy untouched
/// on error. Rendering borrows the policy immutably and can be repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspPolicy {
    directives: DirectiveMap,
    plugin_types: WordList,
    plugin_types_set: bool,
    sandbox: Option<WordList>,
    report_uri: Option<Cow<'static, str>>,
    report_only: bool,
}

impl CspPolicy {
    /// The baseline policy: `default-src 'none'` with `'self'` for scripts,
    /// styles, images, media and connections.
    pub fn new() -> Self {
        let mut policy = Self::empty();
        for directive in [
            Directive::ScriptSrc,
            Directive::ConnectSrc,
            Directive::StyleSrc,
            Directive::ImgSrc,
            Directive::MediaSrc,
        ] {
            policy.set_mut(directive).set_exclusive(Source::Self_);
        }
        policy
    }

    /// Builds a policy whose `default-src` is seeded from a whitespace or
    /// semicolon delimited expression such as `"'self' https://cdn.example.net"`.
    /// No other directive is populated.
    pub fn with_default_src(expression: &str) -> Result<Self, CspError> {
        let mut policy = Self::empty();
        for raw in expression
            .split(|c: char| c.is_whitespace() || c == ';')
            .filter(|raw| !raw.is_empty())
        {
            let source = Source::parse(raw)?;
            policy.add_token(Directive::DefaultSrc, source)?;
        }
        Ok(policy)
    }

    fn empty() -> Self {
        let mut directives = DirectiveMap::default();
        for directive in Directive::SOURCE_LISTS {
            directives.insert(directive, DirectiveSet::new());
        }
        if let Some(default) = directives.get_mut(&Directive::DefaultSrc) {
            default.set_exclusive(Source::None);
        }

        Self {
            directives,
            plugin_types: DEFAULT_PLUGIN_TYPES.iter().map(|t| Cow::Borrowed(*t)).collect(),
            plugin_types_set: false,
            sandbox: None,
            report_uri: None,
            report_only: false,
        }
    }

    #[inline]
    pub(crate) fn stored(&self, directive: Directive) -> &DirectiveSet {
        self.directives.get(&directive).unwrap_or(&EMPTY_SET)
    }

    #[inline]
    fn set_mut(&mut self, directive: Directive) -> &mut DirectiveSet {
        self.directives.entry(directive).or_default()
    }

    fn source_list(directive: Directive) -> Result<Directive, CspError> {
        match directive {
            Directive::ChildSrc => Err(CspError::InvalidChildSrc),
            d if Directive::SOURCE_LISTS.contains(&d) => Ok(d),
            d => Err(CspError::InvalidFetchDirective(d.name().to_owned())),
        }
    }

    /// Rejects sources that make no sense in the given directive.
    fn check_applicable(directive: Directive, source: &Source) -> Result<(), CspError> {
        let allowed = match source {
            Source::None | Source::Self_ | Source::Wildcard | Source::Host(_) | Source::Scheme(_) => true,
            _ if !directive.is_fetch() => false,
            Source::UnsafeInline | Source::Nonce(_) | Source::Hash { .. } | Source::ReportSample => {
                directive.allows_inline()
            }
            Source::UnsafeEval | Source::StrictDynamic => directive.is_script(),
        };

        if allowed {
            Ok(())
        } else {
            Err(CspError::invalid_value(directive.name(), source.to_string()))
        }
    }

    /// Assigns `'self'` or `'none'` as the only source of a directive.
    pub fn set_keyword(&mut self, directive: Directive, keyword: Source) -> Result<&mut Self, CspError> {
        let directive = Self::source_list(directive)?;
        if !(keyword.is_self() || keyword.is_none()) {
            return Err(CspError::invalid_value(directive.name(), keyword.to_string()));
        }
        self.set_mut(directive).set_exclusive(keyword);
        Ok(self)
    }

    /// Adds a classified source, honouring the merge rules of its kind.
    /// Returns whether the directive changed; gated keywords whose
    /// precondition does not hold are ignored.
    pub fn add_token(&mut self, directive: Directive, source: Source) -> Result<bool, CspError> {
        let directive = Self::source_list(directive)?;
        Self::check_applicable(directive, &source)?;

        let applied = match source {
            Source::UnsafeInline => {
                let applied = self.set_mut(directive).add_unsafe_inline();
                if !applied {
                    log::debug!(
                        "'unsafe-inline' ignored on {}: a nonce or hash is already present",
                        directive
                    );
                }
                applied
            }
            Source::UnsafeEval => {
                log::warn!("'unsafe-eval' added to {}", directive);
                self.insert(directive, source)
            }
            Source::StrictDynamic => {
                let applied = self.set_mut(directive).add_if_credentialed(source);
                if !applied {
                    log::warn!(
                        "'strict-dynamic' ignored on {}: it requires a nonce or hash",
                        directive
                    );
                }
                applied
            }
            Source::ReportSample => {
                if self.report_uri.is_none() {
                    log::warn!("'report-sample' ignored on {}: no report-uri is set", directive);
                    false
                } else {
                    self.insert(directive, source)
                }
            }
            Source::Nonce(_) | Source::Hash { .. } => {
                self.set_mut(directive).add_inline_credential(source);
                true
            }
            Source::Wildcard => {
                log::warn!("wildcard source added to {} allows any host", directive);
                self.insert(directive, source)
            }
            other => self.insert(directive, other),
        };

        Ok(applied)
    }

    fn insert(&mut self, directive: Directive, source: Source) -> bool {
        let set = self.set_mut(directive);
        let changed = !set.contains(&source);
        set.add_source(source);
        changed
    }

    pub fn add_hash(
        &mut self,
        directive: Directive,
        algorithm: &str,
        digest: &str,
    ) -> Result<&mut Self, CspError> {
        let source = HashAlgorithm::try_from(algorithm)?.source(digest)?;
        self.add_token(directive, source)?;
        Ok(self)
    }

    #[inline]
    pub fn add_script_hash(&mut self, algorithm: &str, digest: &str) -> Result<&mut Self, CspError> {
        self.add_hash(Directive::ScriptSrc, algorithm, digest)
    }

    #[inline]
    pub fn add_style_hash(&mut self, algorithm: &str, digest: &str) -> Result<&mut Self, CspError> {
        self.add_hash(Directive::StyleSrc, algorithm, digest)
    }

    /// Hashes inline content and allows it in the directive.
    pub fn add_content_hash(
        &mut self,
        directive: Directive,
        algorithm: HashAlgorithm,
        content: &[u8],
    ) -> Result<&mut Self, CspError> {
        self.add_token(directive, HashGenerator::generate_source(algorithm, content))?;
        Ok(self)
    }

    pub fn add_nonce(&mut self, directive: Directive, nonce: &str) -> Result<&mut Self, CspError> {
        let source = nonce::nonce_source(nonce)?;
        self.add_token(directive, source)?;
        Ok(self)
    }

    #[inline]
    pub fn set_strict_dynamic(&mut self, directive: Directive) -> Result<bool, CspError> {
        self.add_token(directive, Source::StrictDynamic)
    }

    #[inline]
    pub fn set_report_sample(&mut self, directive: Directive) -> Result<bool, CspError> {
        self.add_token(directive, Source::ReportSample)
    }

    /// Adds one sandbox flag. The sandbox is enabled by the first call.
    pub fn set_sandbox(&mut self, flag: &str) -> Result<&mut Self, CspError> {
        let flag = flag.trim().to_ascii_lowercase();
        if flag.is_empty() || !flag.bytes().all(|b| b.is_ascii_lowercase() || b == b'-') {
            return Err(CspError::BadSandboxValue(flag));
        }
        let known = SANDBOX_VALUES
            .iter()
            .find(|value| **value == flag)
            .ok_or(CspError::InvalidSandboxPolicy(flag))?;

        let flags = self.sandbox.get_or_insert_with(SmallVec::new);
        if !flags.iter().any(|f| f == known) {
            flags.push(Cow::Borrowed(*known));
        }
        Ok(self)
    }

    /// Enables the most restrictive sandbox, rendered as a bare `sandbox;`.
    #[inline]
    pub fn enable_sandbox(&mut self) -> &mut Self {
        self.sandbox.get_or_insert_with(SmallVec::new);
        self
    }

    /// Adds a MIME type to `plugin-types`. The first call replaces the
    /// built-in defaults.
    pub fn set_plugin_types(&mut self, mime: &str) -> Result<&mut Self, CspError> {
        let mime = mime.trim().to_ascii_lowercase();
        if !is_mime_type(&mime) {
            return Err(CspError::BadMime(mime));
        }

        if !self.plugin_types_set {
            self.plugin_types.clear();
            self.plugin_types_set = true;
        }
        if !self.plugin_types.iter().any(|t| *t == mime) {
            self.plugin_types.push(Cow::Owned(mime));
        }
        Ok(self)
    }

    #[inline]
    pub fn set_base_uri(&mut self, raw: &str) -> Result<&mut Self, CspError> {
        self.add_navigation(Directive::BaseUri, raw)
    }

    #[inline]
    pub fn set_form_action(&mut self, raw: &str) -> Result<&mut Self, CspError> {
        self.add_navigation(Directive::FormAction, raw)
    }

    #[inline]
    pub fn set_frame_ancestors(&mut self, raw: &str) -> Result<&mut Self, CspError> {
        self.add_navigation(Directive::FrameAncestors, raw)
    }

    fn add_navigation(&mut self, directive: Directive, raw: &str) -> Result<&mut Self, CspError> {
        let source = Source::parse(raw)?;
        self.add_token(directive, source)?;
        Ok(self)
    }

    /// Sets the violation report endpoint. Accepts an absolute `http(s)` URL
    /// or an absolute path on the current origin.
    pub fn set_report_uri(&mut self, uri: &str, report_only: bool) -> Result<&mut Self, CspError> {
        let uri = uri.trim();
        let invalid = || CspError::InvalidReportUri(uri.to_owned());

        if uri.is_empty()
            || uri
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | ',' | '\'' | '"'))
        {
            return Err(invalid());
        }

        if !uri.starts_with('/') || uri.starts_with("//") {
            let parsed = url::Url::parse(uri).map_err(|_| invalid())?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(invalid());
            }
            if parsed.scheme() == "http" {
                log::warn!("report-uri '{}' uses insecure http", uri);
            }
        }

        self.report_uri = Some(Cow::Owned(uri.to_owned()));
        self.report_only = report_only;
        Ok(self)
    }

    #[inline]
    pub fn set_report_only(&mut self, report_only: bool) -> &mut Self {
        self.report_only = report_only;
        self
    }

    /// Parses and adds a value to a fetch directive named by string.
    ///
    /// `'self'` and `'none'` replace the directive's sources. `default-src`
    /// is fixed at construction and `child-src` is derived, so both are
    /// refused.
    pub fn add_fetch_policy(&mut self, directive: &str, raw: &str) -> Result<bool, CspError> {
        let directive: Directive = directive.parse()?;
        match directive {
            Directive::DefaultSrc => return Err(CspError::InvalidDefaultSrc),
            Directive::ChildSrc => return Err(CspError::InvalidChildSrc),
            d if !d.is_fetch() => return Err(CspError::InvalidFetchDirective(d.name().to_owned())),
            _ => {}
        }

        let source = Source::parse(raw)?;
        match source {
            Source::Self_ | Source::None => {
                self.set_keyword(directive, source)?;
                Ok(true)
            }
            Source::UnsafeInline if !matches!(directive, Directive::ScriptSrc | Directive::StyleSrc) => {
                Err(CspError::invalid_value(directive.name(), source.to_string()))
            }
            Source::UnsafeEval if directive != Directive::ScriptSrc => {
                Err(CspError::invalid_value(directive.name(), source.to_string()))
            }
            source => self.add_token(directive, source),
        }
    }

    /// Parses and applies a value to a document, navigation or reporting
    /// directive named by string. An empty `sandbox` value enables the bare
    /// sandbox.
    pub fn add_document_policy(&mut self, directive: &str, raw: &str) -> Result<bool, CspError> {
        let directive: Directive = directive.parse()?;
        if !(directive.is_document() || directive.is_navigation() || directive == Directive::ReportUri) {
            return Err(CspError::InvalidDocumentDirective(directive.name().to_owned()));
        }
        match directive {
            Directive::BaseUri => self.set_base_uri(raw).map(|_| true),
            Directive::FormAction => self.set_form_action(raw).map(|_| true),
            Directive::FrameAncestors => self.set_frame_ancestors(raw).map(|_| true),
            Directive::PluginTypes => self.set_plugin_types(raw).map(|_| true),
            Directive::Sandbox if raw.trim().is_empty() => Ok(self.enable_sandbox().is_sandboxed()),
            Directive::Sandbox => self.set_sandbox(raw).map(|_| true),
            Directive::ReportUri => {
                let report_only = self.report_only;
                self.set_report_uri(raw, report_only).map(|_| true)
            }
            _ => Err(CspError::InvalidDocumentDirective(directive.name().to_owned())),
        }
    }

    /// Replaces a fetch directive's sources with a copy of `default-src`, so
    /// further additions extend the default instead of replacing it.
    pub fn copy_default_policy(&mut self, directive: Directive) -> Result<&mut Self, CspError> {
        match directive {
            Directive::DefaultSrc => return Err(CspError::InvalidDefaultSrc),
            Directive::ChildSrc => return Err(CspError::InvalidChildSrc),
            d if !d.is_fetch() => return Err(CspError::InvalidFetchDirective(d.name().to_owned())),
            _ => {}
        }

        let default = self.default_src().clone();
        self.set_mut(directive).replace_with(&default);
        Ok(self)
    }

    /// The stored sources of a directive. `child-src` is derived at render
    /// time and `plugin-types`, `sandbox` and `report-uri` have their own
    /// accessors, so those return `None`.
    #[inline]
    pub fn sources(&self, directive: Directive) -> Option<&DirectiveSet> {
        self.directives.get(&directive)
    }

    #[inline]
    pub fn default_src(&self) -> &DirectiveSet {
        self.stored(Directive::DefaultSrc)
    }

    /// The `child-src` value that would be rendered now, if any.
    pub fn child_src(&self) -> DirectiveSet {
        render::synthesize_child_src(
            self.stored(Directive::FrameSrc),
            self.stored(Directive::WorkerSrc),
        )
    }

    #[inline]
    pub fn plugin_types(&self) -> &[Cow<'static, str>] {
        &self.plugin_types
    }

    /// False while `plugin-types` still holds the built-in defaults.
    #[inline]
    pub fn has_explicit_plugin_types(&self) -> bool {
        self.plugin_types_set
    }

    /// `plugin-types` only makes sense when object loading is not blocked.
    pub fn plugins_allowed(&self) -> bool {
        let object = self.stored(Directive::ObjectSrc);
        let effective = if object.is_empty() {
            self.default_src()
        } else {
            object
        };
        !effective.is_empty() && !effective.blocks()
    }

    #[inline]
    pub fn sandbox(&self) -> Option<&[Cow<'static, str>]> {
        self.sandbox.as_deref()
    }

    #[inline]
    pub fn is_sandboxed(&self) -> bool {
        self.sandbox.is_some()
    }

    #[inline]
    pub fn report_uri(&self) -> Option<&str> {
        self.report_uri.as_deref()
    }

    #[inline]
    pub fn is_report_only(&self) -> bool {
        self.report_only
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        self.directives.values().any(DirectiveSet::contains_nonce)
    }

    #[inline]
    pub fn contains_hash(&self) -> bool {
        self.directives.values().any(DirectiveSet::contains_hash)
    }

    #[inline]
    pub fn header_name(&self) -> HeaderName {
        if self.report_only {
            HeaderName::from_static(HEADER_CSP_REPORT_ONLY)
        } else {
            HeaderName::from_static(HEADER_CSP)
        }
    }

    /// Renders the header value.
    pub fn build_header(&self) -> String {
        let mut header = String::with_capacity(self.estimated_size().max(DEFAULT_BUFFER_CAPACITY));
        // Writing into a String never fails.
        let _ = render::write_policy(self, &mut header);
        header
    }

    pub fn header_value(&self) -> Result<HeaderValue, CspError> {
        HeaderValue::from_maybe_shared(Bytes::from(self.build_header()))
            .map_err(|e| CspError::HeaderError(e.to_string()))
    }

    /// Upper bound guess of the rendered length, used to size buffers.
    pub fn estimated_size(&self) -> usize {
        let directives: usize = self
            .directives
            .iter()
            .map(|(directive, set)| directive.name().len() + set.estimated_size() + 2)
            .sum();
        let words = |list: &[Cow<'static, str>]| list.iter().map(|w| w.len() + 1).sum::<usize>();

        directives
            // child-src can be as long as frame-src and worker-src together
            + self.stored(Directive::FrameSrc).estimated_size()
            + self.stored(Directive::WorkerSrc).estimated_size()
            + 16
            + words(self.plugin_types.as_slice())
            + 16
            + self.sandbox.as_deref().map_or(0, |flags| words(flags) + 10)
            + self.report_uri.as_ref().map_or(0, |uri| uri.len() + 25)
    }
}

impl Default for CspPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CspPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render::write_policy(self, f)
    }
}

#[inline]
fn is_mime_type(value: &str) -> bool {
    let token = |part: &str| {
        !part.is_empty()
            && part.bytes().all(|b| {
                b.is_ascii_alphanumeric()
                    || matches!(b, b'!' | b'#' | b'$' | b'&' | b'^' | b'_' | b'.' | b'+' | b'-')
            })
    };
    matches!(value.split_once('/'), Some((kind, subtype)) if token(kind) && token(subtype))
}

/// Fluent construction of a [`CspPolicy`]. The first failing step is kept
/// and returned by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct CspPolicyBuilder {
    policy: CspPolicy,
    error: Option<CspError>,
}

impl CspPolicyBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            policy: CspPolicy::new(),
            error: None,
        }
    }

    pub fn with_default_src(expression: &str) -> Self {
        match CspPolicy::with_default_src(expression) {
            Ok(policy) => Self {
                policy,
                error: None,
            },
            Err(e) => Self {
                policy: CspPolicy::new(),
                error: Some(e),
            },
        }
    }

    fn apply<T>(mut self, step: impl FnOnce(&mut CspPolicy) -> Result<T, CspError>) -> Self {
        if self.error.is_none() {
            if let Err(e) = step(&mut self.policy) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn fetch(self, directive: Directive, values: &[&str]) -> Self {
        self.apply(|policy| {
            for value in values {
                policy.add_fetch_policy(directive.name(), value)?;
            }
            Ok(())
        })
    }

    #[inline]
    pub fn script_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::ScriptSrc, values)
    }

    #[inline]
    pub fn style_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::StyleSrc, values)
    }

    #[inline]
    pub fn img_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::ImgSrc, values)
    }

    #[inline]
    pub fn connect_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::ConnectSrc, values)
    }

    #[inline]
    pub fn font_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::FontSrc, values)
    }

    #[inline]
    pub fn object_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::ObjectSrc, values)
    }

    #[inline]
    pub fn media_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::MediaSrc, values)
    }

    #[inline]
    pub fn frame_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::FrameSrc, values)
    }

    #[inline]
    pub fn worker_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::WorkerSrc, values)
    }

    #[inline]
    pub fn manifest_src(self, values: &[&str]) -> Self {
        self.fetch(Directive::ManifestSrc, values)
    }

    pub fn copy_default(self, directive: Directive) -> Self {
        self.apply(|policy| policy.copy_default_policy(directive).map(|_| ()))
    }

    pub fn nonce(self, directive: Directive, nonce: &str) -> Self {
        self.apply(|policy| policy.add_nonce(directive, nonce).map(|_| ()))
    }

    pub fn hash(self, directive: Directive, algorithm: &str, digest: &str) -> Self {
        self.apply(|policy| policy.add_hash(directive, algorithm, digest).map(|_| ()))
    }

    pub fn base_uri(self, raw: &str) -> Self {
        self.apply(|policy| policy.set_base_uri(raw).map(|_| ()))
    }

    pub fn form_action(self, raw: &str) -> Self {
        self.apply(|policy| policy.set_form_action(raw).map(|_| ()))
    }

    pub fn frame_ancestors(self, raw: &str) -> Self {
        self.apply(|policy| policy.set_frame_ancestors(raw).map(|_| ()))
    }

    pub fn plugin_types(self, mime: &str) -> Self {
        self.apply(|policy| policy.set_plugin_types(mime).map(|_| ()))
    }

    pub fn sandbox(self, flags: &[&str]) -> Self {
        self.apply(|policy| {
            policy.enable_sandbox();
            for flag in flags {
                policy.set_sandbox(flag)?;
            }
            Ok(())
        })
    }

    pub fn report_uri(self, uri: &str) -> Self {
        self.apply(|policy| {
            let report_only = policy.is_report_only();
            policy.set_report_uri(uri, report_only).map(|_| ())
        })
    }

    #[inline]
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.policy.set_report_only(enabled);
        self
    }

    pub fn build(self) -> Result<CspPolicy, CspError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.policy),
        }
    }
}
