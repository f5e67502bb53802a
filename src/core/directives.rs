use crate::constants::{self, EXPERIMENTAL_DIRECTIVES};
use crate::core::source::Source;
use crate::error::CspError;
use smallvec::SmallVec;
use std::{fmt, str::FromStr};

/// The directive vocabulary this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Directive {
    DefaultSrc,
    ChildSrc,
    ConnectSrc,
    FontSrc,
    FrameSrc,
    ImgSrc,
    ManifestSrc,
    MediaSrc,
    ObjectSrc,
    ScriptSrc,
    StyleSrc,
    WorkerSrc,
    BaseUri,
    PluginTypes,
    Sandbox,
    FormAction,
    FrameAncestors,
    ReportUri,
}

impl Directive {
    pub const ALL: [Directive; 18] = [
        Directive::DefaultSrc,
        Directive::ChildSrc,
        Directive::ConnectSrc,
        Directive::FontSrc,
        Directive::FrameSrc,
        Directive::ImgSrc,
        Directive::ManifestSrc,
        Directive::MediaSrc,
        Directive::ObjectSrc,
        Directive::ScriptSrc,
        Directive::StyleSrc,
        Directive::WorkerSrc,
        Directive::BaseUri,
        Directive::PluginTypes,
        Directive::Sandbox,
        Directive::FormAction,
        Directive::FrameAncestors,
        Directive::ReportUri,
    ];

    /// Directives whose value is an ordered source list stored in the policy.
    pub const SOURCE_LISTS: [Directive; 14] = [
        Directive::DefaultSrc,
        Directive::ConnectSrc,
        Directive::FontSrc,
        Directive::FrameSrc,
        Directive::ImgSrc,
        Directive::ManifestSrc,
        Directive::MediaSrc,
        Directive::ObjectSrc,
        Directive::ScriptSrc,
        Directive::StyleSrc,
        Directive::WorkerSrc,
        Directive::BaseUri,
        Directive::FormAction,
        Directive::FrameAncestors,
    ];

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Directive::DefaultSrc => constants::DEFAULT_SRC,
            Directive::ChildSrc => constants::CHILD_SRC,
            Directive::ConnectSrc => constants::CONNECT_SRC,
            Directive::FontSrc => constants::FONT_SRC,
            Directive::FrameSrc => constants::FRAME_SRC,
            Directive::ImgSrc => constants::IMG_SRC,
            Directive::ManifestSrc => constants::MANIFEST_SRC,
            Directive::MediaSrc => constants::MEDIA_SRC,
            Directive::ObjectSrc => constants::OBJECT_SRC,
            Directive::ScriptSrc => constants::SCRIPT_SRC,
            Directive::StyleSrc => constants::STYLE_SRC,
            Directive::WorkerSrc => constants::WORKER_SRC,
            Directive::BaseUri => constants::BASE_URI,
            Directive::PluginTypes => constants::PLUGIN_TYPES,
            Directive::Sandbox => constants::SANDBOX,
            Directive::FormAction => constants::FORM_ACTION,
            Directive::FrameAncestors => constants::FRAME_ANCESTORS,
            Directive::ReportUri => constants::REPORT_URI,
        }
    }

    /// Fetch directives fall back to `default-src` when left empty.
    #[inline]
    pub const fn is_fetch(&self) -> bool {
        matches!(
            self,
            Directive::DefaultSrc
                | Directive::ChildSrc
                | Directive::ConnectSrc
                | Directive::FontSrc
                | Directive::FrameSrc
                | Directive::ImgSrc
                | Directive::ManifestSrc
                | Directive::MediaSrc
                | Directive::ObjectSrc
                | Directive::ScriptSrc
                | Directive::StyleSrc
                | Directive::WorkerSrc
        )
    }

    #[inline]
    pub const fn is_document(&self) -> bool {
        matches!(
            self,
            Directive::BaseUri | Directive::PluginTypes | Directive::Sandbox
        )
    }

    #[inline]
    pub const fn is_navigation(&self) -> bool {
        matches!(self, Directive::FormAction | Directive::FrameAncestors)
    }

    /// Directives that accept nonces, hashes and `'unsafe-inline'`.
    #[inline]
    pub const fn allows_inline(&self) -> bool {
        matches!(
            self,
            Directive::DefaultSrc | Directive::ScriptSrc | Directive::StyleSrc
        )
    }

    /// Directives that accept `'strict-dynamic'` and `'unsafe-eval'`.
    #[inline]
    pub const fn is_script(&self) -> bool {
        matches!(self, Directive::DefaultSrc | Directive::ScriptSrc)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Directive {
    type Err = CspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Some(directive) = Directive::ALL.iter().find(|d| d.name() == name) {
            return Ok(*directive);
        }
        if EXPERIMENTAL_DIRECTIVES.contains(&name.as_str()) {
            return Err(CspError::ExperimentalDirective(name));
        }
        Err(CspError::InvalidDirective(name))
    }
}

pub(crate) static EMPTY_SET: DirectiveSet = DirectiveSet {
    sources: SmallVec::new_const(),
};

/// The ordered, duplicate-free source list of one directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DirectiveSet {
    sources: SmallVec<[Source; 4]>,
}

impl DirectiveSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source unless already present. `'none'` replaces everything,
    /// and anything added to a lone `'none'` replaces it.
    pub fn add_source(&mut self, source: Source) -> &mut Self {
        if source.is_none() || self.is_none() {
            self.sources.clear();
            self.sources.push(source);
        } else if !self.contains(&source) {
            self.sources.push(source);
        }
        self
    }

    /// Replaces the whole list with a single source.
    #[inline]
    pub fn set_exclusive(&mut self, source: Source) -> &mut Self {
        self.sources.clear();
        self.sources.push(source);
        self
    }

    /// Accepts `'unsafe-inline'`, which is a no-op once a nonce or hash is
    /// present. Returns whether the list changed.
    pub fn add_unsafe_inline(&mut self) -> bool {
        if self.contains_nonce_or_hash() || self.contains(&Source::UnsafeInline) {
            return false;
        }
        self.add_source(Source::UnsafeInline);
        true
    }

    /// Adds a nonce or hash. A bare `'unsafe-inline'` is upgraded in place so
    /// the directive keeps its order.
    pub fn add_inline_credential(&mut self, source: Source) -> &mut Self {
        if self.contains(&source) {
            return self;
        }
        match self.position(&Source::UnsafeInline) {
            Some(index) => self.sources[index] = source,
            None => {
                self.add_source(source);
            }
        }
        self
    }

    /// Appends a gated keyword only when a nonce or hash is already present.
    pub fn add_if_credentialed(&mut self, source: Source) -> bool {
        if !self.contains_nonce_or_hash() {
            return false;
        }
        if !self.contains(&source) {
            self.sources.push(source);
        }
        true
    }

    #[inline]
    pub fn replace_with(&mut self, other: &DirectiveSet) -> &mut Self {
        self.sources.clone_from(&other.sources);
        self
    }

    #[inline]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// True when the list is exactly `['none']`.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.sources.len() == 1 && self.sources[0].is_none()
    }

    /// True when the first source is `'none'`, which blocks the directive.
    #[inline]
    pub fn blocks(&self) -> bool {
        self.sources.first().is_some_and(Source::is_none)
    }

    #[inline]
    pub fn contains(&self, source: &Source) -> bool {
        self.sources.iter().any(|s| s == source)
    }

    #[inline]
    pub fn position(&self, source: &Source) -> Option<usize> {
        self.sources.iter().position(|s| s == source)
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        self.sources.iter().any(|s| s.contains_nonce())
    }

    #[inline]
    pub fn contains_hash(&self) -> bool {
        self.sources.iter().any(|s| s.contains_hash())
    }

    #[inline]
    pub fn contains_nonce_or_hash(&self) -> bool {
        self.sources
            .iter()
            .any(|s| s.contains_nonce() || s.contains_hash())
    }

    #[inline]
    pub fn estimated_size(&self) -> usize {
        self.sources.iter().map(Source::estimated_size).sum::<usize>() + self.sources.len()
    }
}

impl fmt::Display for DirectiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for source in &self.sources {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", source)?;
            first = false;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DirectiveSet {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
