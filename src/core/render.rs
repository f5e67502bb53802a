//! Header serialization.
//!
//! `child-src` is never stored. It is derived from `frame-src` and
//! `worker-src` each time the policy is rendered, and when it is emitted the
//! two source directives are written out explicitly even if they would
//! otherwise collapse into `default-src`.

use crate::constants::REPORT_URI_REPORT_ONLY;
use crate::core::directives::{Directive, DirectiveSet};
use crate::core::policy::CspPolicy;
use crate::core::source::Source;
use std::fmt::{self, Write};

/// Source-list directives written between `child-src` and `plugin-types`.
const SOURCE_ORDER: [Directive; 11] = [
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
];

/// Derives `child-src` from `frame-src` and `worker-src`.
pub(crate) fn synthesize_child_src(frame: &DirectiveSet, worker: &DirectiveSet) -> DirectiveSet {
    match (frame.is_empty(), worker.is_empty()) {
        (true, true) => return DirectiveSet::new(),
        (false, true) => return frame.clone(),
        (true, false) => return worker.clone(),
        (false, false) if frame == worker => return frame.clone(),
        (false, false) => {}
    }

    let tiers: [fn(&Source) -> bool; 4] = [
        Source::is_self,
        |s| matches!(s, Source::Scheme(_)),
        |s| s.is_quoted() && !s.is_self() && !s.is_none(),
        |s| matches!(s, Source::Host(_) | Source::Wildcard),
    ];

    let mut child = DirectiveSet::new();
    for tier in tiers {
        for source in frame.into_iter().chain(worker) {
            if tier(source) {
                child.add_source(source.clone());
            }
        }
    }
    child
}

pub(crate) fn write_policy<W: Write>(policy: &CspPolicy, out: &mut W) -> fmt::Result {
    let mut writer = DirectiveWriter { out, first: true };
    let default = policy.default_src();
    writer.directive(Directive::DefaultSrc.name(), default)?;

    let frame = policy.stored(Directive::FrameSrc);
    let worker = policy.stored(Directive::WorkerSrc);
    let child = synthesize_child_src(frame, worker);
    let child_emitted = !child.is_empty() && &child != default;
    if child_emitted {
        writer.directive(Directive::ChildSrc.name(), &child)?;
    }

    for directive in SOURCE_ORDER {
        let set = policy.stored(directive);
        let falls_back = set.is_empty() || set == default;

        if matches!(directive, Directive::FrameSrc | Directive::WorkerSrc) && child_emitted {
            let value = if falls_back { default } else { set };
            writer.directive(directive.name(), value)?;
        } else if directive == Directive::BaseUri {
            if !set.is_empty() {
                writer.directive(directive.name(), set)?;
            }
        } else if !falls_back {
            writer.directive(directive.name(), set)?;
        }
    }

    if policy.plugins_allowed() && !policy.plugin_types().is_empty() {
        writer.words(Directive::PluginTypes.name(), policy.plugin_types())?;
    }

    if let Some(flags) = policy.sandbox() {
        writer.words(Directive::Sandbox.name(), flags)?;
    }

    for directive in [Directive::FormAction, Directive::FrameAncestors] {
        let set = policy.stored(directive);
        if !set.is_empty() {
            writer.directive(directive.name(), set)?;
        }
    }

    if let Some(uri) = policy.report_uri() {
        let name = if policy.is_report_only() {
            REPORT_URI_REPORT_ONLY
        } else {
            Directive::ReportUri.name()
        };
        writer.words(name, &[uri])?;
    }

    Ok(())
}

struct DirectiveWriter<'a, W> {
    out: &'a mut W,
    first: bool,
}

impl<W: Write> DirectiveWriter<'_, W> {
    fn start(&mut self, name: &str) -> fmt::Result {
        if !self.first {
            self.out.write_char(' ')?;
        }
        self.first = false;
        self.out.write_str(name)
    }

    fn directive(&mut self, name: &str, set: &DirectiveSet) -> fmt::Result {
        self.start(name)?;
        for source in set {
            write!(self.out, " {}", source)?;
        }
        self.out.write_char(';')
    }

    fn words<S: AsRef<str>>(&mut self, name: &str, words: &[S]) -> fmt::Result {
        self.start(name)?;
        for word in words {
            self.out.write_char(' ')?;
            self.out.write_str(word.as_ref())?;
        }
        self.out.write_char(';')
    }
}
