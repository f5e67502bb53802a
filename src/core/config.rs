use crate::constants::DEFAULT_NONCE_LENGTH;
use crate::core::directives::Directive;
use crate::core::policy::CspPolicy;
use crate::core::source::Source;
use crate::error::CspError;
use crate::security::nonce::{NonceGenerator, RequestNonce};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// A policy template plus the per-request nonce settings shared by every
/// request a middleware instance handles.
#[derive(Debug, Clone)]
pub struct CspConfig {
    policy: Arc<CspPolicy>,
    nonce_generator: Option<NonceGenerator>,
    nonce_directives: SmallVec<[Directive; 2]>,
}

impl CspConfig {
    pub fn new(policy: CspPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
            nonce_generator: None,
            nonce_directives: SmallVec::new(),
        }
    }

    #[inline]
    pub fn policy(&self) -> &CspPolicy {
        &self.policy
    }

    #[inline]
    pub fn nonce_enabled(&self) -> bool {
        self.nonce_generator.is_some()
    }

    #[inline]
    pub fn nonce_length(&self) -> Option<usize> {
        self.nonce_generator.map(|g| g.length())
    }

    #[inline]
    pub fn nonce_directives(&self) -> &[Directive] {
        &self.nonce_directives
    }

    pub fn generate_nonce(&self) -> Option<Result<String, CspError>> {
        self.nonce_generator.as_ref().map(NonceGenerator::generate)
    }

    /// Clones the template for one request. With nonces enabled a fresh
    /// nonce is generated and added to every configured directive.
    pub fn policy_for_request(&self) -> Result<(CspPolicy, Option<RequestNonce>), CspError> {
        let mut policy = CspPolicy::clone(&self.policy);
        let nonce = match self.generate_nonce() {
            Some(nonce) => nonce?,
            None => return Ok((policy, None)),
        };

        for directive in &self.nonce_directives {
            policy.add_nonce(*directive, &nonce)?;
        }
        log::debug!(
            "issued request nonce for {} directive(s)",
            self.nonce_directives.len()
        );

        Ok((policy, Some(RequestNonce(nonce))))
    }

    /// Loads a configuration document.
    ///
    /// ```json
    /// {
    ///   "default_src": "'self' https://cdn.example.net",
    ///   "directives": { "img-src": ["'self'", "data:"] },
    ///   "report_uri": "/csp-report",
    ///   "nonce_directives": ["script-src"]
    /// }
    /// ```
    ///
    /// A missing `default_src` starts from [`CspPolicy::new`]. Directive
    /// values are applied in document order after `report_uri`.
    pub fn from_json(json: &str) -> Result<Self, CspError> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|e| CspError::ConfigError(e.to_string()))?;
        raw.into_config()
    }

    /// Serializes the configuration in the form read by
    /// [`from_json`](Self::from_json).
    pub fn to_json(&self) -> Result<String, CspError> {
        serde_json::to_string_pretty(&RawConfig::from_config(self))
            .map_err(|e| CspError::ConfigError(e.to_string()))
    }
}

impl Default for CspConfig {
    fn default() -> Self {
        Self::new(CspPolicy::new())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_src: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    directives: IndexMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    plugin_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sandbox: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    report_uri: Option<String>,
    #[serde(default)]
    report_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nonce_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    nonce_directives: Vec<String>,
}

impl RawConfig {
    fn into_config(self) -> Result<CspConfig, CspError> {
        let mut policy = match &self.default_src {
            Some(expression) => CspPolicy::with_default_src(expression)?,
            None => CspPolicy::new(),
        };

        if let Some(uri) = &self.report_uri {
            policy.set_report_uri(uri, self.report_only)?;
        }
        policy.set_report_only(self.report_only);

        for (name, values) in &self.directives {
            let directive: Directive = name.parse()?;
            match directive {
                Directive::DefaultSrc => return Err(CspError::InvalidDefaultSrc),
                Directive::PluginTypes | Directive::Sandbox | Directive::ReportUri => {
                    return Err(CspError::ConfigError(format!(
                        "'{}' has its own configuration key",
                        directive
                    )))
                }
                _ => {}
            }
            // A listed value set is the directive's complete value, so
            // 'self' is appended here rather than replacing earlier entries.
            for value in values {
                policy.add_token(directive, Source::parse(value)?)?;
            }
        }

        for mime in &self.plugin_types {
            policy.set_plugin_types(mime)?;
        }

        if let Some(flags) = &self.sandbox {
            policy.enable_sandbox();
            for flag in flags {
                policy.set_sandbox(flag)?;
            }
        }

        let mut builder = CspConfigBuilder::new().policy(policy);
        if self.nonce_length.is_some() || !self.nonce_directives.is_empty() {
            builder = builder.with_nonce_generator(self.nonce_length.unwrap_or(DEFAULT_NONCE_LENGTH));
        }
        for name in &self.nonce_directives {
            builder = builder.with_nonce_directive(name.parse()?);
        }
        builder.build()
    }

    fn from_config(config: &CspConfig) -> Self {
        let policy = config.policy();
        let mut directives = IndexMap::new();
        for directive in Directive::SOURCE_LISTS {
            if directive == Directive::DefaultSrc {
                continue;
            }
            if let Some(set) = policy.sources(directive).filter(|set| !set.is_empty()) {
                directives.insert(
                    directive.name().to_owned(),
                    set.into_iter().map(Source::to_string).collect(),
                );
            }
        }

        Self {
            default_src: Some(policy.default_src().to_string()),
            directives,
            plugin_types: if policy.has_explicit_plugin_types() {
                policy.plugin_types().iter().map(|t| t.to_string()).collect()
            } else {
                Vec::new()
            },
            sandbox: policy
                .sandbox()
                .map(|flags| flags.iter().map(|f| f.to_string()).collect()),
            report_uri: policy.report_uri().map(str::to_owned),
            report_only: policy.is_report_only(),
            nonce_length: config.nonce_length(),
            nonce_directives: config
                .nonce_directives()
                .iter()
                .map(|d| d.name().to_owned())
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CspConfigBuilder {
    policy: Option<CspPolicy>,
    nonce_length: Option<usize>,
    nonce_directives: SmallVec<[Directive; 2]>,
}

impl CspConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn policy(mut self, policy: CspPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Enables a fresh nonce per request. Lengths below 16 bytes are raised
    /// to 16.
    #[inline]
    pub fn with_nonce_generator(mut self, length: usize) -> Self {
        self.nonce_length = Some(length);
        self
    }

    #[inline]
    pub fn with_nonce_directive(mut self, directive: Directive) -> Self {
        if !self.nonce_directives.contains(&directive) {
            self.nonce_directives.push(directive);
        }
        self
    }

    /// Fails if a nonce directive can not carry a nonce. Nonces default to
    /// `script-src` when none is named.
    pub fn build(self) -> Result<CspConfig, CspError> {
        let mut config = CspConfig::new(self.policy.unwrap_or_default());

        if let Some(directive) = self.nonce_directives.iter().find(|d| !d.allows_inline()) {
            return Err(CspError::invalid_value(directive.name(), "nonce"));
        }

        if let Some(length) = self.nonce_length {
            config.nonce_generator = Some(NonceGenerator::new(length));
            config.nonce_directives = if self.nonce_directives.is_empty() {
                SmallVec::from_slice(&[Directive::ScriptSrc])
            } else {
                self.nonce_directives
            };
        } else if !self.nonce_directives.is_empty() {
            config.nonce_generator = Some(NonceGenerator::default());
            config.nonce_directives = self.nonce_directives;
        }

        Ok(config)
    }
}
