use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::YincError;
use crate::YincResult;

/// Default number of spaces added below a labelled include.
pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Largest accepted indent width.
pub const MAX_INDENT_WIDTH: usize = 64;

/// Default include directive tag.
pub const DEFAULT_INCLUDE_TAG: &str = "!include";

/// Default replace directive tag.
pub const DEFAULT_REPLACE_TAG: &str = "!replace";

/// Default HTTP timeout in seconds for URL sources.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Line written between root documents when multiple documents are output.
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["yinc.toml", ".yinc.toml", ".config/yinc.toml"];

/// Resolved settings for one expansion run.
///
/// Built from the defaults, then layered with an optional [`YincConfig`] and
/// finally with command line flags. The options are immutable once an
/// [`Expander`](crate::Expander) has been created from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandOptions {
	/// Spaces added to the indentation of content pulled in by a labelled
	/// include.
	pub indent_width: usize,
	/// Tag that nests the included content below its label.
	pub include_tag: String,
	/// Tag that splices content in place without a label line.
	pub replace_tag: String,
	/// Write a `---` separator line between root documents.
	pub multi_documents: bool,
	/// Treat any spec ending in `)` as a JSON source, even without the
	/// `$(json ` prefix.
	pub json_paren_fallback: bool,
	/// Global timeout for URL sources. `None` waits forever.
	pub http_timeout: Option<Duration>,
	/// Shell program used for `$(shell ...)` sources. Defaults to `sh` (or
	/// `cmd` on Windows).
	pub shell: Option<String>,
}

impl Default for ExpandOptions {
	fn default() -> Self {
		Self {
			indent_width: DEFAULT_INDENT_WIDTH,
			include_tag: DEFAULT_INCLUDE_TAG.to_string(),
			replace_tag: DEFAULT_REPLACE_TAG.to_string(),
			multi_documents: false,
			json_paren_fallback: false,
			http_timeout: Some(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)),
			shell: None,
		}
	}
}

impl ExpandOptions {
	/// Check the invariants the engine relies on.
	pub fn validate(&self) -> YincResult<()> {
		if self.indent_width > MAX_INDENT_WIDTH {
			return Err(YincError::InvalidIndentWidth(self.indent_width));
		}

		if self.include_tag.trim().is_empty() || self.replace_tag.trim().is_empty() {
			return Err(YincError::InvalidDirective {
				reason: "tags must not be empty".to_string(),
			});
		}

		if self.include_tag.chars().any(char::is_whitespace)
			|| self.replace_tag.chars().any(char::is_whitespace)
		{
			return Err(YincError::InvalidDirective {
				reason: "tags must not contain whitespace".to_string(),
			});
		}

		if self.include_tag == self.replace_tag {
			return Err(YincError::InvalidDirective {
				reason: format!("both tags are `{}`", self.include_tag),
			});
		}

		Ok(())
	}
}

/// Configuration loaded from a `yinc.toml` file.
///
/// ```toml
/// indent_width = 4
/// multi_documents = true
/// include_tag = "!inc"
/// replace_tag = "!rep"
/// json_paren_fallback = false
///
/// [http]
/// timeout_secs = 10
///
/// [shell]
/// program = "bash"
/// ```
///
/// Every field is optional. Missing fields keep the built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YincConfig {
	#[serde(default)]
	pub indent_width: Option<usize>,
	#[serde(default)]
	pub multi_documents: Option<bool>,
	#[serde(default)]
	pub include_tag: Option<String>,
	#[serde(default)]
	pub replace_tag: Option<String>,
	#[serde(default)]
	pub json_paren_fallback: Option<bool>,
	/// Settings for `http://` and `https://` sources.
	#[serde(default)]
	pub http: HttpConfig,
	/// Settings for `$(shell ...)` sources.
	#[serde(default)]
	pub shell: ShellConfig,
}

/// `[http]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
	/// Global request timeout in seconds. `0` disables the timeout.
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

/// `[shell]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellConfig {
	/// Program invoked as `<program> -c <command>`.
	#[serde(default)]
	pub program: Option<String>,
}

impl YincConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no candidate exists.
	pub fn load(root: &Path) -> YincResult<Option<YincConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&config_path).map(Some)
	}

	/// Load the config from an explicit path.
	pub fn load_from(path: &Path) -> YincResult<YincConfig> {
		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content).map_err(|e| YincError::ConfigParse(e.to_string()))
	}

	/// Layer the values present in this file over the defaults.
	pub fn into_options(self) -> ExpandOptions {
		let mut options = ExpandOptions::default();
		self.apply(&mut options);
		options
	}

	/// Overwrite the fields of `options` that this file sets.
	pub fn apply(self, options: &mut ExpandOptions) {
		if let Some(width) = self.indent_width {
			options.indent_width = width;
		}
		if let Some(multi) = self.multi_documents {
			options.multi_documents = multi;
		}
		if let Some(tag) = self.include_tag {
			options.include_tag = tag;
		}
		if let Some(tag) = self.replace_tag {
			options.replace_tag = tag;
		}
		if let Some(fallback) = self.json_paren_fallback {
			options.json_paren_fallback = fallback;
		}
		if let Some(secs) = self.http.timeout_secs {
			options.http_timeout = (secs > 0).then_some(Duration::from_secs(secs));
		}
		if let Some(program) = self.shell.program {
			options.shell = Some(program);
		}
	}
}
