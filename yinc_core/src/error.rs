use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum YincError {
	#[error(transparent)]
	#[diagnostic(code(yinc::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to open source `{spec}`: {reason}")]
	#[diagnostic(code(yinc::open_source))]
	OpenSource { spec: String, reason: String },

	#[error("failed to fetch `{url}`: {reason}")]
	#[diagnostic(code(yinc::http))]
	Http { url: String, reason: String },

	#[error("fetching `{url}` returned HTTP {status}")]
	#[diagnostic(code(yinc::http_status))]
	HttpStatus { url: String, status: u16 },

	#[error("shell command `{command}` failed: {reason}")]
	#[diagnostic(code(yinc::shell_failed))]
	ShellFailed { command: String, reason: String },

	#[error("failed to convert JSON file `{path}`: {reason}")]
	#[diagnostic(code(yinc::invalid_json))]
	InvalidJson { path: String, reason: String },

	#[error("invalid glob pattern `{pattern}`: {reason}")]
	#[diagnostic(
		code(yinc::invalid_glob),
		help("escape literal `[`, `]`, `*` and `?` characters with `[[]`, `[]]`, `[*]` and `[?]`")
	)]
	InvalidGlob { pattern: String, reason: String },

	#[error("invalid directive tags: {reason}")]
	#[diagnostic(
		code(yinc::invalid_directive),
		help("the include and replace tags must be non-empty and different from each other")
	)]
	InvalidDirective { reason: String },

	#[error("cyclic include detected: `{spec}` is already being processed")]
	#[diagnostic(
		code(yinc::cyclic_include),
		help("include chain: {chain}")
	)]
	CyclicInclude { spec: String, chain: String },

	#[error("unable to change working directory to `{path}`: {reason}")]
	#[diagnostic(code(yinc::working_directory))]
	WorkingDirectory { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(yinc::config_parse),
		help("check that yinc.toml is valid TOML with top-level settings and optional [http] / [shell] sections")
	)]
	ConfigParse(String),

	#[error("indent width {0} is out of range")]
	#[diagnostic(
		code(yinc::invalid_indent_width),
		help("choose an indent width between 0 and 64")
	)]
	InvalidIndentWidth(usize),
}

pub type YincResult<T> = Result<T, YincError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
