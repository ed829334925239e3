use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

use ureq::Agent;

use crate::ExpandOptions;
use crate::YincError;
use crate::YincResult;

/// Read buffer size hint. Lines longer than this are still read whole.
pub const READ_BUFFER_SIZE: usize = 4096;

const SHELL_PREFIX: &str = "$(shell ";
const JSON_PREFIX: &str = "$(json ";
const WRAPPER_SUFFIX: &str = ")";

/// What a spec string refers to.
///
/// Classification follows a fixed priority: standard input, shell output,
/// JSON file, URL, and finally a plain path (which may be a glob pattern when
/// it appears in a directive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
	/// Empty spec or `-`.
	Stdin,
	/// `$(shell <command>)`.
	Shell(String),
	/// `$(json <path>)`.
	Json(PathBuf),
	/// `http://...` or `https://...`.
	Http(String),
	/// Anything else.
	File(PathBuf),
}

impl SourceKind {
	/// Classify a spec. With `json_paren_fallback`, any spec ending in `)`
	/// that is not a shell source is read as JSON.
	pub fn classify(spec: &str, json_paren_fallback: bool) -> Self {
		if spec.is_empty() || spec == "-" {
			return Self::Stdin;
		}

		if let Some(command) = spec
			.strip_prefix(SHELL_PREFIX)
			.and_then(|rest| rest.strip_suffix(WRAPPER_SUFFIX))
		{
			return Self::Shell(command.to_string());
		}

		if spec.starts_with(JSON_PREFIX) || (json_paren_fallback && spec.ends_with(WRAPPER_SUFFIX)) {
			let path = spec.strip_prefix(JSON_PREFIX).unwrap_or(spec);
			let path = path.strip_suffix(WRAPPER_SUFFIX).unwrap_or(path);
			return Self::Json(PathBuf::from(path));
		}

		if spec.starts_with("http://") || spec.starts_with("https://") {
			return Self::Http(spec.to_string());
		}

		Self::File(PathBuf::from(spec))
	}

	/// Only plain paths are glob-expanded inside directives.
	pub fn is_file(&self) -> bool {
		matches!(self, Self::File(_))
	}
}

/// An opened source.
pub struct Source {
	/// Line reader over the content. Dropping it closes the file or HTTP
	/// body.
	pub reader: Box<dyn BufRead>,
	/// Directory that relative specs inside this source resolve against.
	/// `None` keeps the including stream's directory.
	pub dir: Option<PathBuf>,
}

impl std::fmt::Debug for Source {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Source")
			.field("dir", &self.dir)
			.finish_non_exhaustive()
	}
}

/// Opens sources for streams. Holds the HTTP agent so connections are shared
/// across a whole run.
#[derive(Debug, Clone)]
pub struct SourceResolver {
	agent: Agent,
	shell: Option<String>,
}

impl SourceResolver {
	pub fn new(options: &ExpandOptions) -> Self {
		let agent = Agent::config_builder()
			.timeout_global(options.http_timeout)
			.build()
			.into();

		Self {
			agent,
			shell: options.shell.clone(),
		}
	}

	/// Open `kind`, resolving relative paths against `base_dir`.
	pub fn open(&self, kind: &SourceKind, base_dir: &Path) -> YincResult<Source> {
		match kind {
			SourceKind::Stdin => {
				tracing::debug!("reading standard input");
				Ok(Source {
					reader: Box::new(std::io::stdin().lock()),
					dir: None,
				})
			}
			SourceKind::Shell(command) => {
				tracing::debug!(command = %command, "running shell source");
				let output = self.run_shell(command, base_dir)?;
				Ok(Source {
					reader: Box::new(Cursor::new(output)),
					dir: None,
				})
			}
			SourceKind::Json(path) => {
				let path = resolve_path(base_dir, path);
				tracing::debug!(path = %path.display(), "converting json source");
				let bytes = std::fs::read(&path).map_err(|e| {
					YincError::OpenSource {
						spec: path.display().to_string(),
						reason: e.to_string(),
					}
				})?;
				let yaml = json_to_yaml(&bytes).map_err(|reason| {
					YincError::InvalidJson {
						path: path.display().to_string(),
						reason,
					}
				})?;
				Ok(Source {
					reader: Box::new(Cursor::new(yaml.into_bytes())),
					dir: Some(parent_dir(&path)),
				})
			}
			SourceKind::Http(url) => {
				tracing::debug!(url = %url, "fetching url source");
				let response = self.agent.get(url).call().map_err(|e| {
					match e {
						ureq::Error::StatusCode(status) => {
							YincError::HttpStatus {
								url: url.clone(),
								status,
							}
						}
						other => {
							YincError::Http {
								url: url.clone(),
								reason: other.to_string(),
							}
						}
					}
				})?;
				let body = response.into_body().into_reader();
				Ok(Source {
					reader: Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, body)),
					dir: None,
				})
			}
			SourceKind::File(path) => {
				let path = resolve_path(base_dir, path);
				tracing::debug!(path = %path.display(), "opening file source");
				let file = File::open(&path).map_err(|e| {
					YincError::OpenSource {
						spec: path.display().to_string(),
						reason: e.to_string(),
					}
				})?;
				Ok(Source {
					reader: Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)),
					dir: Some(parent_dir(&path)),
				})
			}
		}
	}

	fn run_shell(&self, command: &str, base_dir: &Path) -> YincResult<Vec<u8>> {
		let mut process = match self.shell.as_deref() {
			Some(program) => {
				let mut process = Command::new(program);
				process.arg("-c");
				process
			}
			None if cfg!(windows) => {
				let mut process = Command::new("cmd");
				process.arg("/C");
				process
			}
			None => {
				let mut process = Command::new("sh");
				process.arg("-c");
				process
			}
		};
		process.arg(command).stdin(Stdio::null());
		if !base_dir.as_os_str().is_empty() {
			process.current_dir(base_dir);
		}

		let output = process.output().map_err(|e| {
			YincError::ShellFailed {
				command: command.to_string(),
				reason: e.to_string(),
			}
		})?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
			let reason = if stderr.is_empty() {
				format!(
					"command exited with status {}",
					output
						.status
						.code()
						.map_or_else(|| "unknown".to_string(), |code| code.to_string())
				)
			} else {
				stderr
			};

			return Err(YincError::ShellFailed {
				command: command.to_string(),
				reason,
			});
		}

		Ok(output.stdout)
	}
}

/// Convert a JSON document to equivalent YAML text. Object keys come out
/// sorted.
pub fn json_to_yaml(json: &[u8]) -> Result<String, String> {
	let value: serde_json::Value = serde_json::from_slice(json).map_err(|e| e.to_string())?;
	serde_yaml_ng::to_string(&value).map_err(|e| e.to_string())
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
	if base_dir.as_os_str().is_empty() {
		path.to_path_buf()
	} else {
		base_dir.join(path)
	}
}

fn parent_dir(path: &Path) -> PathBuf {
	path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Scoped change of the process working directory.
///
/// Streams carry their own directory and never change it. This guard is
/// for callers that need a process-wide scope around a whole run. Guards must
/// be released in reverse order of creation.
#[derive(Debug)]
pub struct DirectoryGuard {
	origin: Option<PathBuf>,
}

impl DirectoryGuard {
	/// Record the current directory and change into `dir`.
	pub fn enter(dir: &Path) -> YincResult<Self> {
		let origin = std::env::current_dir().map_err(|e| {
			YincError::WorkingDirectory {
				path: ".".to_string(),
				reason: e.to_string(),
			}
		})?;
		std::env::set_current_dir(dir).map_err(|e| {
			YincError::WorkingDirectory {
				path: dir.display().to_string(),
				reason: e.to_string(),
			}
		})?;
		tracing::debug!(from = %origin.display(), to = %dir.display(), "entered directory");

		Ok(Self {
			origin: Some(origin),
		})
	}

	/// The directory that will be restored.
	pub fn origin(&self) -> Option<&Path> {
		self.origin.as_deref()
	}

	/// Change back to the recorded directory.
	pub fn restore(mut self) -> YincResult<()> {
		self.restore_origin()
	}

	fn restore_origin(&mut self) -> YincResult<()> {
		let Some(origin) = self.origin.take() else {
			return Ok(());
		};

		std::env::set_current_dir(&origin).map_err(|e| {
			YincError::WorkingDirectory {
				path: origin.display().to_string(),
				reason: e.to_string(),
			}
		})
	}
}

impl Drop for DirectoryGuard {
	fn drop(&mut self) {
		if let Err(error) = self.restore_origin() {
			tracing::error!(%error, "failed to restore working directory");
		}
	}
}
