use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::Directive;
use crate::DirectiveMatcher;
use crate::ExpandOptions;
use crate::Source;
use crate::SourceKind;
use crate::SourceResolver;
use crate::YincError;
use crate::YincResult;
use crate::config::DOCUMENT_SEPARATOR;
use crate::source::READ_BUFFER_SIZE;

/// Indent-aware writer for one stream.
///
/// Every stream of an inclusion tree writes to the same underlying sink.
/// Each stream wraps it in its own `LineSink`, which counts the bytes that
/// stream has written so the first line can use a different prefix.
pub struct LineSink<'a> {
	inner: &'a mut dyn Write,
	indent: &'a [u8],
	first_indent: Option<&'a [u8]>,
	written: u64,
}

impl<'a> LineSink<'a> {
	pub fn new(inner: &'a mut dyn Write, indent: &'a [u8], first_indent: Option<&'a [u8]>) -> Self {
		Self {
			inner,
			indent,
			first_indent,
			written: 0,
		}
	}

	/// Bytes this stream has written so far.
	pub fn written(&self) -> u64 {
		self.written
	}

	/// Write the stream's prefix followed by `parts`.
	pub fn write_indented(&mut self, parts: &[&[u8]]) -> std::io::Result<()> {
		let prefix = match self.first_indent {
			Some(first) if self.written == 0 => first,
			_ => self.indent,
		};
		self.write_raw(prefix)?;
		for part in parts {
			self.write_raw(part)?;
		}

		Ok(())
	}

	/// Write bytes without a prefix.
	pub fn write_raw(&mut self, data: &[u8]) -> std::io::Result<()> {
		self.inner.write_all(data)?;
		self.written += data.len() as u64;
		Ok(())
	}

	/// The shared sink, for handing to child streams.
	pub fn shared(&mut self) -> &mut dyn Write {
		&mut *self.inner
	}
}

/// One document being expanded: a root input or an included file.
///
/// `parent` borrows the stream that included this one and is only walked to
/// detect cycles. A stream lives on the call stack for exactly as long as
/// its [`process`](Stream::process) call.
#[derive(Debug)]
pub struct Stream<'p> {
	spec: String,
	indent: Vec<u8>,
	first_indent: Option<Vec<u8>>,
	base_dir: PathBuf,
	parent: Option<&'p Stream<'p>>,
}

impl Stream<'static> {
	/// A top-level stream resolved against the working directory.
	pub fn root(spec: impl Into<String>) -> Self {
		Self::root_in(spec, PathBuf::new())
	}

	/// A top-level stream whose relative spec resolves against `base_dir`.
	pub fn root_in(spec: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
		Self {
			spec: spec.into(),
			indent: Vec::new(),
			first_indent: None,
			base_dir: base_dir.into(),
			parent: None,
		}
	}
}

impl<'p> Stream<'p> {
	pub fn spec(&self) -> &str {
		&self.spec
	}

	pub fn indent(&self) -> &[u8] {
		&self.indent
	}

	pub fn first_indent(&self) -> Option<&[u8]> {
		self.first_indent.as_deref()
	}

	pub fn base_dir(&self) -> &Path {
		&self.base_dir
	}

	pub fn parent(&self) -> Option<&Stream<'p>> {
		self.parent
	}

	/// This stream followed by every ancestor up to the root.
	pub fn ancestry(&self) -> impl Iterator<Item = &Stream<'p>> {
		std::iter::successors(Some(self), |stream| stream.parent)
	}

	/// Create a stream for `spec` included by this one.
	///
	/// Fails with [`YincError::CyclicInclude`] when `spec` is already open in
	/// this chain. Specs are compared as written, so two different relative
	/// paths to the same file are not recognised as the same. The two
	/// spellings of standard input (`""` and `-`) always match each other.
	pub fn child(
		&self,
		spec: impl Into<String>,
		indent: Vec<u8>,
		first_indent: Option<Vec<u8>>,
		base_dir: impl Into<PathBuf>,
	) -> YincResult<Stream<'_>> {
		let spec = spec.into();
		if self.ancestry().any(|ancestor| same_source(&ancestor.spec, &spec)) {
			let mut chain: Vec<&str> = self.ancestry().map(Stream::spec).collect();
			chain.reverse();
			chain.push(&spec);

			return Err(YincError::CyclicInclude {
				chain: chain.join(" -> "),
				spec,
			});
		}

		Ok(Stream {
			spec,
			indent,
			first_indent,
			base_dir: base_dir.into(),
			parent: Some(self),
		})
	}

	/// Expand this stream into `sink`.
	///
	/// Consumes the stream, so its source is opened exactly once. The source
	/// reader is dropped when this returns, on success or error.
	pub fn process(self, expander: &Expander, sink: &mut dyn Write) -> YincResult<()> {
		let kind = SourceKind::classify(&self.spec, expander.options.json_paren_fallback);
		let Source { mut reader, dir } = expander.resolver.open(&kind, &self.base_dir)?;
		let include_dir = dir.unwrap_or_else(|| self.base_dir.clone());

		let mut out = LineSink::new(sink, &self.indent, self.first_indent.as_deref());
		let mut line = Vec::with_capacity(READ_BUFFER_SIZE);

		loop {
			line.clear();
			if reader.read_until(b'\n', &mut line)? == 0 {
				break;
			}

			let content = trim_line_ending(&line);
			match expander.matcher.matches(content) {
				Some(directive) => {
					self.expand_directive(expander, &directive, &include_dir, &mut out)?;
				}
				None => out.write_indented(&[content, b"\n"])?,
			}
		}

		Ok(())
	}

	fn expand_directive(
		&self,
		expander: &Expander,
		directive: &Directive<'_>,
		include_dir: &Path,
		out: &mut LineSink<'_>,
	) -> YincResult<()> {
		let mut child_indent = self.indent.clone();
		child_indent.extend_from_slice(directive.indent);

		let targets = expander.targets(&directive.spec, include_dir)?;
		if targets.is_empty() {
			tracing::warn!(
				spec = %directive.spec,
				stream = %self.spec,
				"directive matched no files"
			);
		}
		tracing::debug!(
			spec = %directive.spec,
			targets = targets.len(),
			tag = ?directive.tag,
			"expanding directive"
		);

		for target in targets {
			let mut indent = child_indent.clone();
			let mut first_indent = None;
			if directive.writes_label() {
				indent.resize(indent.len() + expander.options.indent_width, b' ');
				if directive.is_dash_label() {
					first_indent = Some(b" ".to_vec());
				}
			}

			let child = self.child(target, indent, first_indent, include_dir)?;
			tracing::trace!(spec = child.spec(), "including");

			if let Some(label) = directive.label.filter(|_| directive.writes_label()) {
				out.write_indented(&[directive.indent, label])?;
				if !directive.is_dash_label() {
					out.write_raw(b"\n")?;
				}
			}

			child.process(expander, out.shared())?;
		}

		Ok(())
	}
}

/// Whether two specs open the same source for the cycle guard.
fn same_source(a: &str, b: &str) -> bool {
	a == b || (is_stdin_spec(a) && is_stdin_spec(b))
}

fn is_stdin_spec(spec: &str) -> bool {
	spec.is_empty() || spec == "-"
}

/// Strip `\n` or `\r\n` from the end of a line.
fn trim_line_ending(line: &[u8]) -> &[u8] {
	let line = line.strip_suffix(b"\n").unwrap_or(line);
	line.strip_suffix(b"\r").unwrap_or(line)
}

/// Drives the expansion of root documents.
///
/// Built once per run: the directive pattern is compiled and the HTTP agent
/// created here, then shared by every stream.
#[derive(Debug, Clone)]
pub struct Expander {
	options: ExpandOptions,
	matcher: DirectiveMatcher,
	resolver: SourceResolver,
}

impl Expander {
	pub fn new(options: ExpandOptions) -> YincResult<Self> {
		options.validate()?;
		let matcher = DirectiveMatcher::new(&options.include_tag, &options.replace_tag)?;
		let resolver = SourceResolver::new(&options);

		Ok(Self {
			options,
			matcher,
			resolver,
		})
	}

	pub fn options(&self) -> &ExpandOptions {
		&self.options
	}

	pub fn matcher(&self) -> &DirectiveMatcher {
		&self.matcher
	}

	/// Expand one root document, resolving relative paths against the
	/// working directory.
	pub fn expand(&self, spec: &str, sink: &mut dyn Write) -> YincResult<()> {
		Stream::root(spec).process(self, sink)
	}

	/// Expand one root document, resolving relative paths against
	/// `base_dir`.
	pub fn expand_in(&self, spec: &str, base_dir: &Path, sink: &mut dyn Write) -> YincResult<()> {
		Stream::root_in(spec, base_dir).process(self, sink)
	}

	/// Expand every root document in order into the same sink. No specs means
	/// standard input. With `multi_documents`, a `---` line separates the
	/// documents.
	pub fn expand_all<S: AsRef<str>>(&self, specs: &[S], sink: &mut dyn Write) -> YincResult<()> {
		self.expand_all_in(specs, Path::new(""), sink)
	}

	/// [`expand_all`](Self::expand_all) with relative paths resolved against
	/// `base_dir`.
	pub fn expand_all_in<S: AsRef<str>>(
		&self,
		specs: &[S],
		base_dir: &Path,
		sink: &mut dyn Write,
	) -> YincResult<()> {
		if specs.is_empty() {
			return self.expand_in("-", base_dir, sink);
		}

		for (index, spec) in specs.iter().enumerate() {
			if self.options.multi_documents && index > 0 {
				sink.write_all(DOCUMENT_SEPARATOR.as_bytes())?;
			}
			self.expand_in(spec.as_ref(), base_dir, sink)?;
		}

		Ok(())
	}

	/// Expand one root document into a string. Invalid UTF-8 is replaced.
	pub fn expand_to_string(&self, spec: &str, base_dir: &Path) -> YincResult<String> {
		let mut output: Vec<u8> = Vec::new();
		self.expand_in(spec, base_dir, &mut output)?;
		Ok(String::from_utf8_lossy(&output).into_owned())
	}

	/// The specs a directive argument refers to, relative to `base_dir`.
	///
	/// Plain paths are glob patterns and may match any number of files, in
	/// the glob walker's sorted order. Every other source kind refers to
	/// exactly one source and is returned unchanged.
	pub fn targets(&self, spec: &str, base_dir: &Path) -> YincResult<Vec<String>> {
		if SourceKind::classify(spec, self.options.json_paren_fallback).is_file() {
			expand_glob(spec, base_dir)
		} else {
			Ok(vec![spec.to_string()])
		}
	}
}

/// Expand `pattern` against `base_dir` into file paths relative to
/// `base_dir`. Directories are skipped.
pub fn expand_glob(pattern: &str, base_dir: &Path) -> YincResult<Vec<String>> {
	let full_pattern = if base_dir.as_os_str().is_empty() || Path::new(pattern).is_absolute() {
		pattern.to_string()
	} else {
		format!(
			"{}/{pattern}",
			glob::Pattern::escape(&base_dir.to_string_lossy())
		)
	};

	let paths = glob::glob(&full_pattern).map_err(|e| {
		YincError::InvalidGlob {
			pattern: pattern.to_string(),
			reason: e.to_string(),
		}
	})?;

	let mut matches = Vec::new();
	for entry in paths {
		let path = entry.map_err(|e| {
			YincError::OpenSource {
				spec: e.path().display().to_string(),
				reason: e.error().to_string(),
			}
		})?;
		if path.is_dir() {
			continue;
		}

		let relative = path.strip_prefix(base_dir).unwrap_or(&path);
		matches.push(relative.to_string_lossy().into_owned());
	}

	Ok(matches)
}
