use std::borrow::Cow;

use regex::bytes::Regex;

use crate::YincError;
use crate::YincResult;

/// Which of the two configured tags fired on a directive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
	/// Nests the included document below an optional label line.
	Include,
	/// Splices the included document in place.
	Replace,
}

/// The pieces of a single directive line.
///
/// Borrows from the line that was matched, so it only lives as long as the
/// read buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'l> {
	/// Leading whitespace of the line.
	pub indent: &'l [u8],
	/// Token immediately before the tag, e.g. `items:` or `-`.
	pub label: Option<&'l [u8]>,
	pub tag: TagKind,
	/// Everything after the tag and its separating whitespace.
	pub spec: Cow<'l, str>,
}

impl Directive<'_> {
	/// `- !include foo.yaml` continues a list item on the dash's row.
	pub fn is_dash_label(&self) -> bool {
		self.label == Some(b"-".as_slice())
	}

	/// Whether a standalone label line is written before the included
	/// content. Only labelled include directives produce one.
	pub fn writes_label(&self) -> bool {
		self.tag == TagKind::Include && self.label.is_some()
	}
}

/// Classifies raw lines as directives or literal text.
///
/// The pattern is compiled once from the two tags:
///
/// ```text
/// INDENT (LABEL SPACE+)? TAG SPACE+ SPEC
/// ```
///
/// anchored to the whole line. `LABEL` never contains whitespace or `#`, so
/// commented lines are always literal.
#[derive(Debug, Clone)]
pub struct DirectiveMatcher {
	pattern: Regex,
	include_tag: String,
}

impl DirectiveMatcher {
	pub fn new(include_tag: &str, replace_tag: &str) -> YincResult<Self> {
		if include_tag.is_empty() || replace_tag.is_empty() {
			return Err(YincError::InvalidDirective {
				reason: "tags must not be empty".to_string(),
			});
		}

		let source = format!(
			r"(?-u)^(?P<indent>[\t\n\f\r ]*)((?P<text>[^\t\n\f\r #]+)[\t\n\f\r ]+)?(?P<tag>{}|{})[\t\n\f\r ]+(?P<spec>.+)$",
			regex::escape(include_tag),
			regex::escape(replace_tag),
		);
		let pattern = Regex::new(&source).map_err(|e| {
			YincError::InvalidDirective {
				reason: e.to_string(),
			}
		})?;

		Ok(Self {
			pattern,
			include_tag: include_tag.to_string(),
		})
	}

	/// Match a single line (without its line terminator). Returns `None` for
	/// literal lines.
	pub fn matches<'l>(&self, line: &'l [u8]) -> Option<Directive<'l>> {
		let captures = self.pattern.captures(line)?;
		let indent = captures.name("indent").map_or(&[][..], |m| m.as_bytes());
		let label = captures.name("text").map(|m| m.as_bytes());
		let tag = captures.name("tag")?.as_bytes();
		let spec = captures.name("spec")?.as_bytes();

		let tag = if tag == self.include_tag.as_bytes() {
			TagKind::Include
		} else {
			TagKind::Replace
		};

		Some(Directive {
			indent,
			label,
			tag,
			spec: String::from_utf8_lossy(spec),
		})
	}
}
