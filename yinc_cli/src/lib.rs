use std::path::PathBuf;

use clap::Parser;
use yinc_core::ExpandOptions;

#[derive(Parser)]
#[command(
	name = "yinc",
	author,
	version,
	about = "Expand !include and !replace directives in YAML-style documents.",
	long_about = "yinc reads one or more documents line by line and replaces directive lines \
	              with the content they refer to, indented to match the directive.\n\nDirective \
	              forms:\n  key: !include file.yaml     nest the file below `key:`\n  - \
	              !include item-*.yaml       one list item per matched file\n  !replace \
	              file.yaml           splice the file in place\n\nTargets can be files or glob \
	              patterns, `-` for standard input, `$(shell <command>)`, `$(json <file>)` or an \
	              http(s) URL. With no FILES, standard input is read."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct YincCli {
	/// Documents to expand. Defaults to standard input.
	#[arg(value_name = "FILES")]
	pub files: Vec<String>,

	/// Spaces added below a labelled include.
	#[arg(long, short = 'w')]
	pub indent_width: Option<usize>,

	/// Write a `---` line between the expanded documents.
	#[arg(long, short = 'm', default_value_t = false)]
	pub output_multi_documents: bool,

	/// Tag that nests the included document below its label.
	#[arg(long)]
	pub include_tag: Option<String>,

	/// Tag that splices the included document in place.
	#[arg(long)]
	pub replace_tag: Option<String>,

	/// Read any target ending in `)` as a JSON file, even without the
	/// `$(json ` prefix.
	#[arg(long, default_value_t = false)]
	pub json_paren_fallback: bool,

	/// Read settings from this file instead of discovering `yinc.toml`.
	#[arg(long, conflicts_with = "no_config")]
	pub config: Option<PathBuf>,

	/// Ignore any `yinc.toml` file.
	#[arg(long, default_value_t = false)]
	pub no_config: bool,

	/// Run as if started in this directory.
	#[arg(long = "directory", short = 'C', value_name = "DIR")]
	pub directory: Option<PathBuf>,

	/// Log resolved sources and directive expansion to stderr.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

impl YincCli {
	/// Layer the command line flags over `options`.
	pub fn apply(&self, options: &mut ExpandOptions) {
		if let Some(width) = self.indent_width {
			options.indent_width = width;
		}
		if self.output_multi_documents {
			options.multi_documents = true;
		}
		if let Some(tag) = &self.include_tag {
			options.include_tag.clone_from(tag);
		}
		if let Some(tag) = &self.replace_tag {
			options.replace_tag.clone_from(tag);
		}
		if self.json_paren_fallback {
			options.json_paren_fallback = true;
		}
	}
}
