mod common;

use common::write_tree;
use yinc_core::AnyEmptyResult;

const MAIN: &str = "name: app\ndata: !include child.yaml\nitems:\n  - !include item.yaml\n";
const CHILD: &str = "a: 1\nb: 2\n";
const ITEM: &str = "x: 1\ny: 2\n";

fn project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[
			("main.yaml", MAIN),
			("child.yaml", CHILD),
			("item.yaml", ITEM),
		],
	)?;
	Ok(tmp)
}

#[test]
fn expands_labelled_and_dash_includes() -> AnyEmptyResult {
	let tmp = project()?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("main.yaml")
		.assert()
		.success()
		.stdout("name: app\ndata:\n  a: 1\n  b: 2\nitems:\n  - x: 1\n    y: 2\n");

	Ok(())
}

#[test]
fn reads_standard_input_without_files() -> AnyEmptyResult {
	let tmp = project()?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.write_stdin("top: !include child.yaml\n")
		.assert()
		.success()
		.stdout("top:\n  a: 1\n  b: 2\n");

	Ok(())
}

#[test]
fn reads_standard_input_from_dash() -> AnyEmptyResult {
	let tmp = project()?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("-")
		.write_stdin("  !replace child.yaml\n")
		.assert()
		.success()
		.stdout("  a: 1\n  b: 2\n");

	Ok(())
}

#[test]
fn separates_documents_with_multi_document_flag() -> AnyEmptyResult {
	let tmp = project()?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.args(["-m", "child.yaml", "item.yaml"])
		.assert()
		.success()
		.stdout("a: 1\nb: 2\n---\nx: 1\ny: 2\n");

	common::yinc_cmd()
		.current_dir(tmp.path())
		.args(["child.yaml", "item.yaml"])
		.assert()
		.success()
		.stdout("a: 1\nb: 2\nx: 1\ny: 2\n");

	Ok(())
}

#[test]
fn indent_width_flag_widens_nested_content() -> AnyEmptyResult {
	let tmp = project()?;
	write_tree(tmp.path(), &[("wide.yaml", "data: !include child.yaml\n")])?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.args(["-w", "4", "wide.yaml"])
		.assert()
		.success()
		.stdout("data:\n    a: 1\n    b: 2\n");

	Ok(())
}

#[test]
fn custom_tags_replace_the_defaults() -> AnyEmptyResult {
	let tmp = project()?;
	write_tree(
		tmp.path(),
		&[(
			"custom.yaml",
			"data: !inc child.yaml\nkeep: !include child.yaml\n!rep item.yaml\n",
		)],
	)?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.args(["--include-tag", "!inc", "--replace-tag", "!rep", "custom.yaml"])
		.assert()
		.success()
		.stdout("data:\n  a: 1\n  b: 2\nkeep: !include child.yaml\nx: 1\ny: 2\n");

	Ok(())
}

#[test]
fn glob_fans_out_into_list_items() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[
			("list.yaml", "items:\n  - !include parts/*.yaml\n"),
			("parts/a.yaml", "n: a\n"),
			("parts/b.yaml", "n: b\n"),
		],
	)?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("list.yaml")
		.assert()
		.success()
		.stdout("items:\n  - n: a\n  - n: b\n");

	Ok(())
}

#[test]
fn config_file_sets_defaults_and_flags_override_it() -> AnyEmptyResult {
	let tmp = project()?;
	write_tree(
		tmp.path(),
		&[
			("yinc.toml", "indent_width = 4\n"),
			("wide.yaml", "data: !include child.yaml\n"),
		],
	)?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("wide.yaml")
		.assert()
		.success()
		.stdout("data:\n    a: 1\n    b: 2\n");

	common::yinc_cmd()
		.current_dir(tmp.path())
		.args(["-w", "3", "wide.yaml"])
		.assert()
		.success()
		.stdout("data:\n   a: 1\n   b: 2\n");

	common::yinc_cmd()
		.current_dir(tmp.path())
		.args(["--no-config", "wide.yaml"])
		.assert()
		.success()
		.stdout("data:\n  a: 1\n  b: 2\n");

	Ok(())
}

#[test]
fn explicit_config_path_is_loaded() -> AnyEmptyResult {
	let tmp = project()?;
	write_tree(
		tmp.path(),
		&[
			("settings/custom.toml", "include_tag = \"!inc\"\n"),
			("tagged.yaml", "data: !inc child.yaml\n"),
		],
	)?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.args(["--config", "settings/custom.toml", "tagged.yaml"])
		.assert()
		.success()
		.stdout("data:\n  a: 1\n  b: 2\n");

	Ok(())
}

#[test]
fn invalid_config_fails() -> AnyEmptyResult {
	let tmp = project()?;
	write_tree(tmp.path(), &[("yinc.toml", "unknown_key = 1\n")])?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("main.yaml")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn directory_flag_changes_the_working_directory() -> AnyEmptyResult {
	let tmp = project()?;
	let elsewhere = tempfile::tempdir()?;

	common::yinc_cmd()
		.current_dir(elsewhere.path())
		.arg("-C")
		.arg(tmp.path())
		.arg("main.yaml")
		.assert()
		.success()
		.stdout("name: app\ndata:\n  a: 1\n  b: 2\nitems:\n  - x: 1\n    y: 2\n");

	Ok(())
}

#[test]
fn cyclic_include_fails_with_diagnostic() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[
			("a.yaml", "top: 1\nnext: !include b.yaml\n"),
			("b.yaml", "back: !include a.yaml\n"),
		],
	)?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("a.yaml")
		.assert()
		.code(2)
		.stdout("top: 1\nnext:\n")
		.stderr(predicates::str::contains("cyclic include detected"));

	Ok(())
}

#[test]
fn stdin_spellings_are_one_source_in_cycle_checks() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("")
		.write_stdin("a: !include -\n")
		.timeout(std::time::Duration::from_secs(10))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("cyclic include detected"));

	Ok(())
}

#[test]
fn missing_file_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("missing.yaml")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to open source"));

	Ok(())
}

#[test]
fn unmatched_glob_warns_and_continues() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[("main.yaml", "before: 1\nnone: !include nothing-*.yaml\nafter: 2\n")],
	)?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("main.yaml")
		.assert()
		.success()
		.stdout("before: 1\nafter: 2\n")
		.stderr(predicates::str::contains("directive matched no files"));

	Ok(())
}

#[test]
fn verbose_flag_logs_expansion() -> AnyEmptyResult {
	let tmp = project()?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.args(["--verbose", "main.yaml"])
		.assert()
		.success()
		.stderr(predicates::str::contains("expanding directive"));

	Ok(())
}

#[test]
fn json_source_is_converted() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[
			("data.json", r#"{"name": "svc"}"#),
			("main.yaml", "service: !include $(json data.json)\n"),
		],
	)?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("main.yaml")
		.assert()
		.success()
		.stdout("service:\n  name: svc\n");

	Ok(())
}

#[cfg(unix)]
#[test]
fn shell_source_output_is_included() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[("main.yaml", "value: !include $(shell printf 'k: 1\\n')\n")],
	)?;

	common::yinc_cmd()
		.current_dir(tmp.path())
		.arg("main.yaml")
		.assert()
		.success()
		.stdout("value:\n  k: 1\n");

	Ok(())
}

#[test]
fn prints_version() {
	common::yinc_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));
}
