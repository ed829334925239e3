use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn yinc_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("yinc"));
	cmd.env("NO_COLOR", "1").env_remove("YINC_LOG");
	cmd
}

/// Write `files` below `root`, creating parent directories.
pub fn write_tree(root: &std::path::Path, files: &[(&str, &str)]) -> std::io::Result<()> {
	for (name, content) in files {
		let path = root.join(name);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}

	Ok(())
}
