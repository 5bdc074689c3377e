mod common;

use resfilter_core::AnyEmptyResult;

const CONFIG: &str = "output_directory = \"out\"\nencoding = \"UTF-8\"\n\n[[resources]]\ndirectory = \
                      \"res\"\n";

fn write_resources(root: &std::path::Path) -> AnyEmptyResult {
	std::fs::create_dir_all(root.join("res"))?;
	std::fs::write(root.join("res/a.txt"), "a")?;
	Ok(())
}

#[test]
fn filter_resolves_dot_resfilter_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_resources(tmp.path())?;
	std::fs::write(tmp.path().join(".resfilter.toml"), CONFIG)?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Resolved config: .resfilter.toml"));

	assert!(tmp.path().join("out/a.txt").is_file());

	Ok(())
}

#[test]
fn filter_resolves_dot_config_resfilter_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_resources(tmp.path())?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join(".config/resfilter.toml"), CONFIG)?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Resolved config: .config/resfilter.toml"));

	assert!(tmp.path().join("out/a.txt").is_file());

	Ok(())
}

#[test]
fn filter_prefers_resfilter_toml_over_other_candidates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_resources(tmp.path())?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join("resfilter.toml"), CONFIG)?;
	std::fs::write(tmp.path().join(".resfilter.toml"), "output_directory = \"wrong\"\n")?;
	std::fs::write(tmp.path().join(".config/resfilter.toml"), "output_directory = \"wrong\"\n")?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Resolved config: resfilter.toml"));

	assert!(tmp.path().join("out/a.txt").is_file());
	assert!(!tmp.path().join("wrong").exists());

	Ok(())
}

#[test]
fn filter_without_config_uses_defaults() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let resources = tmp.path().join("src/main/resources");
	std::fs::create_dir_all(&resources)?;
	std::fs::write(resources.join("a.txt"), "${unchanged}")?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Resolved config: none (defaults)"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("target/classes/a.txt"))?,
		"${unchanged}"
	);

	Ok(())
}

#[test]
fn filter_invalid_config_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("resfilter.toml"), "delimiters = [\"*}\"]\n")?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("invalid delimiter"));

	Ok(())
}
