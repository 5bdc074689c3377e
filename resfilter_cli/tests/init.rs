mod common;

use resfilter_core::AnyEmptyResult;
use resfilter_core::ResfilterConfig;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::resfilter_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created"))
		.stdout(predicates::str::contains("Next steps"));

	let config_content = std::fs::read_to_string(tmp.path().join("resfilter.toml"))?;
	assert!(config_content.contains("[[resources]]"));
	assert!(config_content.contains("encoding = \"UTF-8\""));

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_path = tmp.path().join(".resfilter.toml");
	std::fs::write(&config_path, "# existing config\n")?;

	common::resfilter_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));

	assert_eq!(std::fs::read_to_string(&config_path)?, "# existing config\n");
	assert!(!tmp.path().join("resfilter.toml").exists());

	Ok(())
}

#[test]
fn init_creates_valid_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::resfilter_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let Some(config) = ResfilterConfig::load(tmp.path())? else {
		panic!("init should create a discoverable config");
	};
	let filter_config = config.filter_config(tmp.path())?;
	assert_eq!(filter_config.output_directory, tmp.path().join("target/classes"));
	assert_eq!(config.resources.len(), 1);
	assert!(config.resources[0].filtering);

	Ok(())
}

#[test]
fn init_then_filter() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::resfilter_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let resources = tmp.path().join("src/main/resources");
	std::fs::create_dir_all(&resources)?;
	std::fs::write(resources.join("app.properties"), "name=${name}\n")?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("-D")
		.arg("name=Acme")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let content = std::fs::read_to_string(tmp.path().join("target/classes/app.properties"))?;
	assert_eq!(content, "name=Acme\n");

	Ok(())
}

#[test]
fn no_subcommand_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::resfilter_cmd()
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified"));

	Ok(())
}
