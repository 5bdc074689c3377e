mod common;

use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;

use resfilter_core::AnyEmptyResult;
use similar_asserts::assert_eq;

const CONFIG: &str = r#"encoding = "UTF-8"
escape_string = "\\"
build_filters = ["filters/common.properties"]
filters = ["filters/dev.properties"]

[[resources]]
directory = "res"
filtering = true

[[resources]]
directory = "raw"
target_path = "raw"
"#;

fn write_project(root: &Path) -> AnyEmptyResult {
	std::fs::create_dir_all(root.join("filters"))?;
	std::fs::create_dir_all(root.join("res/nested"))?;
	std::fs::create_dir_all(root.join("raw"))?;
	std::fs::write(root.join("resfilter.toml"), CONFIG)?;
	std::fs::write(root.join("filters/common.properties"), "env=common\nname=Acme\n")?;
	std::fs::write(root.join("filters/dev.properties"), "env=dev\n")?;
	std::fs::write(
		root.join("res/app.properties"),
		"name=${name}\nenv=@env@\nliteral=\\${name}\nmissing=${missing}\n",
	)?;
	std::fs::write(root.join("res/nested/logo.png"), b"\x89PNG ${name}")?;
	std::fs::write(root.join("raw/template.txt"), "${name}")?;
	Ok(())
}

#[test]
fn filter_copies_and_substitutes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("1 filtered, 2 copied, 0 up to date"))
		.stderr(predicates::str::contains("unresolved placeholder(s) in res/app.properties: missing"));

	let out = tmp.path().join("target/classes");
	assert_eq!(
		std::fs::read_to_string(out.join("app.properties"))?,
		"name=Acme\nenv=dev\nliteral=${name}\nmissing=${missing}\n"
	);
	assert_eq!(std::fs::read(out.join("nested/logo.png"))?, b"\x89PNG ${name}".to_vec());
	assert_eq!(std::fs::read_to_string(out.join("raw/template.txt"))?, "${name}");

	Ok(())
}

#[test]
fn filter_defines_fill_missing_keys_only() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("-D")
		.arg("env=cli")
		.arg("-D")
		.arg("missing=found")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let content = std::fs::read_to_string(tmp.path().join("target/classes/app.properties"))?;
	assert!(content.contains("env=dev\n"));
	assert!(content.contains("missing=found\n"));

	Ok(())
}

#[test]
fn filter_skips_up_to_date_targets() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::resfilter_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("0 filtered, 0 copied, 3 up to date"));

	common::resfilter_cmd()
		.arg("filter")
		.arg("--overwrite")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("1 filtered, 2 copied, 0 up to date"));

	Ok(())
}

#[test]
fn filter_refilters_after_filter_file_changes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let filter = tmp.path().join("filters/dev.properties");
	std::fs::write(&filter, "env=prod\n")?;
	std::fs::File::options()
		.write(true)
		.open(&filter)?
		.set_modified(SystemTime::now() + Duration::from_secs(60))?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("1 filtered, 0 copied, 2 up to date"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("target/classes/app.properties"))?,
		"name=Acme\nenv=prod\nliteral=${name}\nmissing=${missing}\n"
	);

	Ok(())
}

#[test]
fn filter_output_override() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--output")
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(tmp.path().join("build/app.properties").is_file());
	assert!(!tmp.path().join("target/classes").exists());

	Ok(())
}

#[test]
fn filter_failure_exits_with_one_and_keeps_going() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	std::fs::write(tmp.path().join("res/broken.txt"), b"\xff\xfe ${name}")?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Filtering failed for 1 file(s)"))
		.stderr(predicates::str::contains("res/broken.txt"));

	assert!(tmp.path().join("target/classes/app.properties").is_file());
	assert!(!tmp.path().join("target/classes/broken.txt").exists());

	Ok(())
}

#[test]
fn filter_missing_filter_file_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;
	std::fs::remove_file(tmp.path().join("filters/dev.properties"))?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("filter file not found"));

	assert!(!tmp.path().join("target/classes/app.properties").exists());

	Ok(())
}

#[test]
fn filter_invalid_define_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("filter")
		.arg("-D")
		.arg("no-equals-sign")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("invalid property definition"));

	Ok(())
}

#[test]
fn filter_warns_without_encoding() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("res"))?;
	std::fs::write(
		tmp.path().join("resfilter.toml"),
		"[[resources]]\ndirectory = \"res\"\nfiltering = true\n",
	)?;
	std::fs::write(tmp.path().join("res/a.txt"), "${env.RESFILTER_TEST_VALUE}")?;

	common::resfilter_cmd()
		.env("RESFILTER_TEST_VALUE", "from-env")
		.arg("filter")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("file encoding has not been set"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("target/classes/a.txt"))?,
		"from-env"
	);

	Ok(())
}

#[test]
fn filter_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	let output = common::resfilter_cmd()
		.arg("filter")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], serde_json::Value::Bool(true));
	assert_eq!(json["results"].as_array().map(Vec::len), Some(3));
	assert_eq!(json["failures"].as_array().map(Vec::len), Some(0));

	let app = json["results"]
		.as_array()
		.and_then(|results| results.iter().find(|r| r["source"] == "res/app.properties"))
		.cloned()
		.unwrap_or_default();
	assert_eq!(app["status"], "filtered");
	assert_eq!(app["substitutions"], 2);
	assert_eq!(app["unresolved"], serde_json::json!(["missing"]));

	Ok(())
}
