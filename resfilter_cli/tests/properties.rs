mod common;

use std::path::Path;

use resfilter_core::AnyEmptyResult;

fn write_project(root: &Path) -> AnyEmptyResult {
	std::fs::create_dir_all(root.join("filters"))?;
	std::fs::write(
		root.join("resfilter.toml"),
		"encoding = \"UTF-8\"\nfilters = [\"filters/app.properties\"]\n\n[properties]\ninline = \
		 \"<configured>\"\n",
	)?;
	std::fs::write(
		root.join("filters/app.properties"),
		"name=Acme\ngreeting=Hello ${name}\n",
	)?;
	Ok(())
}

#[test]
fn properties_writes_html_report() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("properties")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote properties report"))
		.stdout(predicates::str::contains("properties.html"));

	let html = std::fs::read_to_string(tmp.path().join("target/classes/properties.html"))?;
	assert!(html.contains("<h1>Resolved properties</h1>"));
	assert!(html.contains("<tr><td>name</td><td>Acme</td>"));
	assert!(html.contains("<tr><td>inline</td><td>&lt;configured&gt;</td><td>system property</td></tr>"));

	Ok(())
}

#[test]
fn properties_writes_text_report_to_output_dir() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("properties")
		.arg("--format")
		.arg("text")
		.arg("--output")
		.arg("reports")
		.arg("-D")
		.arg("extra=yes")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let text = std::fs::read_to_string(tmp.path().join("reports/properties.txt"))?;
	assert!(text.contains("extra = yes (system property)\n"));
	assert!(text.contains("greeting = Hello ${name} ("));
	assert!(text.contains("app.properties)\n"));

	Ok(())
}

#[test]
fn print_filters_echoes_interpolated_filter_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_project(tmp.path())?;

	common::resfilter_cmd()
		.arg("print-filters")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("FILE: "))
		.stdout(predicates::str::contains("greeting=Hello Acme\n"));

	let dump = std::fs::read_to_string(tmp.path().join("target/classes/filtered.txt"))?;
	assert!(dump.contains("name=Acme\ngreeting=Hello Acme\n"));

	Ok(())
}

#[test]
fn print_filters_without_filters() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("resfilter.toml"), "")?;

	common::resfilter_cmd()
		.arg("print-filters")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No filter files configured."));

	Ok(())
}
