use std::path::Path;
use std::path::PathBuf;

use crate::Interpolator;
use crate::PropertySource;
use crate::TextEncoding;

/// File name of the HTML properties report.
pub const PROPERTIES_HTML_FILE_NAME: &str = "properties.html";
/// File name of the plain-text properties report.
pub const PROPERTIES_TEXT_FILE_NAME: &str = "properties.txt";
/// File name of the filtered filter-file dump.
pub const FILTERED_FILTERS_FILE_NAME: &str = "filtered.txt";

/// Output format of the properties report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
	#[default]
	Html,
	Text,
}

/// A rendered diagnostic report. Building one has no effect on filtering;
/// writing it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
	pub file_name: String,
	pub content: String,
}

impl Report {
	/// Write the report into `dir`, creating it if needed.
	///
	/// Never fails: an I/O error is logged as a warning and `None` is
	/// returned.
	pub fn write_to(&self, dir: &Path) -> Option<PathBuf> {
		let path = dir.join(&self.file_name);
		let written = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, &self.content));

		match written {
			Ok(()) => Some(path),
			Err(error) => {
				tracing::warn!(path = %path.display(), %error, "failed to write report");
				None
			}
		}
	}
}

/// List every effective property, the layer it came from and its value.
pub fn properties_report(properties: &PropertySource, format: ReportFormat) -> Report {
	match format {
		ReportFormat::Html => {
			Report {
				file_name: PROPERTIES_HTML_FILE_NAME.to_string(),
				content: render_properties_html(properties),
			}
		}
		ReportFormat::Text => {
			Report {
				file_name: PROPERTIES_TEXT_FILE_NAME.to_string(),
				content: render_properties_text(properties),
			}
		}
	}
}

fn render_properties_html(properties: &PropertySource) -> String {
	let mut html = String::from(
		"<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Resolved \
		 properties</title>\n</head>\n<body>\n<h1>Resolved properties</h1>\n",
	);
	html.push_str(&format!("<p>{} propert{}</p>\n", properties.len(), plural_y(properties.len())));
	html.push_str("<table>\n<thead>\n<tr><th>Key</th><th>Value</th><th>Source</th></tr>\n</thead>\n<tbody>\n");

	for (key, entry) in properties.iter() {
		html.push_str(&format!(
			"<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
			escape_html(key),
			escape_html(&entry.value),
			escape_html(&entry.origin.to_string()),
		));
	}

	html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
	html
}

fn render_properties_text(properties: &PropertySource) -> String {
	properties
		.iter()
		.map(|(key, entry)| format!("{key} = {} ({})\n", entry.value, entry.origin))
		.collect()
}

fn plural_y(count: usize) -> &'static str {
	if count == 1 { "y" } else { "ies" }
}

fn escape_html(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());
	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			other => escaped.push(other),
		}
	}
	escaped
}

/// Run every filter file through `interpolator` and concatenate the results,
/// each preceded by a `FILE: <path>` line.
///
/// A filter file that cannot be read or decoded is noted inline and logged;
/// it never fails the report.
pub fn filtered_filters_report(
	filter_files: &[PathBuf],
	interpolator: &Interpolator<'_>,
	encoding: TextEncoding,
) -> Report {
	let mut content = String::new();

	for path in filter_files {
		let path_str = path.display().to_string();
		content.push_str(&format!("FILE: {path_str}\n"));

		let text = std::fs::read(path)
			.map_err(|e| e.to_string())
			.and_then(|bytes| encoding.decode(&bytes, &path_str).map_err(|e| e.to_string()));

		match text {
			Ok(text) => {
				content.push_str(&interpolator.interpolate(&text));
				if !content.ends_with('\n') {
					content.push('\n');
				}
			}
			Err(error) => {
				tracing::warn!(path = %path_str, %error, "failed to read filter file for report");
				content.push_str(&format!("(unreadable: {error})\n"));
			}
		}
	}

	Report {
		file_name: FILTERED_FILTERS_FILE_NAME.to_string(),
		content,
	}
}
