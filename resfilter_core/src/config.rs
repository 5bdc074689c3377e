use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::Deserialize;

use crate::DelimiterSet;
use crate::Interpolator;
use crate::NonFilteredExtensions;
use crate::PropertyOrigin;
use crate::PropertySource;
use crate::ResfilterError;
use crate::ResfilterResult;
use crate::ResourceDescriptor;
use crate::SystemPropertyMode;
use crate::TextEncoding;
use crate::combined_filters;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["resfilter.toml", ".resfilter.toml", ".config/resfilter.toml"];

/// Output directory used when the config does not name one.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "target/classes";

/// Resource directory used when the config declares no resources.
pub const DEFAULT_RESOURCE_DIRECTORY: &str = "src/main/resources";

/// Options controlling a single filtering run.
///
/// `delimiters` is already the effective set: build it with
/// [`FilterConfig::with_delimiter_specs`] to apply the default-delimiter
/// rules.
#[derive(Debug, Clone)]
pub struct FilterConfig {
	/// Directory every resource is written under.
	pub output_directory: PathBuf,
	/// Text encoding for reading and writing filtered resources. `None` means
	/// UTF-8 and raises a warning from [`filter_all`](crate::filter_all).
	pub encoding: Option<TextEncoding>,
	/// When false, targets that are not older than their source are left
	/// alone.
	pub overwrite: bool,
	/// Recreate empty source directories in the output tree.
	pub include_empty_dirs: bool,
	/// Extensions that are always copied verbatim.
	pub non_filtered_extensions: NonFilteredExtensions,
	/// Delimiter pairs recognised in filtered resources.
	pub delimiters: DelimiterSet,
	/// Token that, placed before a begin token, keeps it literal.
	pub escape_string: Option<String>,
	/// Double backslashes in values that look like Windows paths.
	pub escape_windows_paths: bool,
	/// Newest modification time of the inputs behind filtered content (filter
	/// files and the config file). Filtered targets older than this are
	/// regenerated even when their source has not changed.
	pub inputs_modified: Option<SystemTime>,
}

impl FilterConfig {
	pub fn new(output_directory: impl Into<PathBuf>) -> Self {
		Self {
			output_directory: output_directory.into(),
			encoding: None,
			overwrite: false,
			include_empty_dirs: false,
			non_filtered_extensions: NonFilteredExtensions::default(),
			delimiters: DelimiterSet::default(),
			escape_string: None,
			escape_windows_paths: true,
			inputs_modified: None,
		}
	}

	/// Replace the delimiters with the set built from `specs`.
	pub fn with_delimiter_specs<S: AsRef<str>>(mut self, specs: &[S], use_default_delimiters: bool) -> ResfilterResult<Self> {
		self.delimiters = DelimiterSet::from_specs(specs, use_default_delimiters)?;
		Ok(self)
	}

	/// An interpolator over `properties` configured with these options.
	pub fn interpolator<'a>(&'a self, properties: &'a PropertySource) -> Interpolator<'a> {
		Interpolator::new(properties, &self.delimiters)
			.with_escape(self.escape_string.as_deref())
			.with_escape_windows_paths(self.escape_windows_paths)
	}
}

/// Configuration loaded from a `resfilter.toml` file.
///
/// ```toml
/// output_directory = "target/classes"
/// encoding = "UTF-8"
/// overwrite = false
/// escape_string = "\\"
/// delimiters = ["${*}", "@"]
/// non_filtered_extensions = ["pdf"]
/// build_filters = ["src/main/filters/common.properties"]
/// filters = ["src/main/filters/dev.properties"]
/// system_properties = "fallback"
///
/// [properties]
/// app.name = "demo"
///
/// [[resources]]
/// directory = "src/main/resources"
/// filtering = true
/// ```
#[derive(Debug, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ResfilterConfig {
	/// Output directory, relative to the project root.
	#[serde(default = "default_output_directory")]
	pub output_directory: PathBuf,
	/// Encoding of filtered resources. Leaving it unset makes the build
	/// depend on the assumed default and is reported as a warning.
	#[serde(default)]
	pub encoding: Option<TextEncoding>,
	/// Encoding of filter files. Defaults to ISO-8859-1.
	#[serde(default)]
	pub filter_encoding: Option<TextEncoding>,
	#[serde(default)]
	pub overwrite: bool,
	#[serde(default)]
	pub include_empty_dirs: bool,
	#[serde(default)]
	pub escape_string: Option<String>,
	#[serde(default = "default_true")]
	pub escape_windows_paths: bool,
	/// Delimiter specs such as `"${*}"` or `"@"`.
	#[serde(default)]
	pub delimiters: Vec<String>,
	/// Keep the default delimiters when custom ones are configured.
	#[serde(default = "default_true")]
	pub use_default_delimiters: bool,
	/// Extensions copied without filtering, on top of the defaults.
	#[serde(default)]
	pub non_filtered_extensions: Vec<String>,
	/// Whether `build_filters` take part in filtering.
	#[serde(default = "default_true")]
	pub use_build_filters: bool,
	/// Filter files shared by every run, loaded first.
	#[serde(default)]
	pub build_filters: Vec<PathBuf>,
	/// Additional filter files, loaded after (and overriding) the build
	/// filters.
	#[serde(default)]
	pub filters: Vec<PathBuf>,
	/// Skip missing filter files instead of failing.
	#[serde(default)]
	pub optional_filters: bool,
	/// Whether system properties override filter files or only fill gaps.
	#[serde(default)]
	pub system_properties: SystemPropertyMode,
	/// Inline system properties. Nested tables become dotted keys.
	#[serde(default)]
	pub properties: BTreeMap<String, toml::Value>,
	#[serde(default = "default_resources")]
	pub resources: Vec<ResourceDescriptor>,
}

fn default_true() -> bool {
	true
}

fn default_output_directory() -> PathBuf {
	PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)
}

fn default_resources() -> Vec<ResourceDescriptor> {
	vec![ResourceDescriptor::new(DEFAULT_RESOURCE_DIRECTORY)]
}

impl Default for ResfilterConfig {
	fn default() -> Self {
		Self {
			output_directory: default_output_directory(),
			encoding: None,
			filter_encoding: None,
			overwrite: false,
			include_empty_dirs: false,
			escape_string: None,
			escape_windows_paths: true,
			delimiters: Vec::new(),
			use_default_delimiters: true,
			non_filtered_extensions: Vec::new(),
			use_build_filters: true,
			build_filters: Vec::new(),
			filters: Vec::new(),
			optional_filters: false,
			system_properties: SystemPropertyMode::default(),
			properties: BTreeMap::new(),
			resources: default_resources(),
		}
	}
}

impl ResfilterConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> ResfilterResult<Option<ResfilterConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	/// Parse config file content.
	pub fn parse(content: &str) -> ResfilterResult<ResfilterConfig> {
		toml::from_str(content).map_err(|e| ResfilterError::ConfigParse(e.to_string()))
	}

	/// The [`FilterConfig`] for a project rooted at `root`.
	pub fn filter_config(&self, root: &Path) -> ResfilterResult<FilterConfig> {
		let mut config = FilterConfig::new(root.join(&self.output_directory))
			.with_delimiter_specs(&self.delimiters, self.use_default_delimiters)?;
		config.encoding = self.encoding;
		config.overwrite = self.overwrite;
		config.include_empty_dirs = self.include_empty_dirs;
		config.non_filtered_extensions = NonFilteredExtensions::with_defaults(&self.non_filtered_extensions);
		config.escape_string = self.escape_string.clone().filter(|token| !token.is_empty());
		config.escape_windows_paths = self.escape_windows_paths;

		Ok(config)
	}

	/// Filter files to load, in layering order, resolved against `root`.
	pub fn filter_paths(&self, root: &Path) -> Vec<PathBuf> {
		combined_filters(&self.build_filters, &self.filters, self.use_build_filters)
			.into_iter()
			.map(|path| root.join(path))
			.collect()
	}

	/// Resource descriptors with their sources resolved against `root`.
	pub fn resources(&self, root: &Path) -> Vec<ResourceDescriptor> {
		self.resources
			.iter()
			.map(|resource| resource.resolved(root))
			.collect()
	}

	/// The inline `[properties]` table as system properties.
	pub fn inline_properties(&self) -> PropertySource {
		let mut source = PropertySource::new();
		for (key, value) in &self.properties {
			flatten_toml_value(key, value, &mut source);
		}
		source
	}
}

fn flatten_toml_value(key: &str, value: &toml::Value, source: &mut PropertySource) {
	match value {
		toml::Value::Table(table) => {
			for (child, value) in table {
				flatten_toml_value(&format!("{key}.{child}"), value, source);
			}
		}
		toml::Value::String(s) => source.insert(key, s.as_str(), PropertyOrigin::SystemProperty),
		toml::Value::Array(items) => {
			let joined = items
				.iter()
				.map(|item| {
					match item {
						toml::Value::String(s) => s.clone(),
						other => other.to_string(),
					}
				})
				.collect::<Vec<_>>()
				.join(",");
			source.insert(key, joined, PropertyOrigin::SystemProperty);
		}
		other => source.insert(key, other.to_string(), PropertyOrigin::SystemProperty),
	}
}
