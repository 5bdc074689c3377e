use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::BatchResult;
use crate::FilterConfig;
use crate::PropertySource;
use crate::ReportFormat;
use crate::ResfilterConfig;
use crate::ResfilterResult;
use crate::ResourceDescriptor;
use crate::Report;
use crate::TextEncoding;
use crate::environment_properties;
use crate::filter_all;
use crate::filtered_filters_report;
use crate::load_properties_with_encoding;
use crate::properties_report;
use crate::resolve_layers;

/// A project with its configuration resolved and its properties loaded,
/// ready for filtering or reporting.
///
/// This is the main entry point returned by [`load_context`].
#[derive(Debug)]
pub struct FilterContext {
	/// The project root every relative path was resolved against.
	pub root: PathBuf,
	/// The config file that was loaded, if any.
	pub config_path: Option<PathBuf>,
	/// Options for the filtering run.
	pub config: FilterConfig,
	/// Resources to process, in order.
	pub resources: Vec<ResourceDescriptor>,
	/// Filter files in layering order.
	pub filter_files: Vec<PathBuf>,
	/// Encoding used to read filter files.
	pub filter_encoding: TextEncoding,
	/// The fully layered properties: filter files, system properties and
	/// environment.
	pub properties: PropertySource,
}

impl FilterContext {
	/// Filter every resource. See [`filter_all`].
	pub fn filter_all(&self) -> ResfilterResult<BatchResult> {
		filter_all(&self.resources, &self.properties, &self.config)
	}

	/// The resolved-properties report.
	pub fn properties_report(&self, format: ReportFormat) -> Report {
		properties_report(&self.properties, format)
	}

	/// Every filter file run through the configured interpolator.
	pub fn filtered_filters_report(&self) -> Report {
		let interpolator = self.config.interpolator(&self.properties);
		filtered_filters_report(&self.filter_files, &interpolator, self.filter_encoding)
	}
}

/// Load the project at `root`: discover and parse the config file (falling
/// back to defaults), then load and layer the filter files.
///
/// `system` holds caller-supplied system properties; they override the
/// config file's inline `[properties]`. Missing filter files abort unless the
/// config marks filters optional.
pub fn load_context(root: &Path, system: PropertySource) -> ResfilterResult<FilterContext> {
	let config_path = ResfilterConfig::resolve_path(root);
	let file_config = ResfilterConfig::load(root)?.unwrap_or_default();

	let mut config = file_config.filter_config(root)?;
	let resources = file_config.resources(root);
	let filter_files = file_config.filter_paths(root);
	let filter_encoding = file_config.filter_encoding.unwrap_or(TextEncoding::Latin1);

	let filters = load_properties_with_encoding(&filter_files, file_config.optional_filters, filter_encoding)?;
	config.inputs_modified = newest_modified(filter_files.iter().chain(&config_path));
	let mut system_properties = file_config.inline_properties();
	system_properties.layer(system);
	let properties = resolve_layers(
		filters,
		system_properties,
		environment_properties(),
		file_config.system_properties,
	);

	tracing::debug!(
		root = %root.display(),
		resources = resources.len(),
		filters = filter_files.len(),
		properties = properties.len(),
		"loaded filter context"
	);

	Ok(FilterContext {
		root: root.to_path_buf(),
		config_path,
		config,
		resources,
		filter_files,
		filter_encoding,
		properties,
	})
}

/// The latest modification time among `paths`, skipping any that cannot be
/// read.
fn newest_modified<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Option<SystemTime> {
	paths
		.into_iter()
		.filter_map(|path| std::fs::metadata(path).and_then(|metadata| metadata.modified()).ok())
		.max()
}
