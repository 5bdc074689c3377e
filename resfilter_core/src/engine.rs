use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::FilterConfig;
use crate::PropertySource;
use crate::ResfilterError;
use crate::ResfilterResult;
use crate::ResourceDescriptor;
use crate::expand_resource;

/// What happened to a single resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStatus {
	/// Copied byte for byte: filtering is off or the extension is
	/// non-filtered.
	Copied,
	/// Decoded, interpolated and written back.
	Filtered {
		/// Number of placeholders replaced.
		substitutions: usize,
	},
	/// Left alone because the target is up to date and overwriting is off.
	Skipped,
}

impl fmt::Display for FilterStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Copied => f.write_str("copied"),
			Self::Filtered { .. } => f.write_str("filtered"),
			Self::Skipped => f.write_str("skipped"),
		}
	}
}

/// The outcome of processing one resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
	/// Path of the resource that was read.
	pub source: PathBuf,
	/// Path of the file that was (or would have been) written.
	pub target: PathBuf,
	pub status: FilterStatus,
	/// Placeholder keys with no matching property. These are left in the
	/// output untouched and never count as failures.
	pub unresolved: Vec<String>,
}

/// A resource file that could not be processed.
#[derive(Debug)]
pub struct FileFailure {
	/// The resource (or directory) that failed.
	pub source: PathBuf,
	pub error: ResfilterError,
}

/// A non-fatal condition the caller should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FilterWarning {
	/// Filtering is enabled but no encoding was declared, so UTF-8 was
	/// assumed.
	MissingEncoding,
	/// A configured resource does not exist and was skipped.
	MissingResource { path: PathBuf },
}

impl fmt::Display for FilterWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingEncoding => {
				f.write_str(
					"file encoding has not been set, assuming UTF-8; the build depends on this \
					 assumption",
				)
			}
			Self::MissingResource { path } => {
				write!(f, "skipping non-existent resource `{}`", path.display())
			}
		}
	}
}

/// Result of filtering a batch of resources.
///
/// Per-file failures are collected instead of aborting so one run reports
/// every broken resource.
#[derive(Debug, Default)]
pub struct BatchResult {
	/// Processed files, in processing order.
	pub results: Vec<FilterResult>,
	/// Files that failed, in processing order.
	pub failures: Vec<FileFailure>,
	/// Empty directories created in the output tree.
	pub created_dirs: Vec<PathBuf>,
	pub warnings: Vec<FilterWarning>,
}

impl BatchResult {
	/// Returns true if every file was processed.
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}

	/// Returns true if at least one file failed.
	pub fn has_failures(&self) -> bool {
		!self.failures.is_empty()
	}

	/// Number of results with the given status kind.
	pub fn count(&self, predicate: impl Fn(&FilterStatus) -> bool) -> usize {
		self.results.iter().filter(|result| predicate(&result.status)).count()
	}
}

/// Copy or filter a single resource file into the output directory.
///
/// The target is `config.output_directory` joined with the descriptor's
/// target path (the file name when unset). With `overwrite` off, a target
/// that is not older than its source is skipped. Filtered targets must also
/// be no older than [`FilterConfig::inputs_modified`], so edited filter files
/// or config regenerate them. Filtering is bypassed for
/// descriptors with filtering disabled and for non-filtered extensions, which
/// are copied byte for byte.
pub fn filter_resource(
	descriptor: &ResourceDescriptor,
	properties: &PropertySource,
	config: &FilterConfig,
) -> ResfilterResult<FilterResult> {
	let source = &descriptor.source;
	let path_str = source.display().to_string();
	let source_metadata = std::fs::metadata(source)?;
	if !source_metadata.is_file() {
		return Err(ResfilterError::NotAFile(path_str));
	}

	let relative = descriptor
		.target_relative_path()
		.ok_or_else(|| ResfilterError::NotAFile(path_str.clone()))?;
	let target = config.output_directory.join(relative);

	let copy_verbatim = !descriptor.filtering || config.non_filtered_extensions.matches(source);
	let mut threshold = source_metadata.modified().ok();
	if !copy_verbatim {
		threshold = threshold.max(config.inputs_modified);
	}

	if !config.overwrite && is_up_to_date(threshold, &target) {
		tracing::debug!(source = %path_str, target = %target.display(), "target is up to date");
		return Ok(FilterResult {
			source: source.clone(),
			target,
			status: FilterStatus::Skipped,
			unresolved: Vec::new(),
		});
	}

	if copy_verbatim {
		create_parent_dir(&target)?;
		std::fs::copy(source, &target)?;
		tracing::debug!(source = %path_str, target = %target.display(), "copied resource");
		return Ok(FilterResult {
			source: source.clone(),
			target,
			status: FilterStatus::Copied,
			unresolved: Vec::new(),
		});
	}

	let encoding = config.encoding.unwrap_or_default();
	let bytes = std::fs::read(source)?;
	let text = encoding.decode(&bytes, &path_str)?;
	let interpolated = config.interpolator(properties).interpolate_with_stats(&text);
	let output = encoding.encode(&interpolated.output, &path_str)?;

	create_parent_dir(&target)?;
	std::fs::write(&target, output)?;
	tracing::debug!(
		source = %path_str,
		target = %target.display(),
		substitutions = interpolated.substitutions,
		"filtered resource"
	);

	Ok(FilterResult {
		source: source.clone(),
		target,
		status: FilterStatus::Filtered {
			substitutions: interpolated.substitutions,
		},
		unresolved: interpolated.unresolved,
	})
}

/// Filter every resource in order.
///
/// Creating the output directory and invalid include/exclude patterns are
/// fatal. Anything that goes wrong with an individual file, or with listing a
/// single directory, is recorded in [`BatchResult::failures`] and the batch
/// carries on.
pub fn filter_all(
	resources: &[ResourceDescriptor],
	properties: &PropertySource,
	config: &FilterConfig,
) -> ResfilterResult<BatchResult> {
	std::fs::create_dir_all(&config.output_directory).map_err(|e| {
		ResfilterError::OutputDirectory {
			path: config.output_directory.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	let mut batch = BatchResult::default();

	if config.encoding.is_none() && resources.iter().any(|resource| resource.filtering) {
		let warning = FilterWarning::MissingEncoding;
		tracing::warn!("{warning}");
		batch.warnings.push(warning);
	}

	for descriptor in resources {
		if !descriptor.source.exists() {
			let warning = FilterWarning::MissingResource {
				path: descriptor.source.clone(),
			};
			tracing::warn!("{warning}");
			batch.warnings.push(warning);
			continue;
		}

		let expanded = expand_resource(descriptor)?;

		for (dir, error) in expanded.unreadable_dirs {
			tracing::warn!(source = %dir.display(), %error, "failed to read resource directory");
			batch.failures.push(FileFailure { source: dir, error });
		}

		if config.include_empty_dirs {
			for dir in expanded.empty_dirs {
				let target = config.output_directory.join(dir);
				match std::fs::create_dir_all(&target) {
					Ok(()) => batch.created_dirs.push(target),
					Err(error) => {
						batch.failures.push(FileFailure {
							source: target,
							error: error.into(),
						});
					}
				}
			}
		}

		for file in &expanded.files {
			match filter_resource(file, properties, config) {
				Ok(result) => batch.results.push(result),
				Err(error) => {
					tracing::warn!(source = %file.source.display(), %error, "failed to filter resource");
					batch.failures.push(FileFailure {
						source: file.source.clone(),
						error,
					});
				}
			}
		}
	}

	Ok(batch)
}

fn create_parent_dir(target: &Path) -> ResfilterResult<()> {
	if let Some(parent) = target.parent() {
		std::fs::create_dir_all(parent)?;
	}
	Ok(())
}

/// A target is up to date when it exists and was modified no earlier than
/// `threshold`.
fn is_up_to_date(threshold: Option<SystemTime>, target: &Path) -> bool {
	let Some(threshold) = threshold else {
		return false;
	};
	std::fs::metadata(target)
		.and_then(|metadata| metadata.modified())
		.is_ok_and(|target_modified| target_modified >= threshold)
}
