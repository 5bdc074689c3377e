use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;

use crate::ResfilterError;
use crate::ResfilterResult;

/// Extensions that are always copied verbatim, even when filtering is on.
pub const DEFAULT_NON_FILTERED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "gif", "bmp", "png", "ico"];

/// Patterns excluded from every directory resource: version control metadata
/// and editor leftovers.
pub const DEFAULT_EXCLUDES: [&str; 14] = [
	"**/.git",
	"**/.git/**",
	"**/.svn",
	"**/.svn/**",
	"**/.hg",
	"**/.hg/**",
	"**/CVS",
	"**/CVS/**",
	"**/.DS_Store",
	"**/*~",
	"**/#*#",
	"**/.#*",
	"**/%*%",
	"**/._*",
];

/// One file or directory tree to copy into the output directory.
///
/// For a file, `target_path` is the file's path relative to the output
/// directory and defaults to the file name. For a directory, `target_path` is
/// the directory prefix every matched file is placed under, and the files
/// keep their paths relative to `source`.
///
/// ```toml
/// [[resources]]
/// directory = "src/main/resources"
/// filtering = true
/// target_path = "META-INF"
/// includes = ["**/*.properties"]
/// excludes = ["**/local.*"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceDescriptor {
	#[serde(alias = "directory")]
	pub source: PathBuf,
	#[serde(default)]
	pub filtering: bool,
	#[serde(default)]
	pub target_path: Option<PathBuf>,
	/// Glob patterns, relative to a directory source, selecting files.
	/// Everything is included when empty.
	#[serde(default)]
	pub includes: Vec<String>,
	/// Glob patterns, relative to a directory source, removing files.
	#[serde(default)]
	pub excludes: Vec<String>,
}

impl ResourceDescriptor {
	pub fn new(source: impl Into<PathBuf>) -> Self {
		Self {
			source: source.into(),
			filtering: false,
			target_path: None,
			includes: Vec::new(),
			excludes: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_filtering(mut self, filtering: bool) -> Self {
		self.filtering = filtering;
		self
	}

	#[must_use]
	pub fn with_target_path(mut self, target_path: impl Into<PathBuf>) -> Self {
		self.target_path = Some(target_path.into());
		self
	}

	#[must_use]
	pub fn with_includes<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
		self.includes = patterns.into_iter().map(Into::into).collect();
		self
	}

	#[must_use]
	pub fn with_excludes<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
		self.excludes = patterns.into_iter().map(Into::into).collect();
		self
	}

	/// Resolve a relative `source` against `root`.
	#[must_use]
	pub fn resolved(&self, root: &Path) -> Self {
		let mut resolved = self.clone();
		if self.source.is_relative() {
			resolved.source = root.join(&self.source);
		}
		resolved
	}

	/// The path of the output file relative to the output directory, for a
	/// file descriptor.
	pub fn target_relative_path(&self) -> Option<PathBuf> {
		self.target_path
			.clone()
			.or_else(|| self.source.file_name().map(PathBuf::from))
	}
}

/// The set of extensions copied without filtering. Comparison ignores case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonFilteredExtensions(BTreeSet<String>);

impl NonFilteredExtensions {
	/// The defaults merged with `extra`. A leading `.` is ignored.
	pub fn with_defaults<S: AsRef<str>>(extra: &[S]) -> Self {
		let mut set: BTreeSet<String> = DEFAULT_NON_FILTERED_EXTENSIONS
			.iter()
			.map(|ext| (*ext).to_string())
			.collect();
		for ext in extra {
			let ext = ext.as_ref().trim().trim_start_matches('.');
			if !ext.is_empty() {
				set.insert(ext.to_ascii_lowercase());
			}
		}
		Self(set)
	}

	/// Whether `path` has one of the extensions.
	pub fn matches(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| self.0.contains(&ext.to_ascii_lowercase()))
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl Default for NonFilteredExtensions {
	fn default() -> Self {
		Self::with_defaults::<&str>(&[])
	}
}

/// The files (and, optionally, empty directories) a descriptor expands to.
#[derive(Debug, Default)]
pub struct ExpandedResource {
	/// One file descriptor per matched file, sorted by target path.
	pub files: Vec<ResourceDescriptor>,
	/// Target-relative paths of source directories that are empty once the
	/// excludes are applied.
	pub empty_dirs: Vec<PathBuf>,
	/// Source directories that could not be listed. Their contents are
	/// missing from `files`; the rest of the tree is still walked.
	pub unreadable_dirs: Vec<(PathBuf, ResfilterError)>,
}

/// Expand a descriptor into per-file descriptors.
///
/// A file source yields itself. A directory source is walked recursively;
/// each file whose relative path matches the includes and none of the
/// excludes (including [`DEFAULT_EXCLUDES`]) becomes a file descriptor that
/// inherits the filtering flag. Invalid patterns are configuration errors.
pub fn expand_resource(descriptor: &ResourceDescriptor) -> ResfilterResult<ExpandedResource> {
	let matcher = ResourceMatcher::new(&descriptor.includes, &descriptor.excludes)?;

	if descriptor.source.is_file() {
		return Ok(ExpandedResource {
			files: vec![descriptor.clone()],
			..ExpandedResource::default()
		});
	}

	let mut expanded = ExpandedResource::default();
	let mut visited_dirs = HashSet::new();
	walk_dir(
		&descriptor.source,
		&descriptor.source,
		&matcher,
		&mut expanded,
		&mut visited_dirs,
	);

	let prefix = descriptor.target_path.clone().unwrap_or_default();
	let mut files: Vec<ResourceDescriptor> = expanded
		.files
		.into_iter()
		.map(|file| {
			let relative = file
				.source
				.strip_prefix(&descriptor.source)
				.map(Path::to_path_buf)
				.unwrap_or_default();
			ResourceDescriptor {
				source: file.source,
				filtering: descriptor.filtering,
				target_path: Some(prefix.join(relative)),
				includes: Vec::new(),
				excludes: Vec::new(),
			}
		})
		.collect();
	files.sort_by(|a, b| a.target_path.cmp(&b.target_path));

	let mut empty_dirs: Vec<PathBuf> = expanded
		.empty_dirs
		.into_iter()
		.map(|dir| prefix.join(dir))
		.collect();
	empty_dirs.sort();

	Ok(ExpandedResource {
		files,
		empty_dirs,
		unreadable_dirs: expanded.unreadable_dirs,
	})
}

struct ResourceMatcher {
	includes: GlobSet,
	excludes: GlobSet,
}

impl ResourceMatcher {
	fn new(includes: &[String], excludes: &[String]) -> ResfilterResult<Self> {
		let includes = if includes.is_empty() {
			GlobSet::empty()
		} else {
			build_glob_set(includes.iter().map(String::as_str))?
		};
		let excludes = build_glob_set(
			DEFAULT_EXCLUDES
				.iter()
				.copied()
				.chain(excludes.iter().map(String::as_str)),
		)?;

		Ok(Self { includes, excludes })
	}

	fn is_included(&self, relative: &Path) -> bool {
		self.includes.is_empty() || self.includes.is_match(relative)
	}

	fn is_excluded(&self, relative: &Path) -> bool {
		self.excludes.is_match(relative)
	}
}

/// Build a `GlobSet` where `*` stays within one path segment and `**` spans
/// directories.
fn build_glob_set<'a>(patterns: impl IntoIterator<Item = &'a str>) -> ResfilterResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let mut normalized = pattern.replace('\\', "/");
		if normalized.ends_with('/') {
			normalized.push_str("**");
		}
		let glob = GlobBuilder::new(&normalized)
			.literal_separator(true)
			.build()
			.map_err(|e| {
				ResfilterError::InvalidPattern {
					pattern: pattern.to_string(),
					reason: e.to_string(),
				}
			})?;
		builder.add(glob);
	}
	builder.build().map_err(|e| {
		ResfilterError::InvalidPattern {
			pattern: "<set>".to_string(),
			reason: e.to_string(),
		}
	})
}

/// Walk `dir`, collecting included files. Directories with no entries that
/// survive the excludes are recorded as empty, and directories that cannot be
/// listed are recorded as unreadable.
fn walk_dir(
	root: &Path,
	dir: &Path,
	matcher: &ResourceMatcher,
	expanded: &mut ExpandedResource,
	visited_dirs: &mut HashSet<PathBuf>,
) {
	// Symlinked directories pointing back up the tree are walked once.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return;
	}

	let read_dir = match std::fs::read_dir(dir) {
		Ok(read_dir) => read_dir,
		Err(error) => {
			expanded.unreadable_dirs.push((dir.to_path_buf(), error.into()));
			return;
		}
	};

	let mut entries = Vec::new();
	let mut has_entries = false;
	for entry in read_dir {
		match entry {
			Ok(entry) => entries.push(entry.path()),
			Err(error) => {
				has_entries = true;
				expanded.unreadable_dirs.push((dir.to_path_buf(), error.into()));
			}
		}
	}
	entries.sort();

	for path in entries {
		let Ok(relative) = path.strip_prefix(root) else {
			continue;
		};
		if matcher.is_excluded(relative) {
			continue;
		}
		has_entries = true;

		if path.is_dir() {
			walk_dir(root, &path, matcher, expanded, visited_dirs);
		} else if matcher.is_included(relative) {
			expanded.files.push(ResourceDescriptor::new(path));
		}
	}

	if !has_entries && dir != root {
		if let Ok(relative) = dir.strip_prefix(root) {
			expanded.empty_dirs.push(relative.to_path_buf());
		}
	}
}
