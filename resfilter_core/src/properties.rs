use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use serde::Deserialize;
use serde::Serialize;

use crate::ResfilterError;
use crate::ResfilterResult;
use crate::TextEncoding;

/// Prefix under which environment variables are exposed as properties, e.g.
/// `${env.HOME}`.
pub const ENV_PREFIX: &str = "env.";

const WHITESPACE: [char; 3] = [' ', '\t', '\u{c}'];
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Where an effective property value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
#[non_exhaustive]
pub enum PropertyOrigin {
	/// A filter file on disk.
	File(PathBuf),
	/// A system property supplied by the caller (`-D key=value` or the
	/// `[properties]` table of the config file).
	SystemProperty,
	/// A process environment variable.
	Environment,
}

impl fmt::Display for PropertyOrigin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::File(path) => write!(f, "{}", path.display()),
			Self::SystemProperty => f.write_str("system property"),
			Self::Environment => f.write_str("environment"),
		}
	}
}

/// A single property value together with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEntry {
	pub value: String,
	pub origin: PropertyOrigin,
}

/// Controls how caller-supplied system properties rank against filter files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemPropertyMode {
	/// Filter files win; system properties and then the environment only fill
	/// in keys no filter file defines.
	#[default]
	Fallback,
	/// System properties beat filter files. The environment stays the lowest
	/// priority layer.
	Override,
}

/// An ordered mapping from property key to value.
///
/// Combining sources is right-biased: [`PropertySource::layer`] lets the
/// incoming source win on key collisions, while [`PropertySource::fallback`]
/// only fills in keys that are still missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct PropertySource(BTreeMap<String, PropertyEntry>);

impl PropertySource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a source from key/value pairs that all share `origin`.
	pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>, origin: &PropertyOrigin) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		let mut source = Self::new();
		for (key, value) in pairs {
			source.insert(key, value, origin.clone());
		}
		source
	}

	/// Insert a value, replacing any existing entry for `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>, origin: PropertyOrigin) {
		self.0.insert(
			key.into(),
			PropertyEntry {
				value: value.into(),
				origin,
			},
		);
	}

	/// The effective value for `key`.
	pub fn value(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(|entry| entry.value.as_str())
	}

	/// Layer `other` on top of `self`. Keys in `other` win.
	pub fn layer(&mut self, other: PropertySource) {
		self.0.extend(other.0);
	}

	/// Add entries from `other` only for keys `self` does not define.
	pub fn fallback(&mut self, other: PropertySource) {
		for (key, entry) in other.0 {
			self.0.entry(key).or_insert(entry);
		}
	}

	/// Consume the source into its underlying map.
	pub fn into_inner(self) -> BTreeMap<String, PropertyEntry> {
		self.0
	}
}

/// Parse `.properties` content. Every entry is tagged with `origin`.
///
/// Supports `#`/`!` comment lines, `=`, `:` or whitespace separators, line
/// continuations with a trailing backslash and the usual escapes including
/// `\uXXXX`. A leading byte order mark is ignored. Later duplicate keys win.
pub fn parse_properties(content: &str, origin: &PropertyOrigin) -> PropertySource {
	let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
	let normalized = if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	};

	let mut source = PropertySource::new();
	for line in logical_lines(&normalized) {
		let (key, value) = split_key_value(&line);
		source.insert(unescape(key), unescape(value), origin.clone());
	}
	source
}

fn logical_lines(content: &str) -> Vec<String> {
	let mut lines = Vec::new();
	let mut pending: Option<String> = None;

	for natural in content.split('\n') {
		let trimmed = natural.trim_start_matches(WHITESPACE);
		let mut line = match pending.take() {
			Some(mut continued) => {
				continued.push_str(trimmed);
				continued
			}
			None => {
				if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
					continue;
				}
				trimmed.to_string()
			}
		};

		if has_continuation(&line) {
			line.pop();
			pending = Some(line);
		} else {
			lines.push(line);
		}
	}

	if let Some(line) = pending {
		lines.push(line);
	}

	lines
}

/// A line continues when it ends with an odd number of backslashes.
fn has_continuation(line: &str) -> bool {
	line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
	let mut escaped = false;
	let mut key_end = line.len();
	let mut explicit_separator = false;

	for (index, c) in line.char_indices() {
		if escaped {
			escaped = false;
			continue;
		}
		match c {
			'\\' => escaped = true,
			'=' | ':' => {
				key_end = index;
				explicit_separator = true;
				break;
			}
			' ' | '\t' | '\u{c}' => {
				key_end = index;
				break;
			}
			_ => {}
		}
	}

	let key = &line[..key_end];
	let rest = &line[key_end..];
	let rest = if explicit_separator {
		&rest[1..]
	} else {
		let rest = rest.trim_start_matches(WHITESPACE);
		rest.strip_prefix(['=', ':']).unwrap_or(rest)
	};

	(key, rest.trim_start_matches(WHITESPACE))
}

fn unescape(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut chars = raw.chars();

	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}

		match chars.next() {
			Some('t') => out.push('\t'),
			Some('n') => out.push('\n'),
			Some('r') => out.push('\r'),
			Some('f') => out.push('\u{c}'),
			Some('u') => {
				let Some(code) = read_hex4(chars.as_str()) else {
					out.push_str("\\u");
					continue;
				};
				chars.nth(3);

				if (0xD800..=0xDBFF).contains(&code) {
					let low = chars
						.as_str()
						.strip_prefix("\\u")
						.and_then(read_hex4)
						.filter(|low| (0xDC00..=0xDFFF).contains(low));
					if let Some(low) = low {
						chars.nth(5);
						let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
						out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
						continue;
					}
				}

				out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
			}
			Some(other) => out.push(other),
			None => {}
		}
	}

	out
}

fn read_hex4(s: &str) -> Option<u32> {
	let hex = s.get(..4)?;
	if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
		return None;
	}
	u32::from_str_radix(hex, 16).ok()
}

/// Load filter files in order, later files overriding earlier ones. Files are
/// decoded as ISO-8859-1.
///
/// A missing or unreadable file is an error unless `optional` is set, in
/// which case it is skipped with a warning.
pub fn load_properties<P: AsRef<Path>>(paths: &[P], optional: bool) -> ResfilterResult<PropertySource> {
	load_properties_with_encoding(paths, optional, TextEncoding::Latin1)
}

/// Like [`load_properties`] with an explicit encoding for the filter files.
pub fn load_properties_with_encoding<P: AsRef<Path>>(
	paths: &[P],
	optional: bool,
	encoding: TextEncoding,
) -> ResfilterResult<PropertySource> {
	let mut source = PropertySource::new();

	for path in paths {
		let path = path.as_ref();
		let path_str = path.display().to_string();

		if !path.is_file() {
			if optional {
				tracing::warn!(path = %path_str, "skipping missing optional filter file");
				continue;
			}
			return Err(ResfilterError::MissingFilterFile(path_str));
		}

		let bytes = match std::fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if optional => {
				tracing::warn!(path = %path_str, error = %e, "skipping unreadable optional filter file");
				continue;
			}
			Err(e) => {
				return Err(ResfilterError::UnreadableFilterFile {
					path: path_str,
					reason: e.to_string(),
				});
			}
		};

		let content = encoding.decode(&bytes, &path_str)?;
		let loaded = parse_properties(&content, &PropertyOrigin::File(path.to_path_buf()));
		tracing::debug!(path = %path_str, count = loaded.len(), "loaded filter file");
		source.layer(loaded);
	}

	Ok(source)
}

/// Every process environment variable as an `env.`-prefixed property.
pub fn environment_properties() -> PropertySource {
	PropertySource::from_pairs(
		std::env::vars_os().map(|(key, value)| {
			(
				format!("{ENV_PREFIX}{}", key.to_string_lossy()),
				value.to_string_lossy().into_owned(),
			)
		}),
		&PropertyOrigin::Environment,
	)
}

/// Parse `key=value` definitions, as passed with `-D` on the command line.
pub fn parse_system_properties<S: AsRef<str>>(definitions: &[S]) -> ResfilterResult<PropertySource> {
	let mut source = PropertySource::new();
	for definition in definitions {
		let definition = definition.as_ref();
		let Some((key, value)) = definition.split_once('=') else {
			return Err(ResfilterError::InvalidProperty(definition.to_string()));
		};
		let key = key.trim();
		if key.is_empty() {
			return Err(ResfilterError::InvalidProperty(definition.to_string()));
		}
		source.insert(key, value, PropertyOrigin::SystemProperty);
	}
	Ok(source)
}

/// Combine filter-file properties, system properties and environment
/// properties into the single source used for interpolation.
///
/// The environment is always the lowest priority layer. `mode` decides
/// whether system properties sit above or below the filter files.
pub fn resolve_layers(
	filters: PropertySource,
	system: PropertySource,
	environment: PropertySource,
	mode: SystemPropertyMode,
) -> PropertySource {
	let mut resolved = filters;
	match mode {
		SystemPropertyMode::Fallback => resolved.fallback(system),
		SystemPropertyMode::Override => resolved.layer(system),
	}
	resolved.fallback(environment);
	resolved
}

/// The ordered list of filter files to load.
///
/// Without extra `filters` this is the build filters (when enabled) and
/// nothing otherwise. With extra filters, the build filters (when enabled)
/// come first so the extra filters override them.
pub fn combined_filters(build_filters: &[PathBuf], filters: &[PathBuf], use_build_filters: bool) -> Vec<PathBuf> {
	let mut combined = Vec::with_capacity(build_filters.len() + filters.len());
	if use_build_filters {
		combined.extend(build_filters.iter().cloned());
	}
	combined.extend(filters.iter().cloned());
	combined
}
