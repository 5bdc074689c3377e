use std::borrow::Cow;

use crate::DelimiterSet;
use crate::PropertySource;

/// Output of a single interpolation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolated {
	/// The text with every resolvable placeholder replaced.
	pub output: String,
	/// Number of placeholders that were replaced.
	pub substitutions: usize,
	/// Keys of well-formed placeholders with no matching property, in order
	/// of first appearance.
	pub unresolved: Vec<String>,
}

/// Resolves delimited placeholders against a property source.
///
/// ```rust
/// use resfilter_core::DelimiterSet;
/// use resfilter_core::Interpolator;
/// use resfilter_core::PropertyOrigin;
/// use resfilter_core::PropertySource;
///
/// let properties =
/// 	PropertySource::from_pairs([("name", "Acme")], &PropertyOrigin::SystemProperty);
/// let delimiters = DelimiterSet::default();
/// let interpolator = Interpolator::new(&properties, &delimiters).with_escape(Some("\\"));
///
/// assert_eq!(interpolator.interpolate("Hello ${name}!"), "Hello Acme!");
/// assert_eq!(interpolator.interpolate("Hello @name@!"), "Hello Acme!");
/// assert_eq!(interpolator.interpolate("Hello \\${name}!"), "Hello ${name}!");
/// assert_eq!(interpolator.interpolate("Hello ${missing}!"), "Hello ${missing}!");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Interpolator<'a> {
	properties: &'a PropertySource,
	delimiters: &'a DelimiterSet,
	escape: Option<&'a str>,
	escape_windows_paths: bool,
}

impl<'a> Interpolator<'a> {
	pub fn new(properties: &'a PropertySource, delimiters: &'a DelimiterSet) -> Self {
		Self {
			properties,
			delimiters,
			escape: None,
			escape_windows_paths: false,
		}
	}

	/// Set the escape token. An empty token disables escaping.
	#[must_use]
	pub fn with_escape(mut self, escape: Option<&'a str>) -> Self {
		self.escape = escape.filter(|token| !token.is_empty());
		self
	}

	/// Double the backslashes of values that look like Windows absolute paths
	/// (`C:\...`) so they survive being written into escape-aware formats.
	#[must_use]
	pub fn with_escape_windows_paths(mut self, escape_windows_paths: bool) -> Self {
		self.escape_windows_paths = escape_windows_paths;
		self
	}

	/// Replace every resolvable placeholder in `text`.
	pub fn interpolate(&self, text: &str) -> String {
		self.interpolate_with_stats(text).output
	}

	/// Replace every resolvable placeholder in `text` and report what
	/// happened.
	///
	/// The scan is a single left-to-right pass. Replacement values are never
	/// rescanned, so a value containing placeholder syntax is emitted as is.
	pub fn interpolate_with_stats(&self, text: &str) -> Interpolated {
		let mut output = String::with_capacity(text.len());
		let mut substitutions = 0;
		let mut unresolved: Vec<String> = Vec::new();
		let mut pos = 0;

		while pos < text.len() {
			let rest = &text[pos..];

			if let Some(escape) = self.escape {
				if let Some(after) = rest.strip_prefix(escape) {
					if let Some(pair) = self.delimiters.candidates_at(after).next() {
						output.push_str(&pair.begin);
						pos += escape.len() + pair.begin.len();
						continue;
					}
				}
			}

			match self.placeholder_at(rest) {
				Placeholder::Resolved { consumed, value } => {
					output.push_str(&value);
					substitutions += 1;
					pos += consumed;
					continue;
				}
				Placeholder::Unresolved { key } => {
					if !key.is_empty() && !unresolved.iter().any(|seen| seen == key) {
						unresolved.push(key.to_string());
					}
				}
				Placeholder::None => {}
			}

			// An unresolved or unterminated begin token is literal text. Only
			// the begin token is consumed so a later placeholder that starts
			// inside the would-be key is still found.
			if let Some(pair) = self.delimiters.candidates_at(rest).next() {
				output.push_str(&pair.begin);
				pos += pair.begin.len();
				continue;
			}

			let Some(c) = rest.chars().next() else {
				break;
			};
			output.push(c);
			pos += c.len_utf8();
		}

		Interpolated {
			output,
			substitutions,
			unresolved,
		}
	}

	fn placeholder_at<'t>(&self, rest: &'t str) -> Placeholder<'t, 'a> {
		for pair in self.delimiters.candidates_at(rest) {
			let body = &rest[pair.begin.len()..];
			let line = body.split('\n').next().unwrap_or(body);
			let Some(end) = line.find(pair.end.as_str()) else {
				continue;
			};

			let key = &body[..end];
			if key.is_empty() {
				return Placeholder::Unresolved { key };
			}
			let Some(value) = self.properties.value(key) else {
				return Placeholder::Unresolved { key };
			};

			return Placeholder::Resolved {
				consumed: pair.begin.len() + end + pair.end.len(),
				value: self.render_value(value),
			};
		}

		Placeholder::None
	}

	fn render_value(&self, value: &'a str) -> Cow<'a, str> {
		if self.escape_windows_paths && looks_like_windows_path(value) {
			Cow::Owned(value.replace('\\', "\\\\"))
		} else {
			Cow::Borrowed(value)
		}
	}
}

enum Placeholder<'t, 'v> {
	Resolved { consumed: usize, value: Cow<'v, str> },
	Unresolved { key: &'t str },
	None,
}

fn looks_like_windows_path(value: &str) -> bool {
	let bytes = value.as_bytes();
	bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}

/// Resolve placeholders in `text` with the given delimiters and optional
/// escape token.
///
/// Unknown keys and unterminated begin tokens are left untouched. With an
/// empty property source the text is returned unchanged, apart from escape
/// tokens in front of a begin token, which are stripped.
pub fn resolve_placeholders(
	text: &str,
	properties: &PropertySource,
	delimiters: &DelimiterSet,
	escape: Option<&str>,
) -> String {
	Interpolator::new(properties, delimiters)
		.with_escape(escape)
		.interpolate(text)
}
