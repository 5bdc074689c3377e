use std::fmt;
use std::str::FromStr;

use crate::ResfilterError;
use crate::ResfilterResult;

/// Delimiter specs used when none are configured, or when the defaults are
/// requested alongside custom ones.
pub const DEFAULT_DELIMITERS: [&str; 2] = ["${*}", "@"];

/// The begin and end tokens marking a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelimiterPair {
	pub begin: String,
	pub end: String,
}

impl DelimiterPair {
	pub fn new(begin: impl Into<String>, end: impl Into<String>) -> ResfilterResult<Self> {
		let begin = begin.into();
		let end = end.into();
		if begin.is_empty() || end.is_empty() {
			return Err(ResfilterError::InvalidDelimiter {
				spec: format!("{begin}*{end}"),
				reason: "begin and end tokens must not be empty".to_string(),
			});
		}
		if begin.contains('\n') || end.contains('\n') {
			return Err(ResfilterError::InvalidDelimiter {
				spec: format!("{begin}*{end}"),
				reason: "tokens must not contain line breaks".to_string(),
			});
		}
		Ok(Self { begin, end })
	}

	/// Parse a delimiter spec.
	///
	/// `"${*}"` splits on the first `*` into begin `${` and end `}`. A spec
	/// without `*` uses the same token on both sides, so `"@"` yields
	/// `@key@`.
	pub fn parse(spec: &str) -> ResfilterResult<Self> {
		match spec.split_once('*') {
			Some((begin, end)) => Self::new(begin, end),
			None => Self::new(spec, spec),
		}
		.map_err(|e| {
			match e {
				ResfilterError::InvalidDelimiter { reason, .. } => {
					ResfilterError::InvalidDelimiter {
						spec: spec.to_string(),
						reason,
					}
				}
				other => other,
			}
		})
	}

	/// The `${` / `}` pair.
	pub fn dollar_brace() -> Self {
		Self {
			begin: "${".to_string(),
			end: "}".to_string(),
		}
	}
}

impl fmt::Display for DelimiterPair {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.begin == self.end {
			f.write_str(&self.begin)
		} else {
			write!(f, "{}*{}", self.begin, self.end)
		}
	}
}

impl FromStr for DelimiterPair {
	type Err = ResfilterError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

/// An insertion-ordered set of delimiter pairs without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterSet {
	pairs: Vec<DelimiterPair>,
}

impl DelimiterSet {
	/// Build the set from configured delimiter specs.
	///
	/// With no specs the defaults are used. With specs, the defaults are only
	/// included (ahead of the custom pairs) when `use_default_delimiters` is
	/// set. The result is never empty.
	pub fn from_specs<S: AsRef<str>>(specs: &[S], use_default_delimiters: bool) -> ResfilterResult<Self> {
		let mut set = Self { pairs: Vec::new() };

		if specs.is_empty() || use_default_delimiters {
			for spec in DEFAULT_DELIMITERS {
				set.insert(DelimiterPair::parse(spec)?);
			}
		}

		for spec in specs {
			set.insert(DelimiterPair::parse(spec.as_ref())?);
		}

		Ok(set)
	}

	/// A set holding exactly the given pairs, in order. Falls back to `${*}`
	/// when `pairs` is empty.
	pub fn from_pairs(pairs: impl IntoIterator<Item = DelimiterPair>) -> Self {
		let mut set = Self { pairs: Vec::new() };
		for pair in pairs {
			set.insert(pair);
		}
		if set.pairs.is_empty() {
			set.pairs.push(DelimiterPair::dollar_brace());
		}
		set
	}

	/// Add `pair` unless an equal pair is already present. Returns whether it
	/// was added.
	pub fn insert(&mut self, pair: DelimiterPair) -> bool {
		if self.pairs.contains(&pair) {
			return false;
		}
		self.pairs.push(pair);
		true
	}

	pub fn iter(&self) -> impl Iterator<Item = &DelimiterPair> {
		self.pairs.iter()
	}

	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	/// Pairs whose begin token starts `text`, in set order.
	pub(crate) fn candidates_at<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a DelimiterPair> {
		self.pairs
			.iter()
			.filter(move |pair| text.starts_with(pair.begin.as_str()))
	}
}

impl Default for DelimiterSet {
	fn default() -> Self {
		Self::from_pairs(
			DEFAULT_DELIMITERS
				.iter()
				.filter_map(|spec| DelimiterPair::parse(spec).ok()),
		)
	}
}

impl<'a> IntoIterator for &'a DelimiterSet {
	type IntoIter = std::slice::Iter<'a, DelimiterPair>;
	type Item = &'a DelimiterPair;

	fn into_iter(self) -> Self::IntoIter {
		self.pairs.iter()
	}
}
