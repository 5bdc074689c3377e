use miette::Diagnostic;
use thiserror::Error;

/// Coarse classification of a [`ResfilterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Bad or missing configuration: filter files, delimiters, encodings,
	/// patterns.
	Configuration,
	/// Text could not be decoded from or encoded to the declared encoding.
	Encoding,
	/// Reading or writing files failed.
	Io,
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum ResfilterError {
	#[error(transparent)]
	#[diagnostic(code(resfilter::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to create output directory `{path}`: {reason}")]
	#[diagnostic(
		code(resfilter::output_directory),
		help("check that the output directory is writable")
	)]
	OutputDirectory { path: String, reason: String },

	#[error("filter file not found: `{0}`")]
	#[diagnostic(
		code(resfilter::missing_filter_file),
		help("fix the path in `build_filters` / `filters` or set `optional_filters = true`")
	)]
	MissingFilterFile(String),

	#[error("failed to read filter file `{path}`: {reason}")]
	#[diagnostic(code(resfilter::unreadable_filter_file))]
	UnreadableFilterFile { path: String, reason: String },

	#[error("invalid delimiter `{spec}`: {reason}")]
	#[diagnostic(
		code(resfilter::invalid_delimiter),
		help("use `begin*end` (e.g. `${{*}}`) or a single token used on both sides (e.g. `@`)")
	)]
	InvalidDelimiter { spec: String, reason: String },

	#[error("unsupported encoding: `{0}`")]
	#[diagnostic(
		code(resfilter::unsupported_encoding),
		help("supported encodings: UTF-8, ISO-8859-1, US-ASCII")
	)]
	UnsupportedEncoding(String),

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(resfilter::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("resource `{0}` is not a file")]
	#[diagnostic(code(resfilter::not_a_file))]
	NotAFile(String),

	#[error("invalid property definition `{0}`")]
	#[diagnostic(
		code(resfilter::invalid_property),
		help("properties are passed as `key=value`")
	)]
	InvalidProperty(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(resfilter::config_parse),
		help("check that resfilter.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("failed to decode `{path}` as {encoding}: {reason}")]
	#[diagnostic(
		code(resfilter::decode),
		help("set `encoding` to the encoding the resource is written in")
	)]
	Decode {
		path: String,
		encoding: String,
		reason: String,
	},

	#[error("failed to encode filtered `{path}` as {encoding}: {reason}")]
	#[diagnostic(code(resfilter::encode))]
	Encode {
		path: String,
		encoding: String,
		reason: String,
	},
}

impl ResfilterError {
	/// The taxonomy bucket this error belongs to.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) | Self::OutputDirectory { .. } => ErrorKind::Io,
			Self::Decode { .. } | Self::Encode { .. } => ErrorKind::Encoding,
			Self::MissingFilterFile(_)
			| Self::UnreadableFilterFile { .. }
			| Self::InvalidDelimiter { .. }
			| Self::UnsupportedEncoding(_)
			| Self::InvalidPattern { .. }
			| Self::NotAFile(_)
			| Self::InvalidProperty(_)
			| Self::ConfigParse(_) => ErrorKind::Configuration,
		}
	}
}

pub type ResfilterResult<T> = Result<T, ResfilterError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
